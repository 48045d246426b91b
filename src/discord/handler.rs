use std::sync::Arc;

use serenity::all::{Context, EventHandler, Message, Ready};
use serenity::async_trait;

use crate::config::BotConfig;
use crate::context::StatsContext;
use crate::database::models::league_config::LeagueConfig;
use crate::database::Database;
use crate::discord::commands::Command;
use crate::error::{InputError, StatsError, StatsResult};
use crate::leaderboard::aggregator::LeaderboardAggregator;
use crate::stats::bulk::BulkImportDriver;
use crate::stats::league::{clean_league_name, LeagueResolver};
use crate::stats::pipeline::{ensure_same_guild, process_linked_report, record_manual};
use crate::util::links::parse_channel_link;
use crate::util::validation::verbose_result_ok;

pub struct CommandHandler {
    config: Arc<BotConfig>,
    database: Arc<Database>,
    stats: StatsContext,
    resolver: LeagueResolver,
}

impl CommandHandler {
    pub fn new(config: Arc<BotConfig>, database: Arc<Database>, stats: StatsContext) -> Self {
        let resolver = LeagueResolver::new(config.leagues.clone());
        CommandHandler { config, database, stats, resolver }
    }

    async fn execute(&self, command: Command, guild_id: u64) -> StatsResult<String> {
        match command {
            Command::RecordStats { link } => {
                let outcome = process_linked_report(&self.stats, &self.resolver, &link, guild_id).await?;
                Ok(outcome.summary())
            }
            Command::BulkRecord { link } => {
                let (link_guild, channel_id) = parse_channel_link(&link)
                    .ok_or_else(|| InputError::InvalidLink(link.clone()))?;
                ensure_same_guild(link_guild, guild_id)?;
                let channel_name = self.stats.channels.channel_name(channel_id).await?;
                let league = self.resolver.resolve(&channel_name)?;
                let summary = BulkImportDriver::from(&self.config.bulk_import)
                    .run(&self.stats, channel_id, league, self.resolver.collection_override(league))
                    .await;
                Ok(summary.describe())
            }
            Command::SingleRecord { user_id, goals, assists, league } => {
                let record = record_manual(&self.stats, &self.resolver, &league, &user_id, goals, assists).await?;
                Ok(format!(
                    "<@{}> now has {} goal(s) and {} assist(s) in {}.",
                    record.user_id, record.goals, record.assists, league
                ))
            }
            Command::SetTopPlayers { result_link, top_players_link } => {
                let (result_guild, result_channel) = parse_channel_link(&result_link)
                    .ok_or_else(|| InputError::InvalidLink(result_link.clone()))?;
                let (top_guild, _) = parse_channel_link(&top_players_link)
                    .ok_or_else(|| InputError::InvalidLink(top_players_link.clone()))?;
                ensure_same_guild(result_guild, guild_id)?;
                ensure_same_guild(top_guild, guild_id)?;
                let channel_name = self.stats.channels.channel_name(result_channel).await?;
                let league = clean_league_name(&channel_name);
                if league.is_empty() {
                    return Err(InputError::InvalidArgument(format!("no league name in '{}'", channel_name)).into());
                }
                let config = LeagueConfig::new(league.clone(), result_link, top_players_link);
                self.database.save_league_config(&config).await?;
                info!("Linked league {} to its top players channel", league);
                Ok(format!("Top players for {} will be posted to the linked channel.", league))
            }
            Command::UpdateTopPlayers => {
                let configs = self.database.get_league_configs().await?;
                let summary = LeaderboardAggregator::new(&self.stats, &self.config.leaderboard)
                    .refresh(guild_id, &configs)
                    .await;
                Ok(summary.describe())
            }
        }
    }
}

fn render_failure(err: &StatsError) -> String {
    match err {
        StatsError::AlreadyProcessed { .. } => String::from("That message has already been recorded."),
        StatsError::Input(e) => format!("Invalid input: {}", e),
        StatsError::Resolution(e) => format!("Could not resolve league: {}", e),
        StatsError::ExternalUnavailable(_) => String::from("A backing service is unavailable, try again later."),
    }
}

#[async_trait]
impl EventHandler for CommandHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Connected to Discord as {} in {} guild(s)", ready.user.name, ready.guilds.len());
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let command = match Command::parse(&self.config.prefix, &msg.content) {
            Some(command) => command,
            None => return,
        };
        let guild_id = match msg.guild_id {
            Some(guild_id) if self.config.is_guild_allowed(guild_id.get()) => guild_id.get(),
            _ => return,
        };

        let reply = if !self.config.is_operator(msg.author.id.get()) {
            String::from("You are not allowed to use this command.")
        } else {
            match command {
                Err(e) => format!("Invalid input: {}", e),
                Ok(command) => match self.execute(command, guild_id).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        if e.is_informational() {
                            info!("{}", e);
                        } else {
                            warn!("Command from {} failed: {}", msg.author.id, e);
                        }
                        render_failure(&e)
                    }
                },
            }
        };
        verbose_result_ok(
            format!("Could not reply in channel {}", msg.channel_id),
            msg.channel_id.say(&ctx.http, reply).await,
        );
    }
}
