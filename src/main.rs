#[macro_use]
extern crate log;

use std::sync::Arc;

use anyhow::Context;
use serenity::all::GatewayIntents;
use serenity::http::Http;
use serenity::Client;

use league_stats_rs::config::BotConfig;
use league_stats_rs::context::StatsContext;
use league_stats_rs::database::Database;
use league_stats_rs::discord::gateway::DiscordGateway;
use league_stats_rs::discord::handler::CommandHandler;
use league_stats_rs::logging::setup_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(BotConfig::load_from_env().await?);
    setup_logger(&config.log_level, &config.log_file).context("could not set up logging")?;

    let database = Arc::new(Database::connect(&config.mongo).await.context("could not connect to MongoDB")?);
    let http = Arc::new(Http::new(&config.token));
    let gateway = Arc::new(DiscordGateway::connect(http).await.context("could not authenticate with Discord")?);
    let stats = StatsContext::new(database.clone(), gateway.clone(), gateway, config.marker_emoji.clone());
    info!("Tracking {} league(s)", config.leagues.len());

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
    let mut client = Client::builder(&config.token, intents)
        .event_handler(CommandHandler::new(config.clone(), database, stats))
        .await
        .context("could not build the Discord client")?;
    client.start().await.context("Discord client stopped")?;
    Ok(())
}
