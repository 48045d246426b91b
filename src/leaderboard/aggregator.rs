use std::collections::{HashMap, HashSet};

use strum::IntoEnumIterator;

use crate::config::LeaderboardConfig;
use crate::context::{Lookup, PostedMessage, StatsContext};
use crate::database::models::league_config::LeagueConfig;
use crate::error::{StatsError, StatsResult};
use crate::leaderboard::{HeaderMatcher, LeaderboardLine, LeaderboardSection, StatType, TOP_N};
use crate::stats::league::{normalize_league_slug, pretty_league_name, resolve_collection};
use crate::util::validation::verbose_result_ok;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
    Updated,
    Created,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub updated: Vec<String>,
    pub created: Vec<String>,
    pub skipped: Vec<String>,
    pub errors: Vec<String>,
}

impl RefreshSummary {
    pub fn describe(&self) -> String {
        let mut text = format!(
            "Leaderboards refreshed: {} updated, {} created, {} skipped, {} error(s).",
            self.updated.len(), self.created.len(), self.skipped.len(), self.errors.len()
        );
        for line in self.skipped.iter() {
            text.push_str(&format!("\nSkipped {}", line));
        }
        for line in self.errors.iter() {
            text.push_str(&format!("\nError: {}", line));
        }
        text
    }
}

/// Guild membership answers for the duration of one refresh.
struct MemberCache<'a> {
    ctx: &'a StatsContext,
    guild_id: u64,
    known: HashMap<String, bool>,
}

impl<'a> MemberCache<'a> {
    fn new(ctx: &'a StatsContext, guild_id: u64) -> Self {
        MemberCache { ctx, guild_id, known: HashMap::new() }
    }

    async fn is_member(&mut self, user_id: &str) -> bool {
        if let Some(known) = self.known.get(user_id) {
            return *known;
        }
        let present = match self.ctx.members.member_roles(self.guild_id, user_id).await {
            Lookup::Found(_) => true,
            Lookup::NotFound => false,
            Lookup::Failed(reason) => {
                // not cached, a later section may get a definite answer
                warn!("Could not check membership of {}, leaving them out: {}", user_id, reason);
                return false;
            }
        };
        self.known.insert(user_id.to_owned(), present);
        present
    }
}

/// Rebuilds and republishes the scorer and assister sections of each league.
pub struct LeaderboardAggregator<'a> {
    ctx: &'a StatsContext,
    fetch_limit: i64,
    history_window: u8,
}

impl<'a> LeaderboardAggregator<'a> {
    pub fn new(ctx: &'a StatsContext, config: &LeaderboardConfig) -> Self {
        LeaderboardAggregator {
            ctx,
            fetch_limit: config.fetch_limit.max(TOP_N as i64),
            history_window: config.history_window,
        }
    }

    pub async fn refresh(&self, guild_id: u64, configs: &[LeagueConfig]) -> RefreshSummary {
        let mut summary = RefreshSummary::default();
        let mut members = MemberCache::new(self.ctx, guild_id);
        let live = verbose_result_ok(
            "Could not list stat collections before refresh",
            self.ctx.store.collection_names().await,
        );

        for config in configs.iter() {
            let league = normalize_league_slug(&config.league);
            if league.is_empty() {
                summary.skipped.push(String::from("(unnamed league): no league name"));
                continue;
            }
            let channel_id = match config.leaderboard_channel_id() {
                Ok(Some(channel_id)) => channel_id,
                Ok(None) => {
                    warn!("Skipping {}, no leaderboard channel configured", league);
                    summary.skipped.push(format!("{}: no leaderboard channel", league));
                    continue;
                }
                Err(e) => {
                    warn!("Skipping {}: {}", league, e);
                    summary.errors.push(format!("{}: {}", league, e));
                    continue;
                }
            };

            let sections = self.refresh_league(
                &league,
                channel_id,
                config.collection_override(),
                live.as_deref(),
                &mut members,
            ).await;
            match sections {
                Ok(sections) => {
                    for (stat, result) in sections {
                        let label = format!("{} {}", league, stat.section_label().to_lowercase());
                        match result {
                            Ok(Publication::Updated) => summary.updated.push(label),
                            Ok(Publication::Created) => summary.created.push(label),
                            Err(e) => {
                                warn!("Could not publish {}: {}", label, e);
                                summary.errors.push(format!("{}: {}", label, e));
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("Leaderboard refresh failed for {}: {}", league, e);
                    summary.errors.push(format!("{}: {}", league, e));
                }
            }
        }

        info!(
            "Leaderboard refresh done: {} updated, {} created, {} skipped, {} error(s)",
            summary.updated.len(), summary.created.len(), summary.skipped.len(), summary.errors.len()
        );
        summary
    }

    async fn refresh_league(
        &self,
        league: &str,
        channel_id: u64,
        collection_override: Option<&str>,
        live: Option<&[String]>,
        members: &mut MemberCache<'_>,
    ) -> StatsResult<Vec<(StatType, StatsResult<Publication>)>> {
        let collection = resolve_collection(league, collection_override, live)?;
        let pretty = pretty_league_name(league);
        let postings = self.ctx.channels.recent_messages(channel_id, self.history_window).await?;
        let self_id = self.ctx.channels.self_id();
        let mut claimed = HashSet::new();

        let mut results = Vec::new();
        for stat in StatType::iter() {
            // a failed query only costs its own section
            let entries = match self.top_entries(&collection, stat, members).await {
                Ok(entries) => entries,
                Err(e) => {
                    results.push((stat, Err(e)));
                    continue;
                }
            };
            let matcher = HeaderMatcher::new(&pretty, stat)
                .map_err(|e| StatsError::external("header pattern", e))?;
            let existing_posting = locate_posting(&postings, self_id, &matcher, &claimed);
            if let Some(id) = existing_posting {
                claimed.insert(id);
            }
            let section = LeaderboardSection { league: league.to_owned(), stat, entries, existing_posting };
            results.push((stat, self.publish(channel_id, &section, &pretty).await));
        }
        Ok(results)
    }

    /// Top entries among current guild members. Departed members are dropped
    /// before truncation so they never push out eligible players.
    async fn top_entries(&self, collection: &str, stat: StatType, members: &mut MemberCache<'_>) -> StatsResult<Vec<LeaderboardLine>> {
        let candidates = self.ctx.store.top_by(collection, stat, self.fetch_limit).await?;
        let mut entries = Vec::with_capacity(TOP_N);
        for record in candidates.iter() {
            if entries.len() >= TOP_N {
                break;
            }
            if !members.is_member(&record.user_id).await {
                debug!("Leaving {} out of {} {}", record.user_id, collection, stat);
                continue;
            }
            entries.push(LeaderboardLine { user_id: record.user_id.clone(), count: stat.value(record) });
        }
        Ok(entries)
    }

    async fn publish(&self, channel_id: u64, section: &LeaderboardSection, pretty: &str) -> StatsResult<Publication> {
        let text = section.render(pretty);
        match section.existing_posting {
            Some(message_id) => {
                self.ctx.channels.edit(channel_id, message_id, &text).await?;
                Ok(Publication::Updated)
            }
            None => {
                self.ctx.channels.send(channel_id, &text).await?;
                Ok(Publication::Created)
            }
        }
    }
}

fn posting_matches(posting: &PostedMessage, matcher: &HeaderMatcher) -> bool {
    matcher.is_match(&posting.content) || posting.embeds.iter().any(|embed| {
        embed.title.as_deref().map(|title| matcher.is_match(title)).unwrap_or(false)
            || embed.description.as_deref().map(|description| matcher.is_match(description)).unwrap_or(false)
    })
}

fn locate_posting(postings: &[PostedMessage], self_id: u64, matcher: &HeaderMatcher, claimed: &HashSet<u64>) -> Option<u64> {
    postings.iter()
        .filter(|posting| posting.author_id == self_id && !claimed.contains(&posting.id))
        .find(|posting| posting_matches(posting, matcher))
        .map(|posting| posting.id)
}
