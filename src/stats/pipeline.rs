use crate::context::{ReportMessage, StatsContext};
use crate::database::models::player_stat::{PlayerStatRecord, StatDelta};
use crate::database::models::team::TeamIcons;
use crate::error::{InputError, StatsResult};
use crate::stats::guard::DuplicateGuard;
use crate::stats::league::{normalize_league_slug, resolve_collection, LeagueResolver};
use crate::stats::parser::{parse_report, resolve_deltas};
use crate::util::links::parse_message_link;
use crate::util::validation::verbose_result_ok;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeFailure {
    pub user_id: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub league: String,
    pub collection: String,
    pub saved_count: usize,
    pub deltas: Vec<StatDelta>,
    pub errors: Vec<MergeFailure>,
}

/// Resolves the physical collection for a league, consulting the live listing
/// when the store can provide one.
pub async fn collection_for(ctx: &StatsContext, league: &str, explicit: Option<&str>) -> StatsResult<String> {
    let live = verbose_result_ok(
        format!("Could not list stat collections while resolving {}", league),
        ctx.store.collection_names().await,
    );
    Ok(resolve_collection(league, explicit, live.as_deref())?)
}

/// Records one report message unless it already carries our marker.
pub async fn process_report(
    ctx: &StatsContext,
    message: &ReportMessage,
    league: &str,
    collection_override: Option<&str>,
) -> StatsResult<ProcessOutcome> {
    DuplicateGuard::new(ctx.channels.as_ref(), &ctx.marker_emoji)
        .ensure_fresh(message)
        .await?;
    record_report(ctx, message, league, collection_override).await
}

/// Store lookups a report needs that do not depend on the message itself.
#[derive(Debug, Clone)]
pub struct ReportTarget {
    pub league: String,
    pub collection: String,
    pub icons: TeamIcons,
}

impl ReportTarget {
    pub async fn prepare(ctx: &StatsContext, league: &str, collection_override: Option<&str>) -> StatsResult<Self> {
        let league = normalize_league_slug(league);
        let collection = collection_for(ctx, &league, collection_override).await?;
        let icons = ctx.store.team_icons().await?;
        Ok(ReportTarget { league, collection, icons })
    }
}

/// Parses and merges a report. Callers are expected to have run the duplicate
/// guard already; merging is additive and repeating it double counts.
pub async fn record_report(
    ctx: &StatsContext,
    message: &ReportMessage,
    league: &str,
    collection_override: Option<&str>,
) -> StatsResult<ProcessOutcome> {
    if message.text.trim().is_empty() {
        return Err(InputError::MissingReportText.into());
    }
    let target = ReportTarget::prepare(ctx, league, collection_override).await?;
    record_into(ctx, message, &target).await
}

/// Same as [`record_report`] against an already prepared target.
pub async fn record_into(ctx: &StatsContext, message: &ReportMessage, target: &ReportTarget) -> StatsResult<ProcessOutcome> {
    if message.text.trim().is_empty() {
        return Err(InputError::MissingReportText.into());
    }

    let report = parse_report(&message.text, &target.icons);
    if report.is_empty() {
        return Err(InputError::EmptyStatSet.into());
    }
    let deltas = resolve_deltas(&report, message.guild_id, ctx.members.as_ref()).await?;
    let collection = &target.collection;

    let mut saved_count = 0;
    let mut errors = Vec::new();
    for delta in deltas.iter() {
        match ctx.store.merge(collection, delta).await {
            Ok(record) => {
                saved_count += 1;
                debug!("{} in {} now at {} goal(s), {} assist(s)", record.user_id, collection, record.goals, record.assists);
            }
            Err(e) => {
                warn!("Failed to save stats for {} in {}: {}", delta.user_id, collection, e);
                errors.push(MergeFailure { user_id: delta.user_id.clone(), reason: e.to_string() });
            }
        }
    }

    if saved_count > 0 {
        verbose_result_ok(
            format!("Could not mark message {} as recorded", message.message_id),
            ctx.channels.react(message.channel_id, message.message_id, &ctx.marker_emoji).await,
        );
    }
    info!(
        "Recorded message {} into {}: {} saved, {} failed",
        message.message_id, collection, saved_count, errors.len()
    );

    Ok(ProcessOutcome {
        league: target.league.clone(),
        collection: collection.clone(),
        saved_count,
        deltas,
        errors,
    })
}

/// Links may only point into the guild the command was issued from.
pub fn ensure_same_guild(link_guild: u64, guild_id: u64) -> Result<(), InputError> {
    if link_guild != guild_id {
        return Err(InputError::InvalidArgument(format!(
            "link points to server {}, not this one", link_guild
        )));
    }
    Ok(())
}

/// Fetches a report by its message link and records it under the league its
/// channel name maps to.
pub async fn process_linked_report(
    ctx: &StatsContext,
    resolver: &LeagueResolver,
    link: &str,
    guild_id: u64,
) -> StatsResult<ProcessOutcome> {
    let (link_guild, channel_id, message_id) = parse_message_link(link)
        .ok_or_else(|| InputError::InvalidLink(link.to_owned()))?;
    ensure_same_guild(link_guild, guild_id)?;
    let message = ctx.channels.fetch_message(channel_id, message_id).await?;
    let channel_name = ctx.channels.channel_name(channel_id).await?;
    let league = resolver.resolve(&channel_name)?;
    process_report(ctx, &message, league, resolver.collection_override(league)).await
}

/// Adds goals and assists by hand, leaving clean sheets and team untouched.
pub async fn record_manual(
    ctx: &StatsContext,
    resolver: &LeagueResolver,
    league: &str,
    user_id: &str,
    goals: u32,
    assists: u32,
) -> StatsResult<PlayerStatRecord> {
    if goals == 0 && assists == 0 {
        return Err(InputError::EmptyStatSet.into());
    }
    let league = normalize_league_slug(league);
    if league.is_empty() {
        return Err(InputError::InvalidArgument(String::from("league is required")).into());
    }
    let collection = collection_for(ctx, &league, resolver.collection_override(&league)).await?;
    let record = ctx.store.record_manual(&collection, user_id, goals, assists).await?;
    info!("Manually added {} goal(s), {} assist(s) for {} in {}", goals, assists, user_id, collection);
    Ok(record)
}

impl ProcessOutcome {
    pub fn summary(&self) -> String {
        let mut text = format!("Saved stats for {} player(s) in {}.", self.saved_count, self.collection);
        for failure in self.errors.iter() {
            text.push_str(&format!("\nFailed for <@{}>: {}", failure.user_id, failure.reason));
        }
        text
    }
}
