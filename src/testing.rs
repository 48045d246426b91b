//! In-memory stand-ins for the store, the channel gateway and the member lookup.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::context::{ChannelGateway, GuildMemberLookup, Lookup, MarkerReaction, PostedMessage, ReportMessage, StatsContext};
use crate::database::models::player_stat::{PlayerStatRecord, StatDelta};
use crate::database::models::team::TeamIcons;
use crate::database::StatsStore;
use crate::error::{StatsError, StatsResult};
use crate::leaderboard::StatType;

pub const BOT_ID: u64 = 900;
pub const GUILD_ID: u64 = 1;

pub fn report(channel_id: u64, message_id: u64, text: &str) -> ReportMessage {
    ReportMessage {
        text: text.to_owned(),
        author_id: 77,
        guild_id: GUILD_ID,
        channel_id,
        message_id,
        existing_markers: Vec::new(),
    }
}

pub fn context(store: &Arc<MemoryStatsStore>, members: &Arc<FakeMembers>, channels: &Arc<FakeChannels>) -> StatsContext {
    StatsContext::new(store.clone(), members.clone(), channels.clone(), "✅")
}

#[derive(Default)]
pub struct MemoryStatsStore {
    records: Mutex<HashMap<String, HashMap<String, PlayerStatRecord>>>,
    extra_collections: Vec<String>,
    failing_users: HashSet<String>,
    failing_stats: HashSet<StatType>,
    icons: TeamIcons,
    unavailable: bool,
    catalog_reads: AtomicUsize,
}

impl MemoryStatsStore {
    pub fn with_collections(mut self, names: &[&str]) -> Self {
        self.extra_collections.extend(names.iter().map(|name| name.to_string()));
        self
    }

    pub fn failing_for(mut self, user_id: &str) -> Self {
        self.failing_users.insert(user_id.to_owned());
        self
    }

    pub fn failing_top_by(mut self, stat: StatType) -> Self {
        self.failing_stats.insert(stat);
        self
    }

    pub fn with_icons(mut self, icons: TeamIcons) -> Self {
        self.icons = icons;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn insert(&self, collection: &str, record: PlayerStatRecord) {
        self.records.lock().unwrap()
            .entry(collection.to_owned())
            .or_default()
            .insert(record.user_id.clone(), record);
    }

    pub fn record(&self, collection: &str, user_id: &str) -> Option<PlayerStatRecord> {
        self.records.lock().unwrap()
            .get(collection)
            .and_then(|records| records.get(user_id))
            .cloned()
    }

    /// Collection listings plus team icon reads served so far.
    pub fn catalog_reads(&self) -> usize {
        self.catalog_reads.load(Ordering::SeqCst)
    }

    fn check(&self, user_id: &str) -> StatsResult<()> {
        if self.unavailable {
            return Err(StatsError::ExternalUnavailable(String::from("store offline")));
        }
        if self.failing_users.contains(user_id) {
            return Err(StatsError::ExternalUnavailable(format!("write rejected for {}", user_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl StatsStore for MemoryStatsStore {
    async fn merge(&self, collection: &str, delta: &StatDelta) -> StatsResult<PlayerStatRecord> {
        self.check(&delta.user_id)?;
        let mut records = self.records.lock().unwrap();
        let league = records.entry(collection.to_owned()).or_default();
        let record = league.entry(delta.user_id.clone())
            .and_modify(|record| record.absorb(delta))
            .or_insert_with(|| PlayerStatRecord::from_delta(delta));
        Ok(record.clone())
    }

    async fn record_manual(&self, collection: &str, user_id: &str, goals: u32, assists: u32) -> StatsResult<PlayerStatRecord> {
        self.check(user_id)?;
        let mut records = self.records.lock().unwrap();
        let record = records.entry(collection.to_owned()).or_default()
            .entry(user_id.to_owned())
            .or_insert_with(|| PlayerStatRecord {
                user_id: user_id.to_owned(),
                goals: 0,
                assists: 0,
                cleansheets: 0,
                team_tag: None,
            });
        record.goals += goals as i64;
        record.assists += assists as i64;
        Ok(record.clone())
    }

    async fn top_by(&self, collection: &str, stat: StatType, limit: i64) -> StatsResult<Vec<PlayerStatRecord>> {
        self.check("")?;
        if self.failing_stats.contains(&stat) {
            return Err(StatsError::ExternalUnavailable(format!("{} cursor died", stat)));
        }
        let records = self.records.lock().unwrap();
        let mut top = records.get(collection)
            .map(|league| league.values().filter(|record| stat.value(record) > 0).cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        top.sort_by(|a, b| stat.ranking_cmp(a, b));
        top.truncate(limit.max(0) as usize);
        Ok(top)
    }

    async fn collection_names(&self) -> StatsResult<Vec<String>> {
        self.catalog_reads.fetch_add(1, Ordering::SeqCst);
        self.check("")?;
        let mut names = self.extra_collections.clone();
        for name in self.records.lock().unwrap().keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        Ok(names)
    }

    async fn team_icons(&self) -> StatsResult<TeamIcons> {
        self.catalog_reads.fetch_add(1, Ordering::SeqCst);
        self.check("")?;
        Ok(self.icons.clone())
    }
}

#[derive(Default)]
pub struct FakeMembers {
    roles: HashMap<String, Vec<String>>,
    failure: Option<String>,
    lookups: AtomicUsize,
}

impl FakeMembers {
    pub fn with_member(mut self, user_id: &str, roles: &[&str]) -> Self {
        self.roles.insert(user_id.to_owned(), roles.iter().map(|role| role.to_string()).collect());
        self
    }

    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_owned());
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GuildMemberLookup for FakeMembers {
    async fn member_roles(&self, _guild_id: u64, user_id: &str) -> Lookup<Vec<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.failure {
            return Lookup::Failed(reason.clone());
        }
        match self.roles.get(user_id) {
            Some(roles) => Lookup::Found(roles.clone()),
            None => Lookup::NotFound,
        }
    }
}

#[derive(Default)]
struct ChannelState {
    names: HashMap<u64, String>,
    history: HashMap<u64, Vec<ReportMessage>>,
    postings: HashMap<u64, Vec<PostedMessage>>,
    reactions: HashMap<(u64, u64, String), Vec<u64>>,
    sent: Vec<(u64, String)>,
    edited: Vec<(u64, u64, String)>,
    history_requests: Vec<(u64, Option<u64>)>,
}

impl ChannelState {
    // reactions placed through the fake show up on every later read
    fn with_markers(&self, message: &ReportMessage) -> ReportMessage {
        let mut message = message.clone();
        for ((channel, id, emoji), users) in self.reactions.iter() {
            if *channel != message.channel_id || *id != message.message_id {
                continue;
            }
            match message.existing_markers.iter_mut().find(|marker| &marker.emoji == emoji) {
                Some(marker) => {
                    marker.me = marker.me || users.contains(&BOT_ID);
                    marker.cached_users = users.clone();
                }
                None => message.existing_markers.push(MarkerReaction {
                    emoji: emoji.clone(),
                    me: users.contains(&BOT_ID),
                    cached_users: users.clone(),
                }),
            }
        }
        message
    }
}

pub struct FakeChannels {
    state: Mutex<ChannelState>,
    failing_channels: HashSet<u64>,
    failing_reactions: bool,
    reaction_fetches: AtomicUsize,
    next_id: AtomicU64,
}

impl Default for FakeChannels {
    fn default() -> Self {
        FakeChannels {
            state: Mutex::new(ChannelState::default()),
            failing_channels: HashSet::new(),
            failing_reactions: false,
            reaction_fetches: AtomicUsize::new(0),
            next_id: AtomicU64::new(10_000),
        }
    }
}

impl FakeChannels {
    pub fn with_channel(self, channel_id: u64, name: &str) -> Self {
        self.state.lock().unwrap().names.insert(channel_id, name.to_owned());
        self
    }

    pub fn with_history(self, channel_id: u64, messages: Vec<ReportMessage>) -> Self {
        self.state.lock().unwrap().history.entry(channel_id).or_default().extend(messages);
        self
    }

    pub fn with_posting(self, channel_id: u64, posting: PostedMessage) -> Self {
        self.state.lock().unwrap().postings.entry(channel_id).or_default().push(posting);
        self
    }

    pub fn with_foreign_reaction(self, channel_id: u64, message_id: u64, emoji: &str, user_id: u64) -> Self {
        self.state.lock().unwrap().reactions
            .entry((channel_id, message_id, emoji.to_owned()))
            .or_default()
            .push(user_id);
        self
    }

    pub fn failing_channel(mut self, channel_id: u64) -> Self {
        self.failing_channels.insert(channel_id);
        self
    }

    pub fn failing_reactions(mut self) -> Self {
        self.failing_reactions = true;
        self
    }

    pub fn reaction_fetches(&self) -> usize {
        self.reaction_fetches.load(Ordering::SeqCst)
    }

    pub fn reactions_on(&self, channel_id: u64, message_id: u64, emoji: &str) -> Vec<u64> {
        self.state.lock().unwrap().reactions
            .get(&(channel_id, message_id, emoji.to_owned()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn sent(&self) -> Vec<(u64, String)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn edited(&self) -> Vec<(u64, u64, String)> {
        self.state.lock().unwrap().edited.clone()
    }

    pub fn history_requests(&self) -> Vec<(u64, Option<u64>)> {
        self.state.lock().unwrap().history_requests.clone()
    }

    fn check(&self, channel_id: u64) -> StatsResult<()> {
        if self.failing_channels.contains(&channel_id) {
            return Err(StatsError::ExternalUnavailable(format!("channel {} unreachable", channel_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelGateway for FakeChannels {
    fn self_id(&self) -> u64 {
        BOT_ID
    }

    async fn channel_name(&self, channel_id: u64) -> StatsResult<String> {
        self.check(channel_id)?;
        self.state.lock().unwrap().names.get(&channel_id).cloned()
            .ok_or_else(|| StatsError::ExternalUnavailable(format!("unknown channel {}", channel_id)))
    }

    async fn history_page(&self, channel_id: u64, before: Option<u64>, limit: u8) -> StatsResult<Vec<ReportMessage>> {
        self.check(channel_id)?;
        let mut state = self.state.lock().unwrap();
        state.history_requests.push((channel_id, before));
        let mut page = state.history.get(&channel_id)
            .map(|messages| messages.iter()
                .filter(|message| before.map(|cursor| message.message_id < cursor).unwrap_or(true))
                .map(|message| state.with_markers(message))
                .collect::<Vec<_>>())
            .unwrap_or_default();
        page.sort_by(|a, b| b.message_id.cmp(&a.message_id));
        page.truncate(limit as usize);
        Ok(page)
    }

    async fn recent_messages(&self, channel_id: u64, limit: u8) -> StatsResult<Vec<PostedMessage>> {
        self.check(channel_id)?;
        let state = self.state.lock().unwrap();
        let mut recent = state.postings.get(&channel_id).cloned().unwrap_or_default();
        recent.sort_by(|a, b| b.id.cmp(&a.id));
        recent.truncate(limit as usize);
        Ok(recent)
    }

    async fn fetch_message(&self, channel_id: u64, message_id: u64) -> StatsResult<ReportMessage> {
        self.check(channel_id)?;
        let state = self.state.lock().unwrap();
        state.history.get(&channel_id)
            .and_then(|messages| messages.iter().find(|message| message.message_id == message_id))
            .map(|message| state.with_markers(message))
            .ok_or_else(|| StatsError::ExternalUnavailable(format!("unknown message {}", message_id)))
    }

    async fn send(&self, channel_id: u64, content: &str) -> StatsResult<u64> {
        self.check(channel_id)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        state.sent.push((channel_id, content.to_owned()));
        state.postings.entry(channel_id).or_default().push(PostedMessage {
            id,
            author_id: BOT_ID,
            content: content.to_owned(),
            embeds: Vec::new(),
        });
        Ok(id)
    }

    async fn edit(&self, channel_id: u64, message_id: u64, content: &str) -> StatsResult<()> {
        self.check(channel_id)?;
        let mut state = self.state.lock().unwrap();
        let posting = state.postings.get_mut(&channel_id)
            .and_then(|postings| postings.iter_mut().find(|posting| posting.id == message_id))
            .ok_or_else(|| StatsError::ExternalUnavailable(format!("unknown posting {}", message_id)))?;
        posting.content = content.to_owned();
        state.edited.push((channel_id, message_id, content.to_owned()));
        Ok(())
    }

    async fn react(&self, channel_id: u64, message_id: u64, emoji: &str) -> StatsResult<()> {
        self.check(channel_id)?;
        let mut state = self.state.lock().unwrap();
        let users = state.reactions.entry((channel_id, message_id, emoji.to_owned())).or_default();
        if !users.contains(&BOT_ID) {
            users.push(BOT_ID);
        }
        Ok(())
    }

    async fn reaction_users(&self, channel_id: u64, message_id: u64, emoji: &str) -> Lookup<Vec<u64>> {
        self.reaction_fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing_reactions {
            return Lookup::Failed(String::from("reaction endpoint unavailable"));
        }
        Lookup::Found(self.reactions_on(channel_id, message_id, emoji))
    }
}
