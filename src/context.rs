use std::sync::Arc;

use async_trait::async_trait;

use crate::database::StatsStore;
use crate::error::StatsResult;

/// Outcome of a best-effort lookup against the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Failed(String),
}

/// A reaction already attached to a report message.
#[derive(Debug, Clone, Default)]
pub struct MarkerReaction {
    pub emoji: String,
    // set when the platform reports that we placed this reaction ourselves
    pub me: bool,
    pub cached_users: Vec<u64>,
}

/// A report message as handed over by the chat platform. Read-only.
#[derive(Debug, Clone, Default)]
pub struct ReportMessage {
    pub text: String,
    pub author_id: u64,
    pub guild_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
    pub existing_markers: Vec<MarkerReaction>,
}

impl ReportMessage {
    pub fn marker(&self, emoji: &str) -> Option<&MarkerReaction> {
        self.existing_markers.iter().find(|reaction| reaction.emoji == emoji)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmbedText {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A message seen while scanning a leaderboard channel.
#[derive(Debug, Clone, Default)]
pub struct PostedMessage {
    pub id: u64,
    pub author_id: u64,
    pub content: String,
    pub embeds: Vec<EmbedText>,
}

#[async_trait]
pub trait ChannelGateway: Send + Sync {
    fn self_id(&self) -> u64;

    async fn channel_name(&self, channel_id: u64) -> StatsResult<String>;

    /// One page of history, newest first, strictly older than `before` when given.
    async fn history_page(&self, channel_id: u64, before: Option<u64>, limit: u8) -> StatsResult<Vec<ReportMessage>>;

    async fn recent_messages(&self, channel_id: u64, limit: u8) -> StatsResult<Vec<PostedMessage>>;

    async fn fetch_message(&self, channel_id: u64, message_id: u64) -> StatsResult<ReportMessage>;

    async fn send(&self, channel_id: u64, content: &str) -> StatsResult<u64>;

    async fn edit(&self, channel_id: u64, message_id: u64, content: &str) -> StatsResult<()>;

    async fn react(&self, channel_id: u64, message_id: u64, emoji: &str) -> StatsResult<()>;

    async fn reaction_users(&self, channel_id: u64, message_id: u64, emoji: &str) -> Lookup<Vec<u64>>;
}

#[async_trait]
pub trait GuildMemberLookup: Send + Sync {
    /// Role ids currently held by the member.
    async fn member_roles(&self, guild_id: u64, user_id: &str) -> Lookup<Vec<String>>;
}

/// Everything the core needs, built once by the entry point.
#[derive(Clone)]
pub struct StatsContext {
    pub store: Arc<dyn StatsStore>,
    pub members: Arc<dyn GuildMemberLookup>,
    pub channels: Arc<dyn ChannelGateway>,
    pub marker_emoji: String,
}

impl StatsContext {
    pub fn new(
        store: Arc<dyn StatsStore>,
        members: Arc<dyn GuildMemberLookup>,
        channels: Arc<dyn ChannelGateway>,
        marker_emoji: impl Into<String>,
    ) -> Self {
        StatsContext { store, members, channels, marker_emoji: marker_emoji.into() }
    }
}
