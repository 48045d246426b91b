use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{ChannelId, CreateMessage, EditMessage, GuildId, Message, MessageId, ReactionType, UserId};
use serenity::http::{Http, HttpError, MessagePagination};
use tokio::sync::RwLock;

use crate::context::{ChannelGateway, EmbedText, GuildMemberLookup, Lookup, MarkerReaction, PostedMessage, ReportMessage};
use crate::error::{InputError, StatsError, StatsResult};

const UNKNOWN_MEMBER: isize = 10007;
const UNKNOWN_USER: isize = 10013;
const REACTION_PAGE: u8 = 100;

fn discord_code(err: &serenity::Error) -> Option<isize> {
    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => Some(response.error.code),
        _ => None,
    }
}

fn channel(id: u64) -> StatsResult<ChannelId> {
    if id == 0 {
        return Err(InputError::InvalidArgument(String::from("channel id 0")).into());
    }
    Ok(ChannelId::new(id))
}

fn message(id: u64) -> StatsResult<MessageId> {
    if id == 0 {
        return Err(InputError::InvalidArgument(String::from("message id 0")).into());
    }
    Ok(MessageId::new(id))
}

fn reaction(emoji: &str) -> StatsResult<ReactionType> {
    ReactionType::try_from(emoji)
        .map_err(|e| InputError::InvalidArgument(format!("bad reaction '{}': {}", emoji, e)).into())
}

/// Chat platform access over Discord's REST API.
pub struct DiscordGateway {
    http: Arc<Http>,
    self_id: u64,
    // channels never move between guilds
    guild_of_channel: RwLock<HashMap<u64, u64>>,
}

impl DiscordGateway {
    pub async fn connect(http: Arc<Http>) -> anyhow::Result<Self> {
        let me = http.get_current_user().await?;
        info!("Authenticated as {} ({})", me.name, me.id);
        Ok(DiscordGateway { http, self_id: me.id.get(), guild_of_channel: RwLock::new(HashMap::new()) })
    }

    async fn guild_of(&self, channel_id: u64) -> StatsResult<u64> {
        if let Some(guild_id) = self.guild_of_channel.read().await.get(&channel_id) {
            return Ok(*guild_id);
        }
        let guild_channel = self.http.get_channel(channel(channel_id)?).await?
            .guild()
            .ok_or_else(|| InputError::InvalidArgument(format!("channel {} is not in a guild", channel_id)))?;
        let guild_id = guild_channel.guild_id.get();
        self.guild_of_channel.write().await.insert(channel_id, guild_id);
        Ok(guild_id)
    }

    fn to_report(message: &Message, guild_id: u64) -> ReportMessage {
        ReportMessage {
            text: message.content.clone(),
            author_id: message.author.id.get(),
            guild_id: message.guild_id.map(|id| id.get()).unwrap_or(guild_id),
            channel_id: message.channel_id.get(),
            message_id: message.id.get(),
            existing_markers: message.reactions.iter()
                .map(|reaction| MarkerReaction {
                    emoji: reaction.reaction_type.to_string(),
                    me: reaction.me,
                    cached_users: Vec::new(),
                })
                .collect(),
        }
    }

    fn to_posting(message: &Message) -> PostedMessage {
        PostedMessage {
            id: message.id.get(),
            author_id: message.author.id.get(),
            content: message.content.clone(),
            embeds: message.embeds.iter()
                .map(|embed| EmbedText { title: embed.title.clone(), description: embed.description.clone() })
                .collect(),
        }
    }

    async fn all_reaction_users(&self, channel_id: u64, message_id: u64, emoji: &str) -> StatsResult<Vec<u64>> {
        let (channel_id, message_id, reaction_type) = (channel(channel_id)?, message(message_id)?, reaction(emoji)?);
        let mut users = Vec::new();
        let mut after: Option<UserId> = None;
        loop {
            let page = channel_id
                .reaction_users(&self.http, message_id, reaction_type.clone(), Some(REACTION_PAGE), after)
                .await?;
            users.extend(page.iter().map(|user| user.id.get()));
            if page.len() < REACTION_PAGE as usize {
                break;
            }
            after = page.last().map(|user| user.id);
        }
        Ok(users)
    }
}

#[async_trait]
impl ChannelGateway for DiscordGateway {
    fn self_id(&self) -> u64 {
        self.self_id
    }

    async fn channel_name(&self, channel_id: u64) -> StatsResult<String> {
        let guild_channel = self.http.get_channel(channel(channel_id)?).await?
            .guild()
            .ok_or_else(|| InputError::InvalidArgument(format!("channel {} is not in a guild", channel_id)))?;
        self.guild_of_channel.write().await.insert(channel_id, guild_channel.guild_id.get());
        Ok(guild_channel.name)
    }

    async fn history_page(&self, channel_id: u64, before: Option<u64>, limit: u8) -> StatsResult<Vec<ReportMessage>> {
        let guild_id = self.guild_of(channel_id).await?;
        let pagination = match before {
            Some(id) => Some(MessagePagination::Before(message(id)?)),
            None => None,
        };
        let messages = self.http.get_messages(channel(channel_id)?, pagination, Some(limit)).await?;
        Ok(messages.iter().map(|message| Self::to_report(message, guild_id)).collect())
    }

    async fn recent_messages(&self, channel_id: u64, limit: u8) -> StatsResult<Vec<PostedMessage>> {
        let messages = self.http.get_messages(channel(channel_id)?, None, Some(limit)).await?;
        Ok(messages.iter().map(Self::to_posting).collect())
    }

    async fn fetch_message(&self, channel_id: u64, message_id: u64) -> StatsResult<ReportMessage> {
        let guild_id = self.guild_of(channel_id).await?;
        let fetched = self.http.get_message(channel(channel_id)?, message(message_id)?).await?;
        Ok(Self::to_report(&fetched, guild_id))
    }

    async fn send(&self, channel_id: u64, content: &str) -> StatsResult<u64> {
        let sent = channel(channel_id)?
            .send_message(&self.http, CreateMessage::new().content(content))
            .await?;
        Ok(sent.id.get())
    }

    async fn edit(&self, channel_id: u64, message_id: u64, content: &str) -> StatsResult<()> {
        channel(channel_id)?
            .edit_message(&self.http, message(message_id)?, EditMessage::new().content(content))
            .await?;
        Ok(())
    }

    async fn react(&self, channel_id: u64, message_id: u64, emoji: &str) -> StatsResult<()> {
        channel(channel_id)?
            .create_reaction(&self.http, message(message_id)?, reaction(emoji)?)
            .await?;
        Ok(())
    }

    async fn reaction_users(&self, channel_id: u64, message_id: u64, emoji: &str) -> Lookup<Vec<u64>> {
        match self.all_reaction_users(channel_id, message_id, emoji).await {
            Ok(users) => Lookup::Found(users),
            Err(e) => Lookup::Failed(e.to_string()),
        }
    }
}

#[async_trait]
impl GuildMemberLookup for DiscordGateway {
    async fn member_roles(&self, guild_id: u64, user_id: &str) -> Lookup<Vec<String>> {
        let user_id = match user_id.parse::<u64>() {
            Ok(id) if id > 0 => UserId::new(id),
            _ => return Lookup::NotFound,
        };
        if guild_id == 0 {
            return Lookup::Failed(String::from("guild id 0"));
        }
        match self.http.get_member(GuildId::new(guild_id), user_id).await {
            Ok(member) => Lookup::Found(member.roles.iter().map(|role| role.get().to_string()).collect()),
            Err(e) => match discord_code(&e) {
                Some(UNKNOWN_MEMBER) | Some(UNKNOWN_USER) => Lookup::NotFound,
                _ => Lookup::Failed(StatsError::from(e).to_string()),
            },
        }
    }
}
