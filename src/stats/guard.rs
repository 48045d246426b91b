use crate::context::{ChannelGateway, Lookup, ReportMessage};
use crate::error::{StatsError, StatsResult};

/// Decides whether a report already carries our marker reaction.
pub struct DuplicateGuard<'a> {
    channels: &'a dyn ChannelGateway,
    marker_emoji: &'a str,
}

impl<'a> DuplicateGuard<'a> {
    pub fn new(channels: &'a dyn ChannelGateway, marker_emoji: &'a str) -> Self {
        DuplicateGuard { channels, marker_emoji }
    }

    /// Checks the cached "reacted by me" flag, then the cached reaction users,
    /// and only then asks the platform for the full user list.
    pub async fn is_already_recorded(&self, message: &ReportMessage) -> StatsResult<bool> {
        let marker = match message.marker(self.marker_emoji) {
            Some(marker) => marker,
            None => return Ok(false),
        };
        if marker.me {
            return Ok(true);
        }
        let self_id = self.channels.self_id();
        if marker.cached_users.contains(&self_id) {
            return Ok(true);
        }
        match self.channels.reaction_users(message.channel_id, message.message_id, self.marker_emoji).await {
            Lookup::Found(users) => Ok(users.contains(&self_id)),
            Lookup::NotFound => Ok(false),
            Lookup::Failed(reason) => Err(StatsError::ExternalUnavailable(format!(
                "could not fetch {} reactions on message {}: {}",
                self.marker_emoji, message.message_id, reason
            ))),
        }
    }

    pub async fn ensure_fresh(&self, message: &ReportMessage) -> StatsResult<()> {
        if self.is_already_recorded(message).await? {
            return Err(StatsError::AlreadyProcessed { message_id: message.message_id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MarkerReaction;
    use crate::testing::{FakeChannels, BOT_ID};

    fn message_with(marker: Option<MarkerReaction>) -> ReportMessage {
        ReportMessage {
            text: String::from("<@1> ⚽"),
            channel_id: 10,
            message_id: 99,
            existing_markers: marker.into_iter().collect(),
            ..Default::default()
        }
    }

    fn check_mark() -> MarkerReaction {
        MarkerReaction { emoji: String::from("✅"), ..Default::default() }
    }

    #[tokio::test]
    async fn unmarked_message_is_fresh_without_fetching() {
        let channels = FakeChannels::default();
        let guard = DuplicateGuard::new(&channels, "✅");
        assert!(!guard.is_already_recorded(&message_with(None)).await.unwrap());
        assert_eq!(channels.reaction_fetches(), 0);
    }

    #[tokio::test]
    async fn own_flag_short_circuits() {
        let channels = FakeChannels::default();
        let guard = DuplicateGuard::new(&channels, "✅");
        let marker = MarkerReaction { me: true, ..check_mark() };
        assert!(guard.is_already_recorded(&message_with(Some(marker))).await.unwrap());
        assert_eq!(channels.reaction_fetches(), 0);
    }

    #[tokio::test]
    async fn cached_users_short_circuit() {
        let channels = FakeChannels::default();
        let guard = DuplicateGuard::new(&channels, "✅");
        let marker = MarkerReaction { cached_users: vec![5, BOT_ID], ..check_mark() };
        assert!(guard.is_already_recorded(&message_with(Some(marker))).await.unwrap());
        assert_eq!(channels.reaction_fetches(), 0);
    }

    #[tokio::test]
    async fn falls_back_to_fetching_reaction_users() {
        let channels = FakeChannels::default();
        let guard = DuplicateGuard::new(&channels, "✅");
        let message = message_with(Some(check_mark()));

        assert!(!guard.is_already_recorded(&message).await.unwrap());
        channels.react(10, 99, "✅").await.unwrap();
        assert!(guard.is_already_recorded(&message).await.unwrap());
        assert_eq!(channels.reaction_fetches(), 2);
    }

    #[tokio::test]
    async fn someone_elses_marker_is_not_ours() {
        let channels = FakeChannels::default().with_foreign_reaction(10, 99, "✅", 5);
        let guard = DuplicateGuard::new(&channels, "✅");
        let marker = MarkerReaction { cached_users: vec![5], ..check_mark() };
        let message = message_with(Some(marker));
        assert!(!guard.is_already_recorded(&message).await.unwrap());
        assert!(guard.ensure_fresh(&message).await.is_ok());
    }
}
