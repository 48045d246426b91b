use mongodb::Collection;
use serde::{Deserialize, Serialize};

use crate::database::{CollectionOwner, Database};
use crate::error::{InputError, StatsResult};
use crate::util::links::parse_channel_link;

pub const TOP_PLAYERS_TYPE: &str = "top-players";

fn top_players_type() -> String {
    String::from(TOP_PLAYERS_TYPE)
}

/// Links a league to its result channel and leaderboard channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueConfig {
    #[serde(rename = "type", default = "top_players_type")]
    pub kind: String,
    #[serde(default)]
    pub league: String,
    #[serde(default)]
    pub result_channel_url: Option<String>,
    // older documents used `url` or `topPlayersUrl`
    #[serde(default, alias = "url", alias = "topPlayersUrl")]
    pub top_players_channel_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
}

impl LeagueConfig {
    pub fn new(league: String, result_channel_url: String, top_players_channel_url: String) -> Self {
        LeagueConfig {
            kind: top_players_type(),
            league,
            result_channel_url: Some(result_channel_url),
            top_players_channel_url: Some(top_players_channel_url),
            collection_name: None,
        }
    }

    pub fn collection_override(&self) -> Option<&str> {
        self.collection_name.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }

    pub fn leaderboard_channel_id(&self) -> StatsResult<Option<u64>> {
        match self.top_players_channel_url.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(url) => {
                let (_, channel_id) = parse_channel_link(url)
                    .ok_or_else(|| InputError::InvalidLink(url.to_owned()))?;
                Ok(Some(channel_id))
            }
        }
    }
}

impl CollectionOwner<LeagueConfig> for LeagueConfig {
    fn get_collection(database: &Database) -> &Collection<LeagueConfig> {
        &database.league_configs
    }

    fn get_collection_name() -> &'static str {
        "channels"
    }
}
