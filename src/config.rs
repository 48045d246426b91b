use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_VAR: &str = "LEAGUE_STATS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.yml";

fn default_prefix() -> String {
    String::from(":?")
}

fn default_marker_emoji() -> String {
    String::from("✅")
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_file() -> String {
    String::from("league-stats.log")
}

fn default_mongo_uri() -> String {
    String::from("mongodb://localhost:27017")
}

fn default_stats_database() -> String {
    String::from("stats")
}

fn default_config_database() -> String {
    String::from("config")
}

fn default_max_messages() -> usize {
    20_000
}

fn default_page_size() -> u8 {
    100
}

fn default_fetch_limit() -> i64 {
    500
}

fn default_history_window() -> u8 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    #[serde(default = "default_mongo_uri")]
    pub uri: String,
    #[serde(default = "default_stats_database")]
    pub stats_database: String,
    #[serde(default = "default_config_database")]
    pub config_database: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        MongoConfig {
            uri: default_mongo_uri(),
            stats_database: default_stats_database(),
            config_database: default_config_database(),
        }
    }
}

/// A league slug, optionally pinned to a physical collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueEntry {
    pub key: String,
    #[serde(default)]
    pub collection: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkImportConfig {
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    #[serde(default = "default_page_size")]
    pub page_size: u8,
}

impl Default for BulkImportConfig {
    fn default() -> Self {
        BulkImportConfig { max_messages: default_max_messages(), page_size: default_page_size() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: i64,
    #[serde(default = "default_history_window")]
    pub history_window: u8,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        LeaderboardConfig { fetch_limit: default_fetch_limit(), history_window: default_history_window() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub token: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub allowed_guilds: Vec<u64>,
    #[serde(default)]
    pub operators: Vec<u64>,
    #[serde(default = "default_marker_emoji")]
    pub marker_emoji: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default)]
    pub mongo: MongoConfig,
    // order matters, the first key found in a channel name wins
    #[serde(default)]
    pub leagues: Vec<LeagueEntry>,
    #[serde(default)]
    pub bulk_import: BulkImportConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

impl BotConfig {
    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let config: BotConfig = serde_yaml::from_str(raw)?;
        if config.token.trim().is_empty() {
            anyhow::bail!("bot token is empty");
        }
        if config.bulk_import.page_size == 0 {
            anyhow::bail!("bulk_import.page_size must be positive");
        }
        Ok(config)
    }

    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("could not read config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub async fn load_from_env() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| String::from(DEFAULT_CONFIG_PATH));
        Self::load(path).await
    }

    pub fn is_guild_allowed(&self, guild_id: u64) -> bool {
        self.allowed_guilds.is_empty() || self.allowed_guilds.contains(&guild_id)
    }

    pub fn is_operator(&self, user_id: u64) -> bool {
        self.operators.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = BotConfig::from_yaml("token: abc").unwrap();
        assert_eq!(config.prefix, ":?");
        assert_eq!(config.marker_emoji, "✅");
        assert_eq!(config.bulk_import.max_messages, 20_000);
        assert_eq!(config.bulk_import.page_size, 100);
        assert_eq!(config.leaderboard.fetch_limit, 500);
        assert_eq!(config.leaderboard.history_window, 100);
        assert_eq!(config.mongo.stats_database, "stats");
        assert!(config.is_guild_allowed(123));
        assert!(!config.is_operator(5));
    }

    #[test]
    fn leagues_keep_their_order() {
        let raw = "
token: abc
allowed_guilds: [7]
operators: [5]
leagues:
  - key: la-liga
    collection: LaLiga
  - key: pl
leaderboard:
  fetch_limit: 50
";
        let config = BotConfig::from_yaml(raw).unwrap();
        assert_eq!(config.leagues, vec![
            LeagueEntry { key: String::from("la-liga"), collection: Some(String::from("LaLiga")) },
            LeagueEntry { key: String::from("pl"), collection: None },
        ]);
        assert_eq!(config.leaderboard.fetch_limit, 50);
        assert_eq!(config.leaderboard.history_window, 100);
        assert!(config.is_guild_allowed(7));
        assert!(!config.is_guild_allowed(8));
        assert!(config.is_operator(5));
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(BotConfig::from_yaml("token: ''").is_err());
        assert!(BotConfig::from_yaml("prefix: '!'").is_err());
    }
}
