use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, FindOptions, ReplaceOptions, ReturnDocument};
use mongodb::{Client, Collection, Cursor};
use serde::de::DeserializeOwned;

use crate::config::MongoConfig;
use crate::database::models::league_config::{LeagueConfig, TOP_PLAYERS_TYPE};
use crate::database::models::player_stat::{PlayerStatRecord, StatDelta};
use crate::database::models::team::{Team, TeamIcons};
use crate::error::{InputError, StatsError, StatsResult};
use crate::leaderboard::StatType;

pub mod models;

pub trait CollectionOwner<T> {
    fn get_collection(database: &Database) -> &Collection<T>;
    fn get_collection_name() -> &'static str;
}

/// Persistent per-league running totals.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Adds `delta` to the record of `(collection, delta.user_id)`, creating it if absent,
    /// and returns the record after the write.
    async fn merge(&self, collection: &str, delta: &StatDelta) -> StatsResult<PlayerStatRecord>;

    /// Adds goals and assists only; clean sheets and team are left alone.
    async fn record_manual(&self, collection: &str, user_id: &str, goals: u32, assists: u32) -> StatsResult<PlayerStatRecord>;

    /// Records with a positive `stat`, ordered by `StatType::ranking_cmp`.
    async fn top_by(&self, collection: &str, stat: StatType, limit: i64) -> StatsResult<Vec<PlayerStatRecord>>;

    async fn collection_names(&self) -> StatsResult<Vec<String>>;

    /// Registered team icons, used to credit clean sheets.
    async fn team_icons(&self) -> StatsResult<TeamIcons>;
}

pub struct Database {
    pub stats: mongodb::Database,
    pub league_configs: Collection<LeagueConfig>,
    pub teams: Collection<Team>,
}

impl Database {
    pub async fn connect(config: &MongoConfig) -> anyhow::Result<Self> {
        let options = ClientOptions::parse(&config.uri).await?;
        let client = Client::with_options(options)?;
        let stats = client.database(&config.stats_database);
        let config_db = client.database(&config.config_database);
        let league_configs = config_db.collection::<LeagueConfig>(LeagueConfig::get_collection_name());
        let teams = config_db.collection::<Team>(Team::get_collection_name());
        info!("Connected to MongoDB (stats: {}, config: {})", config.stats_database, config.config_database);
        Ok(Database { stats, league_configs, teams })
    }

    pub fn stat_collection(&self, name: &str) -> Collection<PlayerStatRecord> {
        self.stats.collection::<PlayerStatRecord>(name)
    }

    pub async fn consume_cursor_into_owning_vec<T: DeserializeOwned + Unpin + Send + Sync>(cursor: Cursor<T>) -> StatsResult<Vec<T>> {
        Ok(cursor.try_collect::<Vec<T>>().await?)
    }

    pub async fn get_league_configs(&self) -> StatsResult<Vec<LeagueConfig>> {
        let cursor = LeagueConfig::get_collection(self)
            .find(doc! { "type": TOP_PLAYERS_TYPE }, None)
            .await?;
        Self::consume_cursor_into_owning_vec(cursor).await
    }

    pub async fn save_league_config(&self, config: &LeagueConfig) -> StatsResult<()> {
        let options = ReplaceOptions::builder().upsert(true).build();
        LeagueConfig::get_collection(self)
            .replace_one(doc! { "type": &config.kind, "league": &config.league }, config, options)
            .await?;
        Ok(())
    }

    fn validate_user_id(user_id: &str) -> StatsResult<()> {
        if user_id.trim().is_empty() {
            return Err(InputError::InvalidArgument(String::from("empty user id")).into());
        }
        Ok(())
    }

    fn upsert_after() -> FindOneAndUpdateOptions {
        FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build()
    }
}

#[async_trait]
impl StatsStore for Database {
    async fn merge(&self, collection: &str, delta: &StatDelta) -> StatsResult<PlayerStatRecord> {
        Self::validate_user_id(&delta.user_id)?;
        let update = doc! {
            "$inc": {
                "goals": delta.goals as i64,
                "assists": delta.assists as i64,
                "cleansheets": delta.cleansheet_increment(),
            },
            "$set": { "teamId": delta.team_tag.clone() },
        };
        self.stat_collection(collection)
            .find_one_and_update(doc! { "userId": &delta.user_id }, update, Self::upsert_after())
            .await?
            .ok_or_else(|| StatsError::ExternalUnavailable(format!("upsert for {} returned no document", delta.user_id)))
    }

    async fn record_manual(&self, collection: &str, user_id: &str, goals: u32, assists: u32) -> StatsResult<PlayerStatRecord> {
        Self::validate_user_id(user_id)?;
        let update = doc! {
            "$inc": { "goals": goals as i64, "assists": assists as i64 },
            "$setOnInsert": { "cleansheets": 0i64, "teamId": mongodb::bson::Bson::Null },
        };
        self.stat_collection(collection)
            .find_one_and_update(doc! { "userId": user_id }, update, Self::upsert_after())
            .await?
            .ok_or_else(|| StatsError::ExternalUnavailable(format!("upsert for {} returned no document", user_id)))
    }

    async fn top_by(&self, collection: &str, stat: StatType, limit: i64) -> StatsResult<Vec<PlayerStatRecord>> {
        let primary = stat.field_name();
        let secondary = stat.tie_breaker().field_name();
        let options = FindOptions::builder()
            .sort(doc! { primary: -1, secondary: -1, "userId": 1 })
            .limit(limit)
            .build();
        let cursor = self.stat_collection(collection)
            .find(doc! { primary: { "$gt": 0 } }, options)
            .await?;
        Self::consume_cursor_into_owning_vec(cursor).await
    }

    async fn collection_names(&self) -> StatsResult<Vec<String>> {
        Ok(self.stats.list_collection_names(None).await?)
    }

    async fn team_icons(&self) -> StatsResult<TeamIcons> {
        let cursor = Team::get_collection(self).find(doc! {}, None).await?;
        let teams = Self::consume_cursor_into_owning_vec(cursor).await?;
        Ok(TeamIcons::from_teams(&teams))
    }
}
