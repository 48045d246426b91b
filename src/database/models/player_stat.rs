use serde::{Deserialize, Serialize};

/// Running totals for one player inside one league collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatRecord {
    pub user_id: String,
    #[serde(default)]
    pub goals: i64,
    #[serde(default)]
    pub assists: i64,
    #[serde(default)]
    pub cleansheets: i64,
    #[serde(rename = "teamId", default)]
    pub team_tag: Option<String>,
}

impl PlayerStatRecord {
    pub fn from_delta(delta: &StatDelta) -> Self {
        PlayerStatRecord {
            user_id: delta.user_id.clone(),
            goals: delta.goals as i64,
            assists: delta.assists as i64,
            cleansheets: delta.cleansheet_increment(),
            team_tag: delta.team_tag.clone(),
        }
    }

    /// Additive for the counters, last write wins for the team.
    pub fn absorb(&mut self, delta: &StatDelta) {
        self.goals += delta.goals as i64;
        self.assists += delta.assists as i64;
        self.cleansheets += delta.cleansheet_increment();
        self.team_tag = delta.team_tag.clone();
    }
}

/// Per-user change extracted from a single report message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatDelta {
    pub user_id: String,
    pub goals: u32,
    pub assists: u32,
    pub cleansheet: bool,
    pub team_tag: Option<String>,
}

impl StatDelta {
    pub fn cleansheet_increment(&self) -> i64 {
        if self.cleansheet { 1 } else { 0 }
    }
}
