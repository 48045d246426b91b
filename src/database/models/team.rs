use std::collections::HashMap;
use std::sync::OnceLock;

use mongodb::Collection;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::database::{CollectionOwner, Database};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub role_id: String,
    // either a full `<:Name:id>` token or the `:Name:` shorthand
    pub emoji: String,
}

impl CollectionOwner<Team> for Team {
    fn get_collection(database: &Database) -> &Collection<Team> {
        &database.teams
    }

    fn get_collection_name() -> &'static str {
        "teams"
    }
}

fn emoji_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<?a?:(\w+):(\d+)?>?$").expect("emoji token pattern is static"))
}

/// Maps custom team icons to the role of the team they stand for.
#[derive(Debug, Clone, Default)]
pub struct TeamIcons {
    by_id: HashMap<String, String>,
    by_name: HashMap<String, String>,
}

impl TeamIcons {
    pub fn from_teams(teams: &[Team]) -> Self {
        let mut icons = TeamIcons::default();
        for team in teams {
            icons.register(&team.emoji, &team.role_id);
        }
        icons
    }

    pub fn register(&mut self, emoji: &str, role_id: &str) {
        let captures = match emoji_token_regex().captures(emoji.trim()) {
            Some(captures) => captures,
            None => return,
        };
        if let Some(name) = captures.get(1) {
            self.by_name.insert(name.as_str().to_lowercase(), role_id.to_owned());
        }
        if let Some(id) = captures.get(2) {
            self.by_id.insert(id.as_str().to_owned(), role_id.to_owned());
        }
    }

    pub fn with(mut self, emoji: &str, role_id: &str) -> Self {
        self.register(emoji, role_id);
        self
    }

    /// Team role for an icon; unregistered icons stand for themselves.
    pub fn team_for(&self, icon_name: &str, icon_id: &str) -> String {
        self.by_id.get(icon_id)
            .or_else(|| self.by_name.get(&icon_name.to_lowercase()))
            .cloned()
            .unwrap_or_else(|| icon_id.to_owned())
    }
}
