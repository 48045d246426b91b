use std::cmp::Ordering;

use regex::Regex;
use strum_macros::{Display, EnumIter, EnumString};

use crate::database::models::player_stat::PlayerStatRecord;

pub mod aggregator;

pub const TOP_N: usize = 10;

#[derive(EnumIter, EnumString, Display, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum StatType {
    Goals,
    Assists,
}

impl StatType {
    /// Document field holding this stat.
    pub fn field_name(&self) -> &'static str {
        match self {
            StatType::Goals => "goals",
            StatType::Assists => "assists",
        }
    }

    pub fn tie_breaker(&self) -> StatType {
        match self {
            StatType::Goals => StatType::Assists,
            StatType::Assists => StatType::Goals,
        }
    }

    pub fn section_label(&self) -> &'static str {
        match self {
            StatType::Goals => "Scorers",
            StatType::Assists => "Assisters",
        }
    }

    pub fn noun(&self, count: i64) -> &'static str {
        match (self, count == 1) {
            (StatType::Goals, true) => "goal",
            (StatType::Goals, false) => "goals",
            (StatType::Assists, true) => "assist",
            (StatType::Assists, false) => "assists",
        }
    }

    pub fn value(&self, record: &PlayerStatRecord) -> i64 {
        match self {
            StatType::Goals => record.goals,
            StatType::Assists => record.assists,
        }
    }

    /// Higher primary stat first, then higher tie-breaker stat, then lower user id.
    pub fn ranking_cmp(&self, a: &PlayerStatRecord, b: &PlayerStatRecord) -> Ordering {
        let secondary = self.tie_breaker();
        self.value(b).cmp(&self.value(a))
            .then_with(|| secondary.value(b).cmp(&secondary.value(a)))
            .then_with(|| a.user_id.cmp(&b.user_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardLine {
    pub user_id: String,
    pub count: i64,
}

/// One ranked top-N listing for a league and stat type.
#[derive(Debug, Clone)]
pub struct LeaderboardSection {
    pub league: String,
    pub stat: StatType,
    pub entries: Vec<LeaderboardLine>,
    pub existing_posting: Option<u64>,
}

impl LeaderboardSection {
    pub fn render(&self, pretty_league: &str) -> String {
        format_section(pretty_league, self.stat, &self.entries)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn section_header(pretty_league: &str, stat: StatType) -> String {
    format!("# Top {} {} {}!", TOP_N, pretty_league, stat.section_label())
}

pub fn format_section(pretty_league: &str, stat: StatType, entries: &[LeaderboardLine]) -> String {
    let header = section_header(pretty_league, stat);
    if entries.is_empty() {
        return format!("{}\n\nNo {} yet.", header, stat);
    }
    let lines = entries.iter().enumerate().map(|(rank, entry)| {
        let mention = format!("<@{}>", entry.user_id);
        let noun = stat.noun(entry.count);
        match rank {
            0 => format!("🥇 {} — {} {}", mention, entry.count, capitalize(noun)),
            1 => format!("🥈 {} — {} {}", mention, entry.count, noun),
            2 => format!("🥉 {} — {} {}", mention, entry.count, noun),
            _ => format!("{} --- {} {}", mention, entry.count, noun),
        }
    }).collect::<Vec<_>>();
    format!("{}\n\n{}", header, lines.join("\n"))
}

/// Tolerant matcher for a posted section header. Case, whitespace and
/// punctuation inside the league name are ignored.
pub struct HeaderMatcher {
    pattern: Regex,
}

impl HeaderMatcher {
    pub fn new(pretty_league: &str, stat: StatType) -> Result<Self, regex::Error> {
        let league = pretty_league
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"[\s\p{P}]*");
        // the label must follow the league name directly, so `PL` never claims `PL Cup`
        let pattern = Regex::new(&format!(
            r"(?i)top\s*{}\s*{}[\s\p{{P}}]*{}",
            TOP_N, league, stat.section_label()
        ))?;
        Ok(HeaderMatcher { pattern })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}
