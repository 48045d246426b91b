use std::sync::OnceLock;

use regex::Regex;

use crate::config::LeagueEntry;
use crate::error::ResolutionError;

/// Maps channel names to league keys. Keys are tried in configured order.
#[derive(Debug, Clone, Default)]
pub struct LeagueResolver {
    entries: Vec<LeagueEntry>,
}

impl LeagueResolver {
    pub fn new(entries: Vec<LeagueEntry>) -> Self {
        let entries = entries.into_iter()
            .map(|entry| LeagueEntry { key: entry.key.trim().to_lowercase(), collection: entry.collection })
            .filter(|entry| !entry.key.is_empty())
            .collect();
        LeagueResolver { entries }
    }

    pub fn resolve(&self, channel_name: &str) -> Result<&str, ResolutionError> {
        let lowered = channel_name.to_lowercase();
        self.entries.iter()
            .find(|entry| lowered.contains(&entry.key))
            .map(|entry| entry.key.as_str())
            .ok_or_else(|| ResolutionError::UnknownLeague { channel_name: channel_name.to_owned() })
    }

    pub fn collection_override(&self, league: &str) -> Option<&str> {
        self.entries.iter()
            .find(|entry| entry.key == league)
            .and_then(|entry| entry.collection.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

fn result_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-results?$").expect("suffix pattern is static"))
}

/// Lower-cases a configured slug and drops a trailing `-result(s)`.
pub fn normalize_league_slug(slug: &str) -> String {
    let lowered = slug.trim().to_lowercase();
    result_suffix_regex().replace(&lowered, "").trim_matches('-').to_owned()
}

/// Derives a league slug from a result channel name, e.g. `🏆 la-liga-results` → `la-liga`.
pub fn clean_league_name(channel_name: &str) -> String {
    let kept = channel_name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .collect::<String>();
    let dashed = kept.split_whitespace().collect::<Vec<_>>().join("-");
    normalize_league_slug(&dashed)
}

fn slug_words(slug: &str) -> impl Iterator<Item = &str> {
    slug.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// competition acronyms longer than two letters
const KNOWN_ACRONYMS: [&str; 8] = ["afc", "caf", "dfb", "efl", "knvb", "mls", "spl", "uefa"];

// words of at most two characters read as acronyms: fa, pl, la
fn styled_word(word: &str, short_upper: bool) -> String {
    let acronym = word.chars().count() <= 2 || KNOWN_ACRONYMS.contains(&word.to_lowercase().as_str());
    if short_upper && acronym {
        word.to_uppercase()
    } else {
        capitalize(word)
    }
}

pub fn slug_to_pascal(slug: &str, short_upper: bool) -> String {
    slug_words(slug).map(|word| styled_word(word, short_upper)).collect()
}

/// Display name used in leaderboard headers, e.g. `fa-cup` → `FA Cup`.
pub fn pretty_league_name(slug: &str) -> String {
    slug_words(slug).map(|word| styled_word(word, true)).collect::<Vec<_>>().join(" ")
}

fn squash(name: &str) -> String {
    name.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_lowercase).collect()
}

/// Candidate collection names in priority order, without duplicates.
pub fn collection_candidates(slug: &str, explicit: Option<&str>) -> Vec<String> {
    let generated = [
        explicit.map(str::trim).unwrap_or_default().to_owned(),
        slug_to_pascal(slug, true),
        slug_to_pascal(slug, false),
        squash(slug),
    ];
    let mut candidates: Vec<String> = Vec::with_capacity(generated.len());
    for candidate in generated {
        if !candidate.is_empty() && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Picks the physical collection for a league. With a live listing, an exact
/// case-insensitive candidate wins over a substring match; without one, or when
/// nothing matches, the first candidate is used.
pub fn resolve_collection(slug: &str, explicit: Option<&str>, live: Option<&[String]>) -> Result<String, ResolutionError> {
    let candidates = collection_candidates(slug, explicit);
    let fallback = candidates.first()
        .cloned()
        .ok_or_else(|| ResolutionError::UnresolvableCollection { league: slug.to_owned() })?;

    let live = match live {
        Some(live) if !live.is_empty() => live,
        _ => return Ok(fallback),
    };

    for candidate in candidates.iter() {
        if let Some(existing) = live.iter().find(|name| name.eq_ignore_ascii_case(candidate)) {
            return Ok(existing.clone());
        }
    }

    let squashed = squash(slug);
    if !squashed.is_empty() {
        if let Some(existing) = live.iter().find(|name| squash(name).contains(&squashed)) {
            return Ok(existing.clone());
        }
    }

    Ok(fallback)
}
