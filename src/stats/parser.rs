use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;

use crate::context::{GuildMemberLookup, Lookup};
use crate::database::models::player_stat::StatDelta;
use crate::database::models::team::TeamIcons;
use crate::error::{StatsError, StatsResult};

/// Native emoji plus the server's custom icon for one stat.
pub struct GlyphSet {
    count_regex: Regex,
    multiplier_regexes: [Regex; 4],
}

impl GlyphSet {
    fn new(native: &str, custom_name: &str) -> Self {
        let glyph = format!(r"{}|<a?:{}:\d+>", regex::escape(native), custom_name);
        let count_regex = Regex::new(&glyph).expect("glyph pattern is static");
        // tight forms first, then forms with text between the multiplier and the glyph
        let multiplier_regexes = [
            format!(r"(?i)(\d+)\s*[x×]\s*(?:{})", glyph),
            format!(r"(?i)(?:{})\s*[x×]\s*(\d+)", glyph),
            format!(r"(?i)(\d+)\s*[x×]\s*.*(?:{})", glyph),
            format!(r"(?i)(?:{}).*\s*[x×]\s*(\d+)", glyph),
        ].map(|pattern| Regex::new(&pattern).expect("multiplier pattern is static"));
        GlyphSet { count_regex, multiplier_regexes }
    }

    pub fn goals() -> &'static GlyphSet {
        static GOALS: OnceLock<GlyphSet> = OnceLock::new();
        GOALS.get_or_init(|| GlyphSet::new("⚽", "Goal"))
    }

    pub fn assists() -> &'static GlyphSet {
        static ASSISTS: OnceLock<GlyphSet> = OnceLock::new();
        ASSISTS.get_or_init(|| GlyphSet::new("👟", "Assist"))
    }

    fn glyph_count(&self, line: &str) -> u32 {
        self.count_regex.find_iter(line).count() as u32
    }

    fn multiplier(&self, line: &str) -> Option<u32> {
        self.multiplier_regexes.iter().find_map(|regex| {
            regex.captures(line)
                .and_then(|captures| captures.get(1))
                .and_then(|digits| digits.as_str().parse::<u32>().ok())
        })
    }

    /// Repeated glyphs win; a lone glyph defers to an explicit multiplier.
    pub fn count_line(&self, line: &str) -> u32 {
        let emoji_count = self.glyph_count(line);
        if emoji_count > 1 {
            return emoji_count;
        }
        match self.multiplier(line) {
            Some(multiplier) if multiplier > 0 => multiplier,
            _ => emoji_count,
        }
    }
}

fn user_mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<@!?(\d+)>").expect("mention pattern is static"))
}

fn role_mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<@&(\d+)>").expect("role pattern is static"))
}

fn clean_sheet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<a?:(\w+):(\d+)>[ \t]*✅").expect("clean sheet pattern is static"))
}

/// Typed counts pulled out of one report message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReport {
    pub goals_by_user: HashMap<String, u32>,
    pub assists_by_user: HashMap<String, u32>,
    pub cleansheet_team_tags: BTreeSet<String>,
    // role mentions in order of first appearance
    pub team_tags_in_text: Vec<String>,
    // users with any goal or assist, in order of first contribution
    pub users: Vec<String>,
}

impl ParsedReport {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn goals(&self, user_id: &str) -> u32 {
        self.goals_by_user.get(user_id).copied().unwrap_or(0)
    }

    pub fn assists(&self, user_id: &str) -> u32 {
        self.assists_by_user.get(user_id).copied().unwrap_or(0)
    }

    fn credit(&mut self, user_id: &str, goals: u32, assists: u32) {
        if goals == 0 && assists == 0 {
            return;
        }
        // multipliers are user supplied, totals saturate instead of wrapping
        if goals > 0 {
            let total = self.goals_by_user.entry(user_id.to_owned()).or_insert(0);
            *total = total.saturating_add(goals);
        }
        if assists > 0 {
            let total = self.assists_by_user.entry(user_id.to_owned()).or_insert(0);
            *total = total.saturating_add(assists);
        }
        if !self.users.iter().any(|known| known == user_id) {
            self.users.push(user_id.to_owned());
        }
    }
}

pub fn parse_report(text: &str, icons: &TeamIcons) -> ParsedReport {
    let mut report = ParsedReport::default();

    for line in text.lines() {
        // only the first mention on a line is credited
        let user_id = match user_mention_regex().captures(line).and_then(|c| c.get(1)) {
            Some(id) => id.as_str(),
            None => continue,
        };
        let goals = GlyphSet::goals().count_line(line);
        let assists = GlyphSet::assists().count_line(line);
        debug!("Line for {}: {} goal(s), {} assist(s)", user_id, goals, assists);
        report.credit(user_id, goals, assists);
    }

    for captures in clean_sheet_regex().captures_iter(text) {
        if let (Some(name), Some(id)) = (captures.get(1), captures.get(2)) {
            report.cleansheet_team_tags.insert(icons.team_for(name.as_str(), id.as_str()));
        }
    }

    for captures in role_mention_regex().captures_iter(text) {
        if let Some(tag) = captures.get(1) {
            let tag = tag.as_str().to_owned();
            if !report.team_tags_in_text.contains(&tag) {
                report.team_tags_in_text.push(tag);
            }
        }
    }

    report
}

/// Turns a parsed report into one delta per credited user, attributing each
/// user to the first team mentioned in the message that they belong to.
/// Users who left the guild keep their goals and assists but lose team credit.
pub async fn resolve_deltas(
    report: &ParsedReport,
    guild_id: u64,
    members: &dyn GuildMemberLookup,
) -> StatsResult<Vec<StatDelta>> {
    let mut deltas = Vec::with_capacity(report.users.len());
    for user_id in report.users.iter() {
        let team_tag = match members.member_roles(guild_id, user_id).await {
            Lookup::Found(roles) => report.team_tags_in_text
                .iter()
                .find(|tag| roles.contains(tag))
                .cloned(),
            Lookup::NotFound => {
                warn!("User {} not found in guild {}, dropping team attribution", user_id, guild_id);
                None
            }
            Lookup::Failed(reason) => {
                return Err(StatsError::ExternalUnavailable(format!(
                    "member lookup for {} failed: {}", user_id, reason
                )));
            }
        };
        let cleansheet = team_tag
            .as_ref()
            .map(|tag| report.cleansheet_team_tags.contains(tag))
            .unwrap_or(false);
        deltas.push(StatDelta {
            user_id: user_id.clone(),
            goals: report.goals(user_id),
            assists: report.assists(user_id),
            cleansheet,
            team_tag,
        });
    }
    Ok(deltas)
}
