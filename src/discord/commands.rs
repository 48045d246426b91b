use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::InputError;
use crate::util::validation::parse_count;

#[derive(EnumIter, EnumString, Display, Debug, Clone, Copy, Eq, PartialEq)]
#[strum(serialize_all = "kebab-case")]
pub enum CommandName {
    RecordStats,
    BulkRecord,
    SingleRecord,
    SetTopPlayers,
    UpdateTopPlayers,
}

impl CommandName {
    pub fn usage(&self) -> &'static str {
        match self {
            CommandName::RecordStats => "record-stats <message link>",
            CommandName::BulkRecord => "bulk-record <channel link>",
            CommandName::SingleRecord => "single-record <user> <goals> <assists> <league>",
            CommandName::SetTopPlayers => "set-top-players <result channel link> <top players channel link>",
            CommandName::UpdateTopPlayers => "update-top-players",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RecordStats { link: String },
    BulkRecord { link: String },
    SingleRecord { user_id: String, goals: u32, assists: u32, league: String },
    SetTopPlayers { result_link: String, top_players_link: String },
    UpdateTopPlayers,
}

fn user_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:<@!?(\d+)>|(\d+))$").expect("user argument pattern is static"))
}

fn parse_user(raw: &str) -> Result<String, InputError> {
    user_regex()
        .captures(raw)
        .and_then(|captures| captures.get(1).or_else(|| captures.get(2)))
        .map(|id| id.as_str().to_owned())
        .ok_or_else(|| InputError::InvalidArgument(format!("'{}' is not a user mention or id", raw)))
}

fn parse_stat(raw: &str, what: &str) -> Result<u32, InputError> {
    parse_count(raw).ok_or_else(|| InputError::InvalidArgument(format!("{} must be a whole number, got '{}'", what, raw)))
}

impl Command {
    /// `None` when the message is not addressed to us at all.
    pub fn parse(prefix: &str, content: &str) -> Option<Result<Command, InputError>> {
        let body = content.trim().strip_prefix(prefix)?;
        let mut words = body.split_whitespace();
        let name = CommandName::from_str(&words.next()?.to_lowercase()).ok()?;
        let args = words.collect::<Vec<_>>();
        Some(Self::from_args(name, &args))
    }

    fn from_args(name: CommandName, args: &[&str]) -> Result<Command, InputError> {
        let usage = || InputError::InvalidArgument(format!("usage: {}", name.usage()));
        let command = match (name, args) {
            (CommandName::RecordStats, [link]) => Command::RecordStats { link: link.to_string() },
            (CommandName::BulkRecord, [link]) => Command::BulkRecord { link: link.to_string() },
            (CommandName::SingleRecord, [user, goals, assists, league]) => Command::SingleRecord {
                user_id: parse_user(user)?,
                goals: parse_stat(goals, "goals")?,
                assists: parse_stat(assists, "assists")?,
                league: league.to_string(),
            },
            (CommandName::SetTopPlayers, [result_link, top_players_link]) => Command::SetTopPlayers {
                result_link: result_link.to_string(),
                top_players_link: top_players_link.to_string(),
            },
            (CommandName::UpdateTopPlayers, []) => Command::UpdateTopPlayers,
            _ => return Err(usage()),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn foreign_messages_are_ignored() {
        assert_eq!(Command::parse(":?", "hello there"), None);
        assert_eq!(Command::parse(":?", ":?dance"), None);
        assert_eq!(Command::parse(":?", ":?"), None);
    }

    #[test]
    fn commands_parse_with_arguments() {
        assert_eq!(
            Command::parse(":?", " :?record-stats https://discord.com/channels/1/2/3 "),
            Some(Ok(Command::RecordStats { link: String::from("https://discord.com/channels/1/2/3") }))
        );
        assert_eq!(
            Command::parse(":?", ":?single-record <@!42> 2 0 la-liga"),
            Some(Ok(Command::SingleRecord {
                user_id: String::from("42"),
                goals: 2,
                assists: 0,
                league: String::from("la-liga"),
            }))
        );
        assert_eq!(Command::parse(":?", ":?Update-Top-Players"), Some(Ok(Command::UpdateTopPlayers)));
    }

    #[test]
    fn bad_arguments_explain_usage() {
        let missing = Command::parse(":?", ":?set-top-players https://discord.com/channels/1/2");
        assert_eq!(
            missing,
            Some(Err(InputError::InvalidArgument(format!("usage: {}", CommandName::SetTopPlayers.usage()))))
        );
        let negative = Command::parse(":?", ":?single-record 42 -1 0 pl");
        assert!(matches!(negative, Some(Err(InputError::InvalidArgument(_)))));
        let nobody = Command::parse(":?", ":?single-record someone 1 0 pl");
        assert!(matches!(nobody, Some(Err(InputError::InvalidArgument(_)))));
    }

    #[test]
    fn every_command_name_round_trips() {
        for name in CommandName::iter() {
            assert_eq!(CommandName::from_str(&name.to_string()), Ok(name));
        }
    }
}
