use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    InvalidLink(String),
    MissingReportText,
    EmptyStatSet,
    InvalidArgument(String),
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::InvalidLink(link) => write!(f, "invalid message link: {}", link),
            InputError::MissingReportText => write!(f, "report message has no text"),
            InputError::EmptyStatSet => write!(f, "no player stats found in message"),
            InputError::InvalidArgument(reason) => write!(f, "invalid argument: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    UnknownLeague { channel_name: String },
    UnresolvableCollection { league: String },
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionError::UnknownLeague { channel_name } => {
                write!(f, "no league matches channel '{}'", channel_name)
            }
            ResolutionError::UnresolvableCollection { league } => {
                write!(f, "no stat collection could be resolved for league '{}'", league)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    Input(InputError),
    Resolution(ResolutionError),
    // not a failure, the message already carries our marker
    AlreadyProcessed { message_id: u64 },
    ExternalUnavailable(String),
}

impl StatsError {
    pub fn external<E: Display>(context: &str, err: E) -> Self {
        StatsError::ExternalUnavailable(format!("{}: {}", context, err))
    }

    pub fn is_informational(&self) -> bool {
        matches!(self, StatsError::AlreadyProcessed { .. })
    }
}

impl Display for StatsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsError::Input(e) => write!(f, "{}", e),
            StatsError::Resolution(e) => write!(f, "{}", e),
            StatsError::AlreadyProcessed { message_id } => {
                write!(f, "message {} has already been recorded", message_id)
            }
            StatsError::ExternalUnavailable(reason) => write!(f, "external service unavailable: {}", reason),
        }
    }
}

impl std::error::Error for StatsError {}

impl From<InputError> for StatsError {
    fn from(e: InputError) -> Self {
        StatsError::Input(e)
    }
}

impl From<ResolutionError> for StatsError {
    fn from(e: ResolutionError) -> Self {
        StatsError::Resolution(e)
    }
}

impl From<mongodb::error::Error> for StatsError {
    fn from(e: mongodb::error::Error) -> Self {
        StatsError::external("database", e)
    }
}

impl From<serenity::Error> for StatsError {
    fn from(e: serenity::Error) -> Self {
        StatsError::external("discord", e)
    }
}

pub type StatsResult<T> = Result<T, StatsError>;
