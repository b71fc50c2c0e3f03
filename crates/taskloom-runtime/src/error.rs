use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds that can occur in the runtime layer (spec §7: "error kinds,
/// not types"). The Collector's protocol errors are programming errors in
/// the caller and are surfaced immediately, never retried.
#[derive(Debug)]
pub enum Error {
    /// `record_*`/`finish` called while no trajectory is active.
    NotStarted,
    /// `start` called while a trajectory is already active.
    AlreadyStarted,
    /// An operation was attempted after `finish` already ran.
    AlreadyFinished,
    /// Any other state-machine violation.
    InvalidState(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotStarted => write!(f, "no trajectory is active"),
            Error::AlreadyStarted => write!(f, "a trajectory is already active"),
            Error::AlreadyFinished => write!(f, "trajectory already finished"),
            Error::InvalidState(msg) => write!(f, "invalid collector state: {}", msg),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Json(err) => write!(f, "JSON error: {}", err),
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
