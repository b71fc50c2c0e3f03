use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds for the benchmark runner and baseline store (spec §7).
/// Suite-load failures are fatal to the CLI (exit 2); workspace setup
/// failures classify a single task as `error` but never abort the suite.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// The suite file itself could not be parsed.
    SuiteLoad(String),
    /// Materializing a task's workspace failed before the orchestrator ran.
    SetupFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Json(err) => write!(f, "JSON error: {}", err),
            Error::SuiteLoad(msg) => write!(f, "failed to load suite: {}", msg),
            Error::SetupFailed(msg) => write!(f, "Setup failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::SuiteLoad(_) | Error::SetupFailed(_) => None,
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
