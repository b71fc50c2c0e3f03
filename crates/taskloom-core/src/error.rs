use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors internal to executor setup. Individual tool *failures* are data
/// (carried in [`crate::ToolOutcome`]), never this error type — per spec
/// §7, tool execution failures are always recovered locally.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
