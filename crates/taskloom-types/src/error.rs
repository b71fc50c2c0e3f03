use std::fmt;

/// Result type for taskloom-types operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing or validating data-model values.
#[derive(Debug)]
pub enum Error {
    /// A step referenced a `source_call_id` that no earlier step emitted.
    DanglingToolCallRef(String),
    /// A trajectory's step ids are not a dense 1..=n sequence.
    NonDenseStepIds,
    /// Malformed JSON while decoding a record.
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DanglingToolCallRef(id) => {
                write!(f, "observation references unknown tool_call_id: {}", id)
            }
            Error::NonDenseStepIds => write!(f, "trajectory step ids are not dense from 1"),
            Error::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(err) => Some(err),
            Error::DanglingToolCallRef(_) | Error::NonDenseStepIds => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
