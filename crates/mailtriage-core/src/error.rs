//! Error types for mailtriage.

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias using mailtriage's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to the user when a request fails without a usable error body.
pub const GENERIC_NETWORK_ERROR: &str = "Network error while contacting the classification service";

/// Message shown to the user when the service answered 2xx with an unusable body.
pub const MALFORMED_RESPONSE_ERROR: &str = "The classification service returned an unreadable response";

/// Core error type for mailtriage operations.
///
/// There is no cancellation variant; a superseded or cleared request is
/// reported as an outcome, not a failure.
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before any request was issued
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Network unreachable, connection reset or timeout
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response; `message` comes from the `error` field of the body when present
    #[error("Service error ({status}): {}", message.as_deref().unwrap_or("no error message"))]
    Application { status: u16, message: Option<String> },

    /// 2xx response whose body does not match the result shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested item does not exist (e.g. exporting with no result)
    #[error("Not found: {0}")]
    NotFound(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Text handed to the presenter's `on_error`.
    ///
    /// The service's own error message wins; everything else collapses to a
    /// generic message so transport details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::Application {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Error::MalformedResponse(_) | Error::Serialization(_) => {
                MALFORMED_RESPONSE_ERROR.to_string()
            }
            Error::Validation(err) => err.to_string(),
            _ => GENERIC_NETWORK_ERROR.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}
