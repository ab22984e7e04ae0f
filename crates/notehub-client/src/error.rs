//! Error types for the NoteHub client.

use notehub_core::NoteId;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the NoteHub API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request did not complete (connection refused, DNS, reset...).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("server error ({status}): {message}")]
    Http { status: u16, message: String },

    /// The server rejected the payload.
    #[error("{0}")]
    Validation(String),

    /// The requested note does not exist.
    #[error("note not found: {0}")]
    NotFound(NoteId),

    /// The response body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// A background fetch task failed before producing a result.
    #[error("fetch task failed: {0}")]
    Task(String),

    /// A cached value could not be read back as the requested type.
    #[error("cached value for {key} has an unexpected type")]
    CacheType { key: String },
}

impl ClientError {
    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// Message suitable for showing to a user.
    ///
    /// Server-provided messages are shown verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { message, .. } => message.clone(),
            Self::Validation(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e)
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
