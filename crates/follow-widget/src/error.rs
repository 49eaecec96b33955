//! Widget error types.

use thiserror::Error;

/// Widget error type.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] follow_protocol::ProtocolError),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("metadata error: {0}")]
    Metadata(String),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("login exchange error: {0}")]
    LoginExchange(String),
}

impl From<reqwest::Error> for WidgetError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.to_string())
    }
}

/// Widget result type.
pub type Result<T> = std::result::Result<T, WidgetError>;
