//! Protocol error types.

use thiserror::Error;

/// Protocol error type.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("invalid storefront origin: {0}")]
    InvalidOrigin(String),
}

/// Protocol result type.
pub type Result<T> = std::result::Result<T, ProtocolError>;
