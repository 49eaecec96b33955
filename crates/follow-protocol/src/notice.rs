//! Outward error notices surfaced to the host page.

use serde::{Deserialize, Serialize};

/// Detail payload of the outward `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ErrorNotice {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Static error descriptor with a fixed code and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorDescriptor {
    pub code: &'static str,
    pub message: &'static str,
}

/// Raised when the authorization frame fails to report `loaded` within the
/// configured deadline.
pub const TEMPORARILY_UNAVAILABLE: ErrorDescriptor = ErrorDescriptor {
    code: "temporarily_unavailable",
    message: "The follow service is temporarily unavailable. Try again shortly.",
};

impl From<ErrorDescriptor> for ErrorNotice {
    fn from(descriptor: ErrorDescriptor) -> Self {
        Self::new(descriptor.code, descriptor.message)
    }
}
