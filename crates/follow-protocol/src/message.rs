//! Typed messages posted by the authorization frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Rendering phase reported by the authorization frame alongside content
/// updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizeState {
    Start,
    OneClick,
    Captcha,
}

/// Partial content update for the modal-content widget. Absent fields leave
/// the widget's current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorize_state: Option<AuthorizeState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ContentUpdate {
    /// Whether this update signals a captcha challenge, which hides the
    /// store logo while the challenge is displayed.
    pub fn signals_captcha(&self) -> bool {
        matches!(self.authorize_state, Some(AuthorizeState::Captcha))
    }
}

/// Message union posted by the authorization frame, keyed by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowMessage {
    /// The frame finished loading; may carry client branding.
    #[serde(rename_all = "camelCase")]
    Loaded {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        logo_src: Option<String>,
    },
    /// The frame requests new dimensions. Last write wins.
    ResizeIframe { height: f64, width: f64 },
    /// The follow flow reached its terminal state.
    #[serde(rename_all = "camelCase")]
    Completed {
        #[serde(default)]
        logged_in: bool,
        #[serde(default)]
        should_finalize_login: bool,
    },
    /// The frame reports an error to surface to the host page.
    Error {
        code: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
    },
    /// Content for the modal header/body, forwarded to the content widget.
    Content(ContentUpdate),
    /// Processing status change, forwarded to the content widget.
    ProcessingStatusUpdated(ContentUpdate),
    /// The frame asks the host to close the modal.
    CloseRequested,
}

impl FlowMessage {
    /// Parse a raw JSON payload into a typed message. Payloads without a
    /// recognized `type` discriminant are an error; unknown extra fields
    /// are ignored.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Wire name of the `type` discriminant, for diagnostics.
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::Loaded { .. } => "loaded",
            Self::ResizeIframe { .. } => "resize_iframe",
            Self::Completed { .. } => "completed",
            Self::Error { .. } => "error",
            Self::Content(_) => "content",
            Self::ProcessingStatusUpdated(_) => "processing_status_updated",
            Self::CloseRequested => "close_requested",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_known_message_types() -> Result<()> {
        let cases = vec![
            (
                json!({"type": "loaded", "clientName": "Acme", "logoSrc": "https://cdn.example/logo.png"}),
                FlowMessage::Loaded {
                    client_name: Some("Acme".to_string()),
                    logo_src: Some("https://cdn.example/logo.png".to_string()),
                },
            ),
            (
                json!({"type": "resize_iframe", "height": 480.0, "width": 360.0}),
                FlowMessage::ResizeIframe {
                    height: 480.0,
                    width: 360.0,
                },
            ),
            (
                json!({"type": "completed", "loggedIn": true, "shouldFinalizeLogin": false}),
                FlowMessage::Completed {
                    logged_in: true,
                    should_finalize_login: false,
                },
            ),
            (
                json!({"type": "error", "code": "denied", "message": "user denied", "email": "a@b.example"}),
                FlowMessage::Error {
                    code: "denied".to_string(),
                    message: "user denied".to_string(),
                    email: Some("a@b.example".to_string()),
                },
            ),
            (
                json!({"type": "content", "title": "Sign in", "authorizeState": "captcha"}),
                FlowMessage::Content(ContentUpdate {
                    title: Some("Sign in".to_string()),
                    authorize_state: Some(AuthorizeState::Captcha),
                    ..ContentUpdate::default()
                }),
            ),
            (
                json!({"type": "processing_status_updated", "status": "verifying", "email": "a@b.example"}),
                FlowMessage::ProcessingStatusUpdated(ContentUpdate {
                    status: Some("verifying".to_string()),
                    email: Some("a@b.example".to_string()),
                    ..ContentUpdate::default()
                }),
            ),
            (json!({"type": "close_requested"}), FlowMessage::CloseRequested),
        ];

        for (raw, expected) in cases {
            let parsed = FlowMessage::from_value(raw)?;
            assert_eq!(parsed, expected);
        }

        Ok(())
    }

    #[test]
    fn parse_applies_field_defaults() -> Result<()> {
        let parsed = FlowMessage::from_value(json!({"type": "loaded"}))?;
        assert_eq!(
            parsed,
            FlowMessage::Loaded {
                client_name: None,
                logo_src: None,
            }
        );

        let parsed = FlowMessage::from_value(json!({"type": "completed"}))?;
        assert_eq!(
            parsed,
            FlowMessage::Completed {
                logged_in: false,
                should_finalize_login: false,
            }
        );

        Ok(())
    }

    #[test]
    fn parse_ignores_unknown_fields() -> Result<()> {
        let parsed = FlowMessage::from_value(json!({
            "type": "error",
            "code": "denied",
            "message": "user denied",
            "experimental": {"nested": true},
        }))?;
        assert_eq!(parsed.message_type(), "error");
        Ok(())
    }

    #[test]
    fn parse_rejects_malformed_payloads() {
        let cases = vec![
            ("missing discriminant", json!({"code": "denied"})),
            ("unknown discriminant", json!({"type": "telemetry"})),
            ("non-object payload", json!(["loaded"])),
            ("wrong field type", json!({"type": "resize_iframe", "height": "tall", "width": 1.0})),
            ("missing required field", json!({"type": "error", "code": "denied"})),
        ];

        for (name, raw) in cases {
            let result = FlowMessage::from_value(raw);
            assert!(result.is_err(), "{name}: expected parse error");
        }
    }

    #[test]
    fn message_type_matches_wire_tag() -> Result<()> {
        let messages = vec![
            FlowMessage::Loaded {
                client_name: None,
                logo_src: None,
            },
            FlowMessage::ResizeIframe {
                height: 1.0,
                width: 1.0,
            },
            FlowMessage::Completed {
                logged_in: true,
                should_finalize_login: true,
            },
            FlowMessage::Error {
                code: "c".to_string(),
                message: "m".to_string(),
                email: None,
            },
            FlowMessage::Content(ContentUpdate::default()),
            FlowMessage::ProcessingStatusUpdated(ContentUpdate::default()),
            FlowMessage::CloseRequested,
        ];

        for message in messages {
            let encoded = serde_json::to_value(&message)?;
            assert_eq!(encoded["type"], message.message_type());
        }

        Ok(())
    }

    #[test]
    fn completed_uses_camel_case_field_names() -> Result<()> {
        let encoded = serde_json::to_value(FlowMessage::Completed {
            logged_in: true,
            should_finalize_login: true,
        })?;
        assert_eq!(encoded["loggedIn"], true);
        assert_eq!(encoded["shouldFinalizeLogin"], true);
        Ok(())
    }

    #[test]
    fn captcha_state_is_detected_on_content_updates() {
        let update = ContentUpdate {
            authorize_state: Some(AuthorizeState::Captcha),
            ..ContentUpdate::default()
        };
        assert!(update.signals_captcha());

        let update = ContentUpdate {
            authorize_state: Some(AuthorizeState::Start),
            ..ContentUpdate::default()
        };
        assert!(!update.signals_captcha());
        assert!(!ContentUpdate::default().signals_captcha());
    }
}
