//! Widget configuration and host attribute names.

use std::time::Duration;

use follow_protocol::origin::{AUTH_ORIGIN, AUTH_ORIGIN_ALT};

pub const ATTRIBUTE_CLIENT_ID: &str = "client-id";
pub const ATTRIBUTE_VERSION: &str = "version";
pub const ATTRIBUTE_STOREFRONT_ORIGIN: &str = "storefront-origin";
pub const ATTRIBUTE_DEV_MODE: &str = "dev-mode";
pub const ATTRIBUTE_ANALYTICS_TRACE_ID: &str = "analytics-trace-id";

/// Cookie recording that the user completed the follow flow.
pub const FOLLOW_COOKIE_NAME: &str = "store_followed";

/// Follow cookie lifetime: 365 days.
pub const FOLLOW_COOKIE_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Deadline for the frame's `loaded` message after a src assignment.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(20);

pub const DEFAULT_VERSION: &str = "2";

/// Permissions-policy value granted to the authorization frame.
pub const FRAME_PERMISSIONS: &str = "publickey-credentials-get *";

/// Public website origin, used for store logo and QR deep links.
pub const WEBSITE_ORIGIN: &str = "https://followkit.app";

/// Widget configuration.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub load_timeout: Duration,
    pub cookie_name: String,
    pub cookie_ttl: Duration,
    pub auth_origin: String,
    pub auth_origin_alt: String,
    pub website_origin: String,
    /// Origin of the embedding storefront page; usually overwritten by the
    /// `storefront-origin` attribute.
    pub storefront_origin: String,
    pub locale: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            cookie_name: FOLLOW_COOKIE_NAME.to_string(),
            cookie_ttl: FOLLOW_COOKIE_TTL,
            auth_origin: AUTH_ORIGIN.to_string(),
            auth_origin_alt: AUTH_ORIGIN_ALT.to_string(),
            website_origin: WEBSITE_ORIGIN.to_string(),
            storefront_origin: String::new(),
            locale: "en".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = WidgetConfig::default();
        assert_eq!(config.load_timeout, DEFAULT_LOAD_TIMEOUT);
        assert_eq!(config.cookie_name, FOLLOW_COOKIE_NAME);
        assert_eq!(config.cookie_ttl, Duration::from_secs(31_536_000));
        assert_eq!(config.auth_origin, AUTH_ORIGIN);
        assert_eq!(config.auth_origin_alt, AUTH_ORIGIN_ALT);
        assert_eq!(config.locale, "en");
    }
}
