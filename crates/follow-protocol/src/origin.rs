//! Origin allow-listing for inbound frame messages.

use crate::error::{ProtocolError, Result};

/// Origin of the hosted authorization surface.
pub const AUTH_ORIGIN: &str = "https://auth.followkit.app";

/// Alternate authorization origin used during domain migrations.
pub const AUTH_ORIGIN_ALT: &str = "https://auth.followkit.dev";

/// The fixed set of message-source origins trusted by a listener: the
/// authorization origin, its alternate, and the configured storefront
/// origin. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigins {
    origins: [String; 3],
}

impl AllowedOrigins {
    pub fn new(
        auth_origin: impl Into<String>,
        auth_origin_alt: impl Into<String>,
        storefront_origin: impl Into<String>,
    ) -> Self {
        Self {
            origins: [
                auth_origin.into(),
                auth_origin_alt.into(),
                storefront_origin.into(),
            ],
        }
    }

    /// Allow-list with the default authorization origins plus the given
    /// storefront origin.
    pub fn for_storefront(storefront_origin: impl Into<String>) -> Self {
        Self::new(AUTH_ORIGIN, AUTH_ORIGIN_ALT, storefront_origin)
    }

    /// Exact string match against the allow-list. No wildcards, no scheme
    /// normalization.
    pub fn is_allowed(&self, origin: &str) -> bool {
        is_allowed_origin(origin, &self.origins)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.origins
    }
}

/// Pure allow-list predicate: exact string comparison only.
pub fn is_allowed_origin(origin: &str, allow_list: &[String]) -> bool {
    allow_list.iter().any(|allowed| allowed == origin)
}

/// Normalize a caller-supplied storefront origin: trimmed, no trailing
/// slash, `http(s)` scheme with a host and nothing after it.
pub fn normalize_storefront_origin(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ProtocolError::InvalidOrigin("empty origin".to_string()));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ProtocolError::InvalidOrigin(format!(
            "origin must use http:// or https://, got: {raw}"
        )));
    }
    let Some((_, remainder)) = trimmed.split_once("://") else {
        return Err(ProtocolError::InvalidOrigin(raw.to_string()));
    };
    if remainder.is_empty() || remainder.contains('/') {
        return Err(ProtocolError::InvalidOrigin(format!(
            "origin must not carry a path, got: {raw}"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_exactly_the_three_configured_origins() {
        let allowed = AllowedOrigins::for_storefront("https://store.example");
        assert!(allowed.is_allowed(AUTH_ORIGIN));
        assert!(allowed.is_allowed(AUTH_ORIGIN_ALT));
        assert!(allowed.is_allowed("https://store.example"));
        assert_eq!(allowed.as_slice().len(), 3);
    }

    #[test]
    fn rejects_near_miss_origins() {
        let allowed = AllowedOrigins::for_storefront("https://store.example");
        let near_misses = [
            "https://evil.example",
            "http://store.example",
            "https://store.example/",
            "https://store.example.evil.example",
            "https://STORE.EXAMPLE",
            "",
        ];
        for origin in near_misses {
            assert!(!allowed.is_allowed(origin), "{origin:?} should be rejected");
        }
    }

    #[test]
    fn normalize_trims_and_drops_trailing_slash() -> Result<()> {
        let normalized = normalize_storefront_origin(" https://store.example/ ")?;
        assert_eq!(normalized, "https://store.example");
        Ok(())
    }

    #[test]
    fn normalize_rejects_invalid_origins() {
        let invalid = [
            "",
            "   ",
            "store.example",
            "ftp://store.example",
            "https://store.example/shop",
            "https://",
        ];
        for raw in invalid {
            assert!(
                normalize_storefront_origin(raw).is_err(),
                "{raw:?} should be rejected"
            );
        }
    }
}
