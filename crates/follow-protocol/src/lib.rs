//! Protocol layer for the embedded store-follow authorization flow.
//!
//! This crate intentionally exposes a small surface:
//! - the typed message union posted by the authorization frame
//! - origin allow-listing and storefront-origin normalization
//! - the authorize-URL parameter model and builder seam
//! - outward error notices and their static descriptors

pub mod authorize;
pub mod error;
pub mod message;
pub mod notice;
pub mod origin;

pub use authorize::{AuthorizeUrlBuilder, AuthorizeUrlParams, FlowKind, OAuthParams, QueryAuthorizeUrlBuilder};
pub use error::{ProtocolError, Result};
pub use message::{AuthorizeState, ContentUpdate, FlowMessage};
pub use notice::{ErrorDescriptor, ErrorNotice, TEMPORARILY_UNAVAILABLE};
pub use origin::{AUTH_ORIGIN, AUTH_ORIGIN_ALT, AllowedOrigins, is_allowed_origin, normalize_storefront_origin};
