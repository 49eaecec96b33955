//! Authorize-URL parameter model and builder seam.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;
use crate::origin::AUTH_ORIGIN;

/// Flow requested from the authorization surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Follow,
}

impl FlowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Follow => "follow",
        }
    }
}

/// OAuth parameters forwarded to the authorization surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthParams {
    pub client_id: String,
}

/// Inputs for building the embedded frame's source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeUrlParams {
    pub version: String,
    pub analytics_trace_id: String,
    pub flow: FlowKind,
    pub oauth: OAuthParams,
}

/// Seam for the URL builder; the widget treats the construction as opaque.
pub trait AuthorizeUrlBuilder: Send + Sync {
    fn build_authorize_url(&self, params: &AuthorizeUrlParams) -> String;
}

/// Default builder: `{base}/authorize` with the parameters as query pairs.
#[derive(Debug, Clone)]
pub struct QueryAuthorizeUrlBuilder {
    base: Url,
}

impl QueryAuthorizeUrlBuilder {
    pub fn new(base: &str) -> Result<Self> {
        Ok(Self {
            base: Url::parse(base)?,
        })
    }

    /// Builder pointed at the default authorization origin.
    pub fn default_auth() -> Result<Self> {
        Self::new(AUTH_ORIGIN)
    }
}

impl AuthorizeUrlBuilder for QueryAuthorizeUrlBuilder {
    fn build_authorize_url(&self, params: &AuthorizeUrlParams) -> String {
        let mut url = self.base.clone();
        url.set_path("authorize");
        url.query_pairs_mut()
            .clear()
            .append_pair("client_id", &params.oauth.client_id)
            .append_pair("flow", params.flow.as_str())
            .append_pair("version", &params.version)
            .append_pair("analytics_trace_id", &params.analytics_trace_id);
        url.into()
    }
}
