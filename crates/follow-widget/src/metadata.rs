//! Storefront metadata fetch and memoization.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::{Result, WidgetError};

/// Public metadata a storefront exposes about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontMetadata {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Storefront-side API surface.
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// Fetch the storefront's public metadata.
    async fn store_metadata(&self, origin: &str) -> Result<StorefrontMetadata>;

    /// Exchange the session established in the authorization frame for a
    /// first-party login cookie on the storefront.
    async fn exchange_login_cookie(&self, origin: &str) -> Result<()>;
}

/// Memoizing wrapper over [`StorefrontApi::store_metadata`]. A successful
/// fetch is cached for the life of the cache; a failed fetch is retried on
/// the next call. Concurrent callers share one in-flight fetch.
pub struct MetadataCache {
    api: std::sync::Arc<dyn StorefrontApi>,
    cached: OnceCell<StorefrontMetadata>,
}

impl MetadataCache {
    pub fn new(api: std::sync::Arc<dyn StorefrontApi>) -> Self {
        Self {
            api,
            cached: OnceCell::new(),
        }
    }

    /// Metadata for `origin`, or `None` when the fetch fails.
    pub async fn get(&self, origin: &str) -> Option<StorefrontMetadata> {
        let result = self
            .cached
            .get_or_try_init(|| self.api.store_metadata(origin))
            .await;
        match result {
            Ok(metadata) => Some(metadata.clone()),
            Err(error) => {
                debug!(%error, "storefront metadata fetch failed");
                None
            }
        }
    }
}

/// HTTP-backed storefront API.
pub struct HttpStorefrontApi {
    client: reqwest::Client,
}

impl HttpStorefrontApi {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpStorefrontApi {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl StorefrontApi for HttpStorefrontApi {
    async fn store_metadata(&self, origin: &str) -> Result<StorefrontMetadata> {
        let url = format!("{origin}/meta.json");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(WidgetError::Metadata(format!(
                "{url} returned {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    async fn exchange_login_cookie(&self, origin: &str) -> Result<()> {
        let url = format!("{origin}/account/login/exchange");
        let response = self.client.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(WidgetError::LoginExchange(format!(
                "{url} returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
