//! Catalog REST API image lookup.
//!
//! `GET {catalog_url}/products/{id}/image` returns the raw image bytes. The
//! body is embedded as a `data:` URI so cart items stay self-contained when
//! persisted. Results, including "no image", are cached for the configured
//! TTL, or until the inventory bus reports a catalog write.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use storefront_state_core::ProductId;
use tracing::{debug, instrument};
use url::Url;

use super::{ImageLookup, ImageLookupError};
use crate::config::CatalogConfig;
use crate::notify::{NotificationBus, Subscription};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Client for product images on the catalog API.
#[derive(Clone)]
pub struct CatalogImageLookup {
    inner: Arc<CatalogImageLookupInner>,
}

struct CatalogImageLookupInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    cache: Cache<ProductId, Option<String>>,
}

impl CatalogImageLookup {
    /// Create a new catalog image client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &CatalogConfig) -> Result<Self, ImageLookupError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.image_cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        // Joining relative paths needs a trailing slash on the base
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(CatalogImageLookupInner {
                client,
                base_url,
                token: config.api_token.clone(),
                cache,
            }),
        })
    }

    /// Build the image URL for a product.
    fn image_url(&self, id: &ProductId) -> Result<Url, ImageLookupError> {
        let mut url = self.inner.base_url.join("products/")?;
        url.path_segments_mut()
            .map_err(|()| {
                ImageLookupError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase)
            })?
            .pop_if_empty()
            .push(id.as_str())
            .push("image");
        Ok(url)
    }

    /// Fetch an image from the catalog, bypassing the cache.
    async fn fetch(&self, id: &ProductId) -> Result<Option<String>, ImageLookupError> {
        let url = self.image_url(id)?;

        let mut request = self.inner.client.get(url);
        if let Some(token) = &self.inner.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ImageLookupError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_owned();
        let bytes = response.bytes().await?;

        if bytes.is_empty() {
            return Ok(None);
        }

        Ok(Some(encode_data_uri(&content_type, &bytes)))
    }

    /// Invalidate all cached lookups.
    pub fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        debug!("Image lookup cache invalidated");
    }

    /// Drop cached lookups whenever `bus` publishes.
    ///
    /// Product writes announce themselves on the inventory bus, and an image
    /// may have changed with them.
    pub fn invalidate_on(&self, bus: &NotificationBus) -> Subscription {
        let lookup = self.clone();
        bus.subscribe(move || lookup.invalidate_all())
    }
}

#[async_trait]
impl ImageLookup for CatalogImageLookup {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn lookup(&self, id: &ProductId) -> Result<Option<String>, ImageLookupError> {
        if let Some(cached) = self.inner.cache.get(id).await {
            debug!("Image lookup served from cache");
            return Ok(cached);
        }

        // Errors are not cached so a transient failure can be retried
        let image = self.fetch(id).await?;
        self.inner.cache.insert(id.clone(), image.clone()).await;
        Ok(image)
    }
}

/// Encode bytes as a base64 `data:` URI.
fn encode_data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};base64,{}", STANDARD.encode(bytes))
}
