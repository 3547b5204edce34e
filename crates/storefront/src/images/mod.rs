//! Product image lookup used to enrich cart items that arrive without one.
//!
//! # Implementations
//!
//! - [`CatalogImageLookup`] - fetches from the catalog REST API, cached via `moka`
//! - [`NoImageLookup`] - never finds an image (no catalog configured)

mod catalog;

use async_trait::async_trait;
use storefront_state_core::ProductId;
use thiserror::Error;

pub use catalog::CatalogImageLookup;

/// Errors that can occur when looking up a product image.
#[derive(Debug, Error)]
pub enum ImageLookupError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered with an unexpected status.
    #[error("catalog returned status {0}")]
    Status(u16),

    /// The lookup URL could not be built.
    #[error("invalid lookup URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Resolves the embedded image payload for a product.
///
/// `Ok(None)` means the product has no image; `Err` means the lookup itself
/// failed. Callers treat both as "store the item without an image".
#[async_trait]
pub trait ImageLookup: Send + Sync {
    /// Look up the image for `id`.
    async fn lookup(&self, id: &ProductId) -> Result<Option<String>, ImageLookupError>;
}

/// Lookup that never finds an image.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImageLookup;

#[async_trait]
impl ImageLookup for NoImageLookup {
    async fn lookup(&self, _id: &ProductId) -> Result<Option<String>, ImageLookupError> {
        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_image_lookup_finds_nothing() {
        let lookup = NoImageLookup;
        assert!(lookup.lookup(&ProductId::new("p1")).await.unwrap().is_none());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ImageLookupError::Status(503).to_string(),
            "catalog returned status 503"
        );
    }
}
