//! Unified error handling with Sentry integration.
//!
//! The state layer itself recovers locally from every failure it can (corrupt
//! storage, failed writes, failed image lookups). `AppError` covers what is
//! left for the composition root: startup configuration, opening storage, and
//! rejected caller input.

use storefront_state_core::QuantityError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::images::ImageLookupError;
use crate::persistence::StorageError;

/// Application-level error type for the state layer.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage backend could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Image lookup client could not be built.
    #[error("Image lookup error: {0}")]
    ImageLookup(#[from] ImageLookupError),

    /// Caller supplied a quantity that is not a whole number.
    #[error("Invalid quantity: {0}")]
    Quantity(#[from] QuantityError),

    /// Caller supplied invalid input.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether the error is the caller's fault rather than the system's.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Quantity(_) | Self::BadRequest(_))
    }

    /// Log the error, capturing system errors to Sentry.
    pub fn report(&self) {
        if self.is_client_error() {
            tracing::warn!(error = %self, "Rejected request");
            return;
        }

        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "State layer error"
        );
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart and
/// navigation actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "p1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("unknown section".to_string());
        assert_eq!(err.to_string(), "Bad request: unknown section");

        let err = AppError::from(QuantityError::Empty);
        assert_eq!(err.to_string(), "Invalid quantity: quantity cannot be empty");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(AppError::BadRequest("x".to_string()).is_client_error());
        assert!(AppError::Quantity(QuantityError::Empty).is_client_error());
        assert!(!AppError::Storage(StorageError::Unavailable("x".to_string())).is_client_error());
    }

    #[test]
    fn test_report_without_sentry_client_is_noop() {
        AppError::Storage(StorageError::Unavailable("boom".to_string())).report();
        add_breadcrumb("cart", "Cleared", None);
    }
}
