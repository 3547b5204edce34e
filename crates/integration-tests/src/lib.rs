//! Integration tests for the storefront state layer.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-state-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - Cart behaviour across reloads on file storage
//! - `inventory_bus` - Cross-component inventory notifications
//! - `dashboard_navigation` - Navigation restore and section switching
//!
//! Tests run against real files in a throwaway directory; no network or
//! external services are needed.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use storefront_state::images::{ImageLookup, ImageLookupError};
use storefront_state::persistence::FileStorage;
use storefront_state::{AppState, StateConfig};
use storefront_state_core::ProductId;
use uuid::Uuid;

/// A data directory under the system temp dir, removed on drop.
#[derive(Debug)]
pub struct TempDataDir {
    path: PathBuf,
}

impl TempDataDir {
    /// Create a fresh, uniquely named directory.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("storefront-state-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&path).expect("Failed to create temp data dir");
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open application state over this directory, as a page load would.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be opened as storage.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn open_state(&self, images: Arc<dyn ImageLookup>) -> AppState {
        let storage = FileStorage::open(&self.path).expect("Failed to open file storage");
        AppState::with_parts(
            StateConfig::with_data_dir(&self.path),
            Arc::new(storage),
            images,
        )
    }
}

impl Default for TempDataDir {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempDataDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Image lookup answering from a fixed table.
#[derive(Debug, Default)]
pub struct StaticImageLookup {
    images: HashMap<ProductId, String>,
}

impl StaticImageLookup {
    #[must_use]
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            images: entries
                .iter()
                .map(|(id, image)| (ProductId::from(*id), (*image).to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl ImageLookup for StaticImageLookup {
    async fn lookup(&self, id: &ProductId) -> Result<Option<String>, ImageLookupError> {
        Ok(self.images.get(id).cloned())
    }
}
