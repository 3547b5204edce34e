//! Application state shared across components.
//!
//! `AppState` is the composition root: it owns the one cart store, the one
//! inventory notification bus and the navigation state for the lifetime of
//! the process, and hands out references to consumers.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use crate::cart::CartStore;
use crate::config::StateConfig;
use crate::dashboard::NavigationState;
use crate::error::AppError;
use crate::images::{CatalogImageLookup, ImageLookup, NoImageLookup};
use crate::notify::NotificationBus;
use crate::persistence::{FileStorage, KeyValueStorage, Persistence};

/// Application state shared across all components.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// cart, the inventory bus, navigation, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StateConfig,
    persistence: Persistence,
    cart: CartStore,
    inventory: NotificationBus,
    navigation: Mutex<NavigationState>,
}

impl AppState {
    /// Create application state backed by files under `config.data_dir`.
    ///
    /// Image lookup goes to the catalog API when one is configured, and its
    /// cache is dropped on every inventory publish.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the
    /// catalog client cannot be built.
    pub fn new(config: StateConfig) -> Result<Self, AppError> {
        let storage = FileStorage::open(&config.data_dir)?;
        info!(data_dir = %storage.root().display(), "Opened durable storage");

        let catalog = match &config.catalog {
            Some(catalog) => {
                info!(catalog_url = %catalog.base_url, "Image lookup enabled");
                Some(CatalogImageLookup::new(catalog)?)
            }
            None => None,
        };
        let images: Arc<dyn ImageLookup> = match &catalog {
            Some(catalog) => Arc::new(catalog.clone()),
            None => Arc::new(NoImageLookup),
        };

        let state = Self::with_parts(config, Arc::new(storage), images);
        if let Some(catalog) = catalog {
            // Held for the life of the process
            let _subscription = catalog.invalidate_on(state.inventory());
        }
        Ok(state)
    }

    /// Create application state from explicit collaborators.
    #[must_use]
    pub fn with_parts(
        config: StateConfig,
        storage: Arc<dyn KeyValueStorage>,
        images: Arc<dyn ImageLookup>,
    ) -> Self {
        let persistence = Persistence::new(storage);
        let cart = CartStore::load(persistence.clone(), images);
        let navigation = NavigationState::load(persistence.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                persistence,
                cart,
                inventory: NotificationBus::new("inventory"),
                navigation: Mutex::new(navigation),
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &StateConfig {
        &self.inner.config
    }

    /// Get a reference to the persistence adapter.
    #[must_use]
    pub fn persistence(&self) -> &Persistence {
        &self.inner.persistence
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the inventory change bus.
    #[must_use]
    pub fn inventory(&self) -> &NotificationBus {
        &self.inner.inventory
    }

    /// Run `f` with exclusive access to the navigation state.
    pub fn with_navigation<R>(&self, f: impl FnOnce(&mut NavigationState) -> R) -> R {
        let mut navigation = self
            .inner
            .navigation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut navigation)
    }

    /// Copy of the current navigation state.
    #[must_use]
    pub fn navigation(&self) -> NavigationState {
        self.with_navigation(|navigation| navigation.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use rust_decimal::Decimal;
    use storefront_state_core::{CartItem, DashboardSection};

    use super::*;
    use crate::config::CatalogConfig;
    use crate::persistence::MemoryStorage;

    fn state() -> AppState {
        AppState::with_parts(
            StateConfig::with_data_dir("unused"),
            Arc::new(MemoryStorage::new()),
            Arc::new(NoImageLookup),
        )
    }

    #[test]
    fn test_clones_share_one_cart() {
        let state = state();
        let other = state.clone();

        state
            .cart()
            .add_item(CartItem::new("p1", "Pineapple", Decimal::ONE, 2).with_image("x"));
        assert_eq!(other.cart().total_items(), 2);
    }

    #[test]
    fn test_clones_share_one_inventory_bus() {
        let state = state();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let _subscription = state.inventory().subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        state.clone().inventory().publish();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_navigation_is_persisted_through_shared_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let state = AppState::with_parts(
            StateConfig::with_data_dir("unused"),
            storage.clone(),
            Arc::new(NoImageLookup),
        );
        state.with_navigation(|nav| nav.change_section(DashboardSection::Orders, None));

        let reloaded = AppState::with_parts(
            StateConfig::with_data_dir("unused"),
            storage,
            Arc::new(NoImageLookup),
        );
        assert_eq!(reloaded.navigation().section(), DashboardSection::Orders);
    }

    #[test]
    fn test_new_opens_file_storage() {
        let dir = std::env::temp_dir().join(format!("storefront-state-{}", uuid::Uuid::new_v4()));
        let state = AppState::new(StateConfig::with_data_dir(&dir)).unwrap();
        assert!(state.cart().is_empty());
        assert!(dir.is_dir());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_new_with_catalog_invalidates_on_inventory_publish() {
        let dir = std::env::temp_dir().join(format!("storefront-state-{}", uuid::Uuid::new_v4()));
        let mut config = StateConfig::with_data_dir(&dir);
        config.catalog = Some(CatalogConfig {
            base_url: url::Url::parse("http://127.0.0.1:9/").unwrap(),
            api_token: None,
            image_cache_ttl: Duration::from_secs(60),
            request_timeout: Duration::from_secs(1),
        });

        let state = AppState::new(config).unwrap();
        assert_eq!(state.inventory().subscriber_count(), 1);
        assert!(state.inventory().publish().is_clean());

        let plain = AppState::new(StateConfig::with_data_dir(&dir)).unwrap();
        assert_eq!(plain.inventory().subscriber_count(), 0);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
