//! Cart store: the shopping-cart line items and their derived totals.
//!
//! # Semantics
//!
//! - Items are keyed by product ID and kept in insertion order.
//! - Adding an ID that is already present adds to its quantity; the stored
//!   name, price, image and classification are kept (first write wins).
//! - `update_quantity` with zero or a negative value removes the line.
//! - Totals are computed from the current items on every read.
//! - Every mutation writes the full item list to persistence under the same
//!   lock that guards the mutation, then notifies subscribers.
//!
//! # Image enrichment
//!
//! An item added without an image gets one looked up in the background. The
//! line is committed immediately; the looked-up image is attached later only
//! if the line is still present and still has no image. A line removed while
//! the lookup is in flight stays removed.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use storefront_state_core::{CartItem, ProductId, format_price};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::add_breadcrumb;
use crate::images::ImageLookup;
use crate::notify::{NotificationBus, Subscription};
use crate::persistence::{Persistence, keys};

/// Point-in-time view of the cart with its derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub total_items: u64,
    pub total_price: Decimal,
}

impl CartSummary {
    /// Derive totals from a list of items.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        Self {
            total_items: total_items(&items),
            total_price: total_price(&items),
            items,
        }
    }

    /// Total price formatted for display.
    #[must_use]
    pub fn formatted_total(&self) -> String {
        format_price(self.total_price)
    }
}

/// Sum of quantities.
#[must_use]
pub fn total_items(items: &[CartItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity)).sum()
}

/// Sum of `unit_price × quantity`, saturating at [`Decimal::MAX`].
///
/// A cart held by [`CartStore`] never reaches the bound.
#[must_use]
pub fn total_price(items: &[CartItem]) -> Decimal {
    items
        .iter()
        .map(CartItem::line_total)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// The shopping cart.
///
/// Cheaply cloneable via `Arc`; clones share the same items.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    items: Mutex<Vec<CartItem>>,
    persistence: Persistence,
    images: Arc<dyn ImageLookup>,
    changes: NotificationBus,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &*self.lock())
            .finish_non_exhaustive()
    }
}

enum Enrichment {
    Committed,
    AlreadyHasImage,
    Removed,
}

impl CartStore {
    /// Create a store, rehydrating items from persistence.
    ///
    /// A missing or corrupt persisted cart yields an empty cart. Persisted
    /// lines that break the cart invariants (zero quantity, negative price,
    /// repeated ID, a total past what [`Decimal`] can hold) are dropped and
    /// the cleaned list is written back.
    #[must_use]
    pub fn load(persistence: Persistence, images: Arc<dyn ImageLookup>) -> Self {
        let stored: Vec<CartItem> = persistence.load(keys::CART).unwrap_or_default();
        let stored_len = stored.len();
        let items = sanitize(stored);

        if items.len() != stored_len {
            warn!(
                dropped = stored_len - items.len(),
                "Dropped invalid persisted cart lines"
            );
            persistence.save(keys::CART, &items);
        }
        info!(lines = items.len(), "Cart rehydrated");

        Self {
            inner: Arc::new(CartStoreInner {
                items: Mutex::new(items),
                persistence,
                images,
                changes: NotificationBus::new("cart"),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CartItem>> {
        // Mutations never panic halfway through, so the list stays valid
        self.inner
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the full item list back. Called with the lock held.
    fn persist(&self, items: &[CartItem]) {
        self.inner.persistence.save(keys::CART, items);
    }

    fn notify(&self) {
        self.inner.changes.publish();
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current items, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.lock().clone()
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<CartItem> {
        self.lock().iter().find(|item| &item.id == id).cloned()
    }

    /// Whether `id` has a line in the cart.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.lock().iter().any(|item| &item.id == id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        total_items(&self.lock())
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        total_price(&self.lock())
    }

    /// Items and totals read under a single lock.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::from_items(self.items())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add an item, merging quantities with an existing line of the same ID.
    ///
    /// Returns the handle of the background image lookup when one was
    /// started: the item had no image, the stored line has none either, and
    /// a Tokio runtime is available. Awaiting the handle is optional.
    ///
    /// Items with a zero quantity or a negative price are ignored, as is an
    /// add that would push the cart total past what [`Decimal`] can hold.
    #[instrument(skip(self, item), fields(product_id = %item.id, quantity = item.quantity))]
    pub fn add_item(&self, item: CartItem) -> Option<JoinHandle<()>> {
        if item.quantity == 0 {
            warn!("Ignoring cart add with zero quantity");
            return None;
        }
        if !item.has_valid_price() {
            warn!(unit_price = %item.unit_price, "Ignoring cart add with negative price");
            return None;
        }

        let id = item.id.clone();
        let incoming_has_image = item.has_image();
        let needs_image = {
            let mut items = self.lock();
            let line = match items.iter().find(|existing| existing.id == id) {
                Some(existing) => {
                    let mut merged = existing.clone();
                    merged.quantity = merged.quantity.saturating_add(item.quantity);
                    merged
                }
                None => item,
            };
            if checked_total_with(&items, &line).is_none() {
                warn!("Ignoring cart add that would overflow the cart total");
                return None;
            }

            let needs_image = !line.has_image() && !incoming_has_image;
            if let Some(existing) = items.iter_mut().find(|existing| existing.id == id) {
                *existing = line;
                debug!(quantity = existing.quantity, "Merged into existing line");
            } else {
                items.push(line);
                debug!("Appended new line");
            }
            self.persist(&items);
            needs_image
        };

        add_breadcrumb("cart", "Added item", Some(&[("product_id", id.as_str())]));
        self.notify();

        if !needs_image {
            return None;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime available, skipping image lookup");
            return None;
        };

        let store = self.clone();
        Some(runtime.spawn(async move { store.enrich(id).await }))
    }

    /// Look up an image for `id` and attach it if the line still wants one.
    async fn enrich(&self, id: ProductId) {
        let image = match self.inner.images.lookup(&id).await {
            Ok(Some(image)) => image,
            Ok(None) => {
                debug!(product_id = %id, "No image found for cart item");
                return;
            }
            Err(e) => {
                warn!(
                    product_id = %id,
                    error = %e,
                    "Image lookup failed, keeping item without image"
                );
                return;
            }
        };

        let outcome = {
            let mut items = self.lock();
            let outcome = match items.iter_mut().find(|item| item.id == id) {
                Some(item) if item.image.is_none() => {
                    item.image = Some(image);
                    Enrichment::Committed
                }
                Some(_) => Enrichment::AlreadyHasImage,
                None => Enrichment::Removed,
            };
            if matches!(outcome, Enrichment::Committed) {
                self.persist(&items);
            }
            outcome
        };

        match outcome {
            Enrichment::Committed => {
                debug!(product_id = %id, "Attached image to cart item");
                self.notify();
            }
            Enrichment::AlreadyHasImage => {
                debug!(product_id = %id, "Cart item already has an image, discarding lookup");
            }
            Enrichment::Removed => {
                debug!(product_id = %id, "Cart item removed before image resolved, discarding");
            }
        }
    }

    /// Remove the line for `id`. Returns whether a line was removed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn remove_item(&self, id: &ProductId) -> bool {
        let removed = {
            let mut items = self.lock();
            let before = items.len();
            items.retain(|item| &item.id != id);
            let removed = items.len() != before;
            if removed {
                self.persist(&items);
            }
            removed
        };

        if removed {
            add_breadcrumb("cart", "Removed item", Some(&[("product_id", id.as_str())]));
            self.notify();
        } else {
            debug!("Remove of absent cart line ignored");
        }
        removed
    }

    /// Set the quantity of the line for `id` exactly.
    ///
    /// Zero or negative quantities remove the line. Returns whether the cart
    /// changed; an absent `id` is a no-op, and so is a quantity that would
    /// push the cart total past what [`Decimal`] can hold.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn update_quantity(&self, id: &ProductId, quantity: i64) -> bool {
        let Ok(quantity) = u32::try_from(quantity) else {
            if quantity <= 0 {
                return self.remove_item(id);
            }
            warn!(quantity, "Quantity exceeds supported range, clamping");
            return self.update_quantity(id, i64::from(u32::MAX));
        };
        if quantity == 0 {
            return self.remove_item(id);
        }

        let updated = {
            let mut items = self.lock();
            let candidate = items
                .iter()
                .find(|item| &item.id == id && item.quantity != quantity)
                .map(|item| {
                    let mut line = item.clone();
                    line.quantity = quantity;
                    line
                });
            let updated = match candidate {
                Some(line) if checked_total_with(&items, &line).is_some() => {
                    if let Some(item) = items.iter_mut().find(|item| &item.id == id) {
                        item.quantity = quantity;
                    }
                    true
                }
                Some(_) => {
                    warn!(quantity, "Ignoring quantity update that would overflow the cart total");
                    false
                }
                None => false,
            };
            if updated {
                self.persist(&items);
            }
            updated
        };

        if updated {
            self.notify();
        }
        updated
    }

    /// Remove every line.
    #[instrument(skip(self))]
    pub fn clear(&self) {
        {
            let mut items = self.lock();
            items.clear();
            self.persist(&items);
        }
        add_breadcrumb("cart", "Cleared cart", None);
        info!("Cart cleared");
        self.notify();
    }

    // =========================================================================
    // Change notification
    // =========================================================================

    /// Get notified after every change to the cart.
    ///
    /// Dropping the returned [`Subscription`] does not unsubscribe. A
    /// callback that captures a clone of this store keeps the store alive
    /// until [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.changes.subscribe(callback)
    }
}

/// Cart total with `line` in place of the line sharing its ID.
///
/// `None` when the total is not representable.
fn checked_total_with(items: &[CartItem], line: &CartItem) -> Option<Decimal> {
    items
        .iter()
        .filter(|item| item.id != line.id)
        .try_fold(line.checked_line_total()?, |total, item| {
            total.checked_add(item.checked_line_total()?)
        })
}

/// Drop lines with zero quantity, a negative price or a repeated ID (first
/// occurrence wins), and lines that would overflow the running total.
fn sanitize(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut seen = HashSet::new();
    let mut total = Decimal::ZERO;
    items
        .into_iter()
        .filter(|item| {
            if item.quantity == 0 || !item.has_valid_price() || seen.contains(&item.id) {
                return false;
            }
            let Some(next) = item
                .checked_line_total()
                .and_then(|line| total.checked_add(line))
            else {
                return false;
            };
            seen.insert(item.id.clone());
            total = next;
            true
        })
        .collect()
}
