//! Zero-payload publish/subscribe bus.
//!
//! Used for inventory-change signalling between components that share no
//! parent, and by the cart store to tell readers that its aggregates moved.
//!
//! # Delivery
//!
//! `publish()` takes a snapshot of the subscriber list and then invokes each
//! callback once, synchronously, in subscription order. Subscribing or
//! unsubscribing from inside a callback only affects later publishes. A
//! subscriber that returns an error or panics is logged and skipped; the
//! rest of the pass still runs.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use storefront_state::notify::NotificationBus;
//!
//! let bus = NotificationBus::new("inventory");
//! let refreshes = Arc::new(AtomicUsize::new(0));
//!
//! let counter = refreshes.clone();
//! let subscription = bus.subscribe(move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! bus.publish();
//! subscription.unsubscribe();
//! bus.publish();
//!
//! assert_eq!(refreshes.load(Ordering::SeqCst), 1);
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, warn};

/// Error a subscriber may return from its callback.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync>;

type Callback = Arc<dyn Fn() -> Result<(), SubscriberError> + Send + Sync>;

struct Registration {
    id: u64,
    callback: Callback,
}

struct BusInner {
    name: &'static str,
    subscribers: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
}

impl BusInner {
    fn subscribers(&self) -> MutexGuard<'_, Vec<Registration>> {
        // Callbacks never run under this lock, so a poisoned guard still
        // holds a consistent list.
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: u64) -> bool {
        let mut subscribers = self.subscribers();
        let before = subscribers.len();
        subscribers.retain(|registration| registration.id != id);
        subscribers.len() != before
    }
}

/// Outcome of a single publish pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers invoked in this pass.
    pub notified: usize,
    /// Subscribers that returned an error or panicked.
    pub failed: usize,
}

impl PublishReport {
    /// Whether every subscriber completed without error.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// A process-wide, zero-payload notification channel.
///
/// Cheaply cloneable; clones share the same subscriber list.
#[derive(Clone)]
pub struct NotificationBus {
    inner: Arc<BusInner>,
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("name", &self.inner.name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl NotificationBus {
    /// Create a bus. `name` only appears in logs.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: Arc::new(BusInner {
                name,
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register an infallible callback.
    ///
    /// Registering the same closure twice yields two independent
    /// registrations, each removed only by its own [`Subscription`].
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.try_subscribe(move || {
            callback();
            Ok(())
        })
    }

    /// Register a callback that may fail.
    ///
    /// Failures are logged by [`publish`](Self::publish) and never reach
    /// other subscribers.
    pub fn try_subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers().push(Registration {
            id,
            callback: Arc::new(callback),
        });
        debug!(bus = self.inner.name, subscription = id, "Subscribed");

        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every current subscriber once, in subscription order.
    pub fn publish(&self) -> PublishReport {
        let snapshot: Vec<(u64, Callback)> = self
            .inner
            .subscribers()
            .iter()
            .map(|registration| (registration.id, registration.callback.clone()))
            .collect();

        let mut report = PublishReport::default();
        for (id, callback) in snapshot {
            report.notified += 1;
            match panic::catch_unwind(AssertUnwindSafe(|| callback())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(
                        bus = self.inner.name,
                        subscription = id,
                        error = %e,
                        "Subscriber failed"
                    );
                }
                Err(payload) => {
                    report.failed += 1;
                    warn!(
                        bus = self.inner.name,
                        subscription = id,
                        panic = panic_message(payload.as_ref()),
                        "Subscriber panicked"
                    );
                }
            }
        }

        debug!(
            bus = self.inner.name,
            notified = report.notified,
            failed = report.failed,
            "Published"
        );
        report
    }

    /// Publish only if a backend write succeeded, passing its result through.
    ///
    /// Producers wrap their create/update/delete result with this so a
    /// failed write never triggers a refresh.
    pub fn publish_after<T, E>(&self, result: Result<T, E>) -> Result<T, E> {
        if result.is_ok() {
            self.publish();
        }
        result
    }

    /// Number of current registrations.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }

    /// Drop every registration. Outstanding handles become no-ops.
    pub fn clear(&self) {
        self.inner.subscribers().clear();
    }
}

/// Handle to one registration on a [`NotificationBus`].
///
/// Dropping the handle does not unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe) explicitly.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Remove exactly this registration.
    ///
    /// Returns `true` if it was still registered. Calling it again, or after
    /// the bus is gone, returns `false`.
    pub fn unsubscribe(&self) -> bool {
        let Some(bus) = self.bus.upgrade() else {
            return false;
        };
        let removed = bus.remove(self.id);
        if removed {
            debug!(bus = bus.name, subscription = self.id, "Unsubscribed");
        }
        removed
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn recorder() -> (
        Arc<Mutex<Vec<&'static str>>>,
        impl Fn(&'static str) -> Box<dyn Fn() + Send + Sync>,
    ) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |label: &'static str| -> Box<dyn Fn() + Send + Sync> {
            let sink = sink.clone();
            Box::new(move || sink.lock().unwrap().push(label))
        };
        (log, make)
    }

    #[test]
    fn test_publish_invokes_in_subscription_order() {
        let bus = NotificationBus::new("test");
        let (log, make) = recorder();

        let _a = bus.subscribe(make("a"));
        let b = bus.subscribe(make("b"));
        let _c = bus.subscribe(make("c"));

        let report = bus.publish();
        assert_eq!(report.notified, 3);
        assert!(report.is_clean());
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);

        assert!(b.unsubscribe());
        log.lock().unwrap().clear();

        bus.publish();
        assert_eq!(*log.lock().unwrap(), vec!["a", "c"]);
    }

    #[test]
    fn test_same_callback_registered_twice_counts_twice() {
        let bus = NotificationBus::new("test");
        let hits = Arc::new(AtomicUsize::new(0));
        let callback = {
            let hits = hits.clone();
            Arc::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };

        let first = {
            let callback = callback.clone();
            bus.subscribe(move || callback())
        };
        let _second = {
            let callback = callback.clone();
            bus.subscribe(move || callback())
        };

        bus.publish();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        // Removing one registration leaves the other in place
        assert!(first.unsubscribe());
        bus.publish();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = NotificationBus::new("test");
        let subscription = bus.subscribe(|| {});
        assert!(subscription.unsubscribe());
        assert!(!subscription.unsubscribe());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_after_bus_dropped() {
        let bus = NotificationBus::new("test");
        let subscription = bus.subscribe(|| {});
        drop(bus);
        assert!(!subscription.unsubscribe());
    }

    #[test]
    fn test_failing_subscriber_does_not_stop_pass() {
        let bus = NotificationBus::new("test");
        let (log, make) = recorder();

        let _a = bus.subscribe(make("a"));
        let _err = bus.try_subscribe(|| Err("backend unreachable".into()));
        let _panic = bus.subscribe(|| panic!("render failed"));
        let _d = bus.subscribe(make("d"));

        let report = bus.publish();
        assert_eq!(report.notified, 4);
        assert_eq!(report.failed, 2);
        assert!(!report.is_clean());
        assert_eq!(*log.lock().unwrap(), vec!["a", "d"]);
    }

    #[test]
    fn test_subscribe_during_publish_applies_to_next_pass() {
        let bus = NotificationBus::new("test");
        let late_hits = Arc::new(AtomicUsize::new(0));

        let inner_bus = bus.clone();
        let hits = late_hits.clone();
        let _subscription = bus.subscribe(move || {
            let hits = hits.clone();
            // Handle intentionally dropped; the registration stays
            let _ = inner_bus.subscribe(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        });

        let report = bus.publish();
        assert_eq!(report.notified, 1);
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);

        let report = bus.publish();
        assert_eq!(report.notified, 2);
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_during_publish_does_not_skip_scheduled() {
        let bus = NotificationBus::new("test");
        let (log, make) = recorder();

        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot = victim.clone();
        let _killer = bus.subscribe(move || {
            if let Some(subscription) = slot.lock().unwrap().as_ref() {
                subscription.unsubscribe();
            }
        });
        *victim.lock().unwrap() = Some(bus.subscribe(make("victim")));

        bus.publish();
        assert_eq!(*log.lock().unwrap(), vec!["victim"]);

        bus.publish();
        assert_eq!(*log.lock().unwrap(), vec!["victim"]);
    }

    #[test]
    fn test_publish_after_only_on_success() {
        let bus = NotificationBus::new("test");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let _subscription = bus.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let failed: Result<(), &str> = bus.publish_after(Err("500"));
        assert!(failed.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let saved: Result<u32, &str> = bus.publish_after(Ok(7));
        assert_eq!(saved, Ok(7));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_drains_subscribers() {
        let bus = NotificationBus::new("test");
        let subscription = bus.subscribe(|| {});
        let _other = bus.subscribe(|| {});
        bus.clear();

        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish().notified, 0);
        assert!(!subscription.unsubscribe());
    }
}
