//! Storefront client state layer.
//!
//! Keeps the shopping cart consistent across components and reloads, and
//! lets independently mounted components learn that inventory changed.
//!
//! # Modules
//!
//! - [`cart`] - Cart store with merge semantics, derived totals, persistence
//! - [`notify`] - Zero-payload publish/subscribe bus
//! - [`dashboard`] - Admin dashboard navigation state
//! - [`persistence`] - Durable key-value adapter and storage backends
//! - [`images`] - Product image lookup for cart enrichment
//! - [`state`] - Composition root owning the shared instances
//! - [`config`] / [`error`] - Environment configuration and error types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod images;
pub mod notify;
pub mod persistence;
pub mod state;

pub use cart::{CartStore, CartSummary};
pub use config::StateConfig;
pub use dashboard::NavigationState;
pub use error::{AppError, Result};
pub use notify::{NotificationBus, PublishReport, Subscription};
pub use persistence::Persistence;
pub use state::AppState;
