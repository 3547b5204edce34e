//! Core types for the storefront state layer.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart_item;
pub mod id;
pub mod price;
pub mod quantity;
pub mod section;

pub use cart_item::CartItem;
pub use id::*;
pub use price::format_price;
pub use quantity::{QuantityError, parse_quantity};
pub use section::DashboardSection;
