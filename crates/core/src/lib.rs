//! Storefront State Core - Shared types library.
//!
//! This crate provides the types shared by the client state layer:
//! - `storefront` - Cart store, notification bus, navigation state, persistence
//! - `cli` - Command-line composition root driving the state layer
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Opaque IDs, cart items, quantities, prices, and dashboard sections

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
