//! GreenCart Core - Shared types library.
//!
//! This crate provides common types used across all GreenCart components:
//! - `server` - The JSON API
//! - `client` - The client state context consuming the API
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers and domain records (ids, prices, products, carts, orders)
//! - [`envelope`] - The `{ success, message, ...payload }` response shape
//! - [`catalog`] - Listing and product-detail views over an in-memory catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod envelope;
pub mod types;

pub use envelope::Envelope;
pub use types::*;
