//! Business logic services.
//!
//! - `auth` - Password authentication and bearer tokens
//! - `catalog` - Cached product list
//! - `media` - Product image storage (Cloudinary or local disk)

pub mod auth;
pub mod catalog;
pub mod media;
