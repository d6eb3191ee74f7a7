//! Core types for GreenCart.
//!
//! This module provides type-safe wrappers for common domain concepts and the
//! records exchanged between the server and its clients.

pub mod address;
pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;
pub mod user;
pub mod validation;

pub use address::{Address, NewAddress, ValidAddress};
pub use cart::{CartItems, CartRevision};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderDetails, OrderItem, OrderItemDetails, TAX_RATE, order_amount};
pub use price::{Price, PriceError};
pub use product::{NewProduct, Product, Rating};
pub use status::*;
pub use user::User;
pub use validation::ValidationError;
