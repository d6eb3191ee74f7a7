//! Request-scoped models.

pub mod session;

pub use session::{CurrentSeller, CurrentUser, keys as session_keys};
