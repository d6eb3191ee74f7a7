//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (recorded on the trace span)
//! 4. Security headers
//! 5. CORS
//! 6. Session layer (tower-sessions)
//! 7. Rate limiting on login and registration (governor), with 429s
//!    rewritten as failure envelopes

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    RequireSeller, RequireUser, clear_current_seller, clear_current_user, set_current_seller,
    set_current_user,
};
pub use cors::cors_layer;
pub use rate_limit::{auth_rate_limiter, rate_limited_envelope};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
