//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//!
//! Authentication is enforced per handler by the [`RequireAuth`] and
//! [`RequireAdmin`] extractors rather than a layer.

pub mod auth;
pub mod request_id;

pub use auth::{RequireAdmin, RequireAuth};
pub use request_id::request_id_middleware;
