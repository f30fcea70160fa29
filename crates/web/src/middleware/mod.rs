//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. `TraceLayer` (one span per request)
//! 3. Request ID (recorded on that span)
//! 4. Response headers (security headers, cache policy)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)

pub mod auth;
pub mod headers;
pub mod request_id;
pub mod session;

pub use auth::{
    AdminRejection, OptionalUser, RequireAdmin, clear_current_user, set_current_user,
    viewer_is_admin,
};
pub use headers::response_headers_middleware;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
