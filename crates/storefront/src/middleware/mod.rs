//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with `request_id` field)
//! 3. Request ID (record id on the span, echo in response)
//! 4. Security headers
//! 5. CORS
//! 6. Rate limiting on `/api/auth/*` (governor)
//!
//! Authentication is not a layer: handlers opt in with the
//! [`RequireAuth`] / [`RequireCustomer`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{RequireAuth, RequireCustomer};
pub use rate_limit::{auth_rate_limiter, rate_limit_response_middleware};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
