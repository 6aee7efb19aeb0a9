//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → cors.rs (preflight short-circuit, exposed headers)
//!     → body limit + timeout
//!     → request.rs (receipt time, relevant headers)
//!     → endpoint.rs (project, report, origin, emit)
//!     → response.rs (status + x-sentry-error on failure)
//! ```

pub mod cors;
pub mod endpoint;
pub mod request;
pub mod response;
pub mod server;

pub use cors::CorsPolicy;
pub use request::{RequestMeta, X_REQUEST_ID};
pub use response::{ApiError, X_SENTRY_ERROR};
pub use server::{AppState, HttpServer, RelayState};
