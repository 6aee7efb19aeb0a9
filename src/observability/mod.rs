//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all log lines via the trace span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use self::logging::init_logging;
pub use self::metrics::init_metrics;
