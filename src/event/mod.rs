//! Canonical security events.
//!
//! # Data Flow
//! ```text
//! SecurityReport + EventContext
//!     → normalize.rs (message, culprit, tags, request)
//!     → SecurityEvent (format-agnostic, no identity)
//!     → envelope::Emitter assigns id/time → EmittedEvent
//! ```

pub mod normalize;
pub mod schema;

pub use normalize::{normalize, EventContext};
pub use schema::{
    unix_timestamp, EmittedEvent, EventId, IngestHop, LogEntry, Request, SecurityEvent,
};
