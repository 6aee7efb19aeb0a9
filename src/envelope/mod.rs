//! Envelope emission subsystem.
//!
//! # Data Flow
//! ```text
//! SecurityEvent
//!     → emitter.rs (event_id, timestamp, ingest_path, serialize)
//!     → item.rs (Envelope with one `security` item)
//!     → transport.rs EnvelopeSink (bounded queue)
//!     → Forwarder task → upstream POST /api/{project_id}/envelope/
//! ```

pub mod emitter;
pub mod item;
pub mod transport;

pub use emitter::{EmitError, Emitter};
pub use item::{Envelope, EnvelopeItem, ItemHeaders, ItemType};
pub use transport::{EnvelopeSink, Forwarder, QueueSink, TransportError, ENVELOPE_CONTENT_TYPE};
