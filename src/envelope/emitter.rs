//! Event emission.
//!
//! # Responsibilities
//! - Assign `event_id`, `timestamp` and `ingest_path` to a normalized event
//! - Serialize it into a `security` envelope item
//! - Hand exactly one envelope per call to the sink
//!
//! # Design Decisions
//! - No retry and no buffering here; the sink owns delivery
//! - Receipt time comes from the HTTP layer so queueing delay is not hidden

use std::sync::Arc;

use thiserror::Error;

use crate::envelope::item::{Envelope, EnvelopeItem, ItemType};
use crate::envelope::transport::EnvelopeSink;
use crate::event::{EmittedEvent, EventId, IngestHop, SecurityEvent};

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("envelope queue is full")]
    QueueFull,

    #[error("envelope queue is closed")]
    QueueClosed,
}

impl EmitError {
    pub fn kind(&self) -> &'static str {
        match self {
            EmitError::Serialize(_) => "serialize",
            EmitError::QueueFull => "queue_full",
            EmitError::QueueClosed => "queue_closed",
        }
    }
}

#[derive(Clone)]
pub struct Emitter {
    sink: Arc<dyn EnvelopeSink>,
    hop: IngestHop,
}

impl Emitter {
    pub fn new(sink: Arc<dyn EnvelopeSink>, node_name: impl Into<String>) -> Self {
        Self {
            sink,
            hop: IngestHop {
                version: env!("CARGO_PKG_VERSION").to_string(),
                node: node_name.into(),
            },
        }
    }

    /// Fix the event's identity and serialize it as an envelope item.
    pub fn envelope_item(
        &self,
        event: SecurityEvent,
        received: f64,
    ) -> Result<(EventId, EnvelopeItem), EmitError> {
        let emitted = EmittedEvent::new(event, received, self.hop.clone());
        let payload = serde_json::to_vec(&emitted)?;
        Ok((emitted.event_id(), EnvelopeItem::new(ItemType::Security, payload)))
    }

    pub fn emit(
        &self,
        event: SecurityEvent,
        project_id: u64,
        received: f64,
    ) -> Result<EventId, EmitError> {
        let (event_id, item) = self.envelope_item(event, received)?;
        let mut envelope = Envelope::new(event_id, project_id);
        envelope.add_item(item);
        self.sink.submit(envelope)?;

        tracing::debug!(event_id = %event_id, project_id, "Security event emitted");
        Ok(event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::transport::QueueSink;
    use crate::event::{normalize, EventContext};
    use crate::report::SecurityReport;

    fn event() -> SecurityEvent {
        let report = SecurityReport::from_request(
            Some("application/json"),
            br#"{"expect-ct-report": {"hostname": "www.example.com", "port": 443}}"#,
        )
        .unwrap();
        normalize(report, &EventContext::default())
    }

    #[test]
    fn test_envelope_item_assigns_identity() {
        let (sink, _rx) = QueueSink::new(4);
        let emitter = Emitter::new(Arc::new(sink), "node-1");

        let (event_id, item) = emitter.envelope_item(event(), 1_000.5).unwrap();
        assert_eq!(item.ty(), ItemType::Security);
        assert_eq!(item.headers().length, item.payload().len());

        let value: serde_json::Value = serde_json::from_slice(item.payload()).unwrap();
        assert_eq!(value["event_id"], event_id.to_string());
        assert_eq!(value["received"], 1_000.5);
        assert!(value["timestamp"].as_f64().unwrap() > 0.0);
        assert_eq!(value["ingest_path"][0]["node"], "node-1");
        assert_eq!(value["type"], "expectct");
    }

    #[test]
    fn test_emit_sends_one_envelope() {
        let (sink, mut rx) = QueueSink::new(4);
        let emitter = Emitter::new(Arc::new(sink), "node-1");

        let event_id = emitter.emit(event(), 42, 1.0).unwrap();
        let envelope = rx.try_recv().unwrap();
        assert_eq!(envelope.event_id(), event_id);
        assert_eq!(envelope.project_id(), 42);
        assert_eq!(envelope.items().len(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_emit_reports_full_queue() {
        let (sink, _rx) = QueueSink::new(1);
        let emitter = Emitter::new(Arc::new(sink), "node-1");

        emitter.emit(event(), 42, 1.0).unwrap();
        let err = emitter.emit(event(), 42, 1.0).unwrap_err();
        assert!(matches!(err, EmitError::QueueFull));
    }
}
