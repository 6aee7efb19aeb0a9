//! Canonical security event types.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::report::{ReportFormat, SecurityReport};

/// Globally unique event identifier, serialized as 32 lowercase hex chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub formatted: String,
}

/// The HTTP context of the report. `headers` keeps insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Request {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub headers: Vec<(String, String)>,
}

/// A normalized report, before an identity is assigned.
///
/// Exactly one format namespace is present because `report` is a closed enum
/// flattened into the event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityEvent {
    #[serde(rename = "type")]
    pub ty: ReportFormat,

    pub logger: &'static str,

    pub logentry: LogEntry,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub culprit: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<(String, String)>,

    pub request: Request,

    #[serde(flatten)]
    pub report: SecurityReport,
}

/// One relay a report passed through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestHop {
    pub version: String,
    pub node: String,
}

/// An event with its identity and timing fixed. Fields are set once, in
/// [`EmittedEvent::new`], and only exposed read-only.
#[derive(Debug, Clone, Serialize)]
pub struct EmittedEvent {
    event_id: EventId,
    timestamp: f64,
    received: f64,
    ingest_path: Vec<IngestHop>,
    #[serde(flatten)]
    event: SecurityEvent,
}

impl EmittedEvent {
    pub(crate) fn new(event: SecurityEvent, received: f64, hop: IngestHop) -> Self {
        Self {
            event_id: EventId::new(),
            timestamp: unix_timestamp(),
            received,
            ingest_path: vec![hop],
            event,
        }
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn received(&self) -> f64 {
        self.received
    }

    pub fn ingest_path(&self) -> &[IngestHop] {
        &self.ingest_path
    }

    pub fn event(&self) -> &SecurityEvent {
        &self.event
    }
}
