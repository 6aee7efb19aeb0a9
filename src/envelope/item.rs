//! Envelope wire format.
//!
//! An envelope is newline-delimited: one JSON header line, then for each
//! item a JSON item-header line followed by the raw payload.
//!
//! ```text
//! {"event_id":"9ec79c33ec9942ab8353589fcb2e04dc"}
//! {"type":"security","length":412}
//! {...event JSON...}
//! ```

use serde::Serialize;

use crate::event::EventId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Security,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemHeaders {
    #[serde(rename = "type")]
    pub ty: ItemType,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeItem {
    headers: ItemHeaders,
    payload: Vec<u8>,
}

impl EnvelopeItem {
    pub fn new(ty: ItemType, payload: Vec<u8>) -> Self {
        Self {
            headers: ItemHeaders {
                ty,
                length: payload.len(),
            },
            payload,
        }
    }

    pub fn ty(&self) -> ItemType {
        self.headers.ty
    }

    pub fn headers(&self) -> &ItemHeaders {
        &self.headers
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

#[derive(Serialize)]
struct EnvelopeHeaders {
    event_id: EventId,
}

/// A unit of delivery to the downstream pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    event_id: EventId,
    project_id: u64,
    items: Vec<EnvelopeItem>,
}

impl Envelope {
    pub fn new(event_id: EventId, project_id: u64) -> Self {
        Self {
            event_id,
            project_id,
            items: Vec::new(),
        }
    }

    pub fn add_item(&mut self, item: EnvelopeItem) {
        self.items.push(item);
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn project_id(&self) -> u64 {
        self.project_id
    }

    pub fn items(&self) -> &[EnvelopeItem] {
        &self.items
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = serde_json::to_vec(&EnvelopeHeaders {
            event_id: self.event_id,
        })?;
        out.push(b'\n');
        for item in &self.items {
            serde_json::to_writer(&mut out, &item.headers)?;
            out.push(b'\n');
            out.extend_from_slice(&item.payload);
            out.push(b'\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let event_id = EventId::new();
        let mut envelope = Envelope::new(event_id, 42);
        envelope.add_item(EnvelopeItem::new(ItemType::Security, br#"{"a":1}"#.to_vec()));

        let bytes = envelope.to_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], format!(r#"{{"event_id":"{event_id}"}}"#));
        assert_eq!(lines[1], r#"{"type":"security","length":7}"#);
        assert_eq!(lines[2], r#"{"a":1}"#);
        assert_eq!(lines.len(), 3);
    }
}
