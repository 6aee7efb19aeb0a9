//! Format classification.
//!
//! # Responsibilities
//! - Pick the report format from the media type and the body's top-level keys
//! - Fail closed: anything unrecognized yields no format
//!
//! # Design Decisions
//! - `application/csp-report` is authoritative; the body is not inspected
//! - Wrapper keys win over flat-field sniffing
//! - A one-element array is read as its single report
//! - Pure function of its inputs

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::report::single_object;

/// The closed set of supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    Csp,
    Hpkp,
    ExpectCt,
    ExpectStaple,
}

impl ReportFormat {
    /// Stable lowercase name, also the event `type` and namespace key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Csp => "csp",
            ReportFormat::Hpkp => "hpkp",
            ReportFormat::ExpectCt => "expectct",
            ReportFormat::ExpectStaple => "expectstaple",
        }
    }
}

impl Serialize for ReportFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const CSP_MEDIA_TYPE: &str = "application/csp-report";
const EXPECT_CT_MEDIA_TYPE: &str = "application/expect-ct-report+json";

/// Returns the bare, lowercased media type of a `Content-Type` value.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Classify a report body. `None` means the format is not recognized.
pub fn classify(content_type: Option<&str>, body: &[u8]) -> Option<ReportFormat> {
    let media = content_type.map(media_type);
    if media.as_deref() == Some(CSP_MEDIA_TYPE) {
        return Some(ReportFormat::Csp);
    }

    let sniffed = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(single_object)
        .and_then(|object| sniff(&object));

    match sniffed {
        Some(format) => Some(format),
        None if media.as_deref() == Some(EXPECT_CT_MEDIA_TYPE) => Some(ReportFormat::ExpectCt),
        None => None,
    }
}

fn sniff(object: &Map<String, Value>) -> Option<ReportFormat> {
    if object.contains_key("csp-report") {
        return Some(ReportFormat::Csp);
    }
    if object.get("type").and_then(Value::as_str) == Some("csp-violation")
        && object.get("body").is_some_and(Value::is_object)
    {
        return Some(ReportFormat::Csp);
    }
    if object.contains_key("expect-ct-report") {
        return Some(ReportFormat::ExpectCt);
    }
    if object.contains_key("expect-staple-report") {
        return Some(ReportFormat::ExpectStaple);
    }
    if object.contains_key("known-pins") {
        return Some(ReportFormat::Hpkp);
    }
    if object.contains_key("scts") || object.contains_key("failure-mode") {
        return Some(ReportFormat::ExpectCt);
    }
    if ["ocsp-response", "response-status", "cert-status"]
        .iter()
        .any(|key| object.contains_key(*key))
    {
        return Some(ReportFormat::ExpectStaple);
    }
    None
}
