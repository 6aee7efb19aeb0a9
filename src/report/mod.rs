//! Security report parsing subsystem.
//!
//! # Data Flow
//! ```text
//! Content-Type + raw body
//!     → format.rs (classify: csp / hpkp / expectct / expectstaple / none)
//!     → csp.rs | hpkp.rs | expect_ct.rs | expect_staple.rs (parse)
//!     → SecurityReport (closed enum, one variant per format)
//! ```
//!
//! # Design Decisions
//! - The format set is closed; unknown bodies fail instead of passing through
//! - Parsers are pure functions of the body and never see project config
//! - Optional fields stay `None` and are omitted on output
//! - Keys are snake_cased once, before deserializing, so browser spellings
//!   never collide with modeled fields
//! - Unmodeled fields are kept so browser additions survive

pub mod csp;
pub mod error;
pub mod expect_ct;
pub mod expect_staple;
pub mod format;
pub mod hpkp;
pub mod lenient;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

pub use csp::Csp;
pub use error::ReportError;
pub use expect_ct::{ExpectCt, SingleCertificateTimestamp};
pub use expect_staple::ExpectStaple;
pub use format::{classify, ReportFormat};
pub use hpkp::Hpkp;

/// A parsed report. Serializes as `{"<namespace>": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SecurityReport {
    #[serde(rename = "csp")]
    Csp(Csp),
    #[serde(rename = "hpkp")]
    Hpkp(Hpkp),
    #[serde(rename = "expectct")]
    ExpectCt(ExpectCt),
    #[serde(rename = "expectstaple")]
    ExpectStaple(ExpectStaple),
}

impl SecurityReport {
    /// Classify and parse a request body.
    pub fn from_request(content_type: Option<&str>, body: &[u8]) -> Result<Self, ReportError> {
        let format = classify(content_type, body).ok_or(ReportError::UnrecognizedFormat)?;
        Self::parse(format, body)
    }

    /// Parse a body already known to be of `format`.
    pub fn parse(format: ReportFormat, body: &[u8]) -> Result<Self, ReportError> {
        Ok(match format {
            ReportFormat::Csp => SecurityReport::Csp(Csp::parse(body)?),
            ReportFormat::Hpkp => SecurityReport::Hpkp(Hpkp::parse(body)?),
            ReportFormat::ExpectCt => SecurityReport::ExpectCt(ExpectCt::parse(body)?),
            ReportFormat::ExpectStaple => SecurityReport::ExpectStaple(ExpectStaple::parse(body)?),
        })
    }

    pub fn format(&self) -> ReportFormat {
        match self {
            SecurityReport::Csp(_) => ReportFormat::Csp,
            SecurityReport::Hpkp(_) => ReportFormat::Hpkp,
            SecurityReport::ExpectCt(_) => ReportFormat::ExpectCt,
            SecurityReport::ExpectStaple(_) => ReportFormat::ExpectStaple,
        }
    }

    /// Origin claimed by the report body itself, if the format carries one.
    pub fn origin(&self) -> Option<Url> {
        match self {
            SecurityReport::Csp(r) => r.origin(),
            SecurityReport::Hpkp(r) => r.origin(),
            SecurityReport::ExpectCt(r) => r.origin(),
            SecurityReport::ExpectStaple(r) => r.origin(),
        }
    }
}

/// A lone JSON object, or the only element of a one-report batch as sent
/// by the Reporting API.
pub(crate) fn single_object(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(object) => Some(object),
        Value::Array(mut items) if items.len() == 1 => match items.pop() {
            Some(Value::Object(object)) => Some(object),
            _ => None,
        },
        _ => None,
    }
}

/// Parse the body as a JSON object.
pub(crate) fn parse_object(format: ReportFormat, body: &[u8]) -> Result<Map<String, Value>, ReportError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|source| ReportError::InvalidJson { format, source })?;
    single_object(value).ok_or_else(|| ReportError::InvalidShape {
        format,
        reason: "expected a JSON object".to_string(),
    })
}

/// Take the object under `wrapper` when present, else the body itself.
pub(crate) fn unwrap_report(
    format: ReportFormat,
    body: &[u8],
    wrapper: Option<&str>,
) -> Result<Value, ReportError> {
    let mut object = parse_object(format, body)?;
    Ok(match wrapper.and_then(|key| object.remove(key)) {
        Some(inner) => inner,
        None => Value::Object(object),
    })
}

/// Deserialize a report object after normalizing its keys.
pub(crate) fn from_object<T: DeserializeOwned>(
    format: ReportFormat,
    value: Value,
    renames: &[(&str, &str)],
) -> Result<T, ReportError> {
    let Value::Object(object) = value else {
        return Err(ReportError::InvalidShape {
            format,
            reason: "report is not a JSON object".to_string(),
        });
    };
    let object = lenient::normalize_keys(object, renames);
    serde_json::from_value(Value::Object(object)).map_err(|e| ReportError::InvalidShape {
        format,
        reason: e.to_string(),
    })
}

pub(crate) fn require_hostname(format: ReportFormat, hostname: Option<&str>) -> Result<(), ReportError> {
    match hostname {
        Some(h) if !h.trim().is_empty() => Ok(()),
        _ => Err(ReportError::MissingField {
            format,
            field: "hostname",
        }),
    }
}

/// Certificate reports name a host, not a URL.
pub(crate) fn hostname_origin(hostname: &str) -> Option<Url> {
    Url::parse(&format!("https://{}", hostname.trim())).ok()
}
