//! Content-Security-Policy violation reports.
//!
//! Accepts the classic `{"csp-report": {...}}` body (hyphenated keys) and the
//! Reporting API `{"type": "csp-violation", "body": {...}}` body (camelCase
//! keys). Both land in the same snake_case structure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::report::format::ReportFormat;
use crate::report::{from_object, lenient, parse_object, ReportError};

/// Reporting API spellings that do not snake_case onto a field name.
const RENAMES: &[(&str, &str)] = &[
    ("blocked_url", "blocked_uri"),
    ("document_url", "document_uri"),
    ("sample", "script_sample"),
];

/// A CSP violation, normalized to snake_case keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Csp {
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub effective_directive: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub blocked_uri: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub document_uri: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_policy: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub referrer: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub status_code: Option<u64>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub violated_directive: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_file: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub line_number: Option<u64>,

    #[serde(
        default,
        deserialize_with = "lenient::u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub column_number: Option<u64>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub script_sample: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub disposition: Option<String>,

    /// Fields browsers send that are not modeled above.
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl Csp {
    /// Parse a raw CSP report body.
    pub fn parse(body: &[u8]) -> Result<Self, ReportError> {
        const FORMAT: ReportFormat = ReportFormat::Csp;

        let mut object = parse_object(FORMAT, body)?;
        let inner = if let Some(inner) = object.remove("csp-report") {
            inner
        } else if object.get("type").and_then(Value::as_str) == Some("csp-violation") {
            object.remove("body").unwrap_or(Value::Null)
        } else {
            return Err(ReportError::InvalidShape {
                format: FORMAT,
                reason: "missing csp-report object".to_string(),
            });
        };

        let csp: Csp = from_object(FORMAT, inner, RENAMES)?;
        if csp.effective_directive().is_none() {
            return Err(ReportError::MissingField {
                format: FORMAT,
                field: "violated-directive",
            });
        }
        Ok(csp)
    }

    /// The directive that was enforced. Older browsers only send
    /// `violated-directive`, whose first token names the directive.
    pub fn effective_directive(&self) -> Option<&str> {
        self.effective_directive
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .or_else(|| {
                self.violated_directive
                    .as_deref()
                    .and_then(|v| v.split_whitespace().next())
            })
    }

    /// `blocked_uri` reduced to what is useful for grouping.
    pub fn normalized_blocked_uri(&self) -> String {
        normalize_blocked_uri(self.blocked_uri.as_deref().unwrap_or_default())
    }

    pub fn message(&self) -> String {
        let kind = blocked_kind(self.effective_directive().unwrap_or_default());
        let blocked = self.normalized_blocked_uri();
        match blocked.as_str() {
            "eval" | "wasm-eval" => format!("Blocked unsafe eval() '{kind}'"),
            "inline" | "'self'" if kind == "script" => "Blocked unsafe inline 'script'".to_string(),
            "inline" | "'self'" => format!("Blocked inline '{kind}'"),
            uri => format!("Blocked '{kind}' from '{uri}'"),
        }
    }

    pub fn culprit(&self) -> Option<String> {
        self.violated_directive
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| self.effective_directive())
            .map(str::to_string)
    }

    pub fn tags(&self) -> Vec<(String, String)> {
        let mut tags = Vec::new();
        if let Some(directive) = self.effective_directive() {
            tags.push(("effective-directive".to_string(), directive.to_string()));
        }
        if self.blocked_uri.is_some() {
            tags.push(("blocked-uri".to_string(), self.normalized_blocked_uri()));
        }
        tags
    }

    /// The page that triggered the report.
    pub fn origin(&self) -> Option<Url> {
        self.document_uri
            .as_deref()
            .and_then(|uri| Url::parse(uri).ok())
            .filter(|url| url.host_str().is_some())
    }
}

/// Keywords Chrome reports instead of a URI.
const BLOCKED_KEYWORDS: &[&str] = &[
    "inline",
    "eval",
    "wasm-eval",
    "trusted-types-policy",
    "trusted-types-sink",
];

pub fn normalize_blocked_uri(raw: &str) -> String {
    let raw = raw.trim();
    if matches!(raw, "" | "self" | "'self'") {
        return "'self'".to_string();
    }
    if BLOCKED_KEYWORDS.contains(&raw) {
        return raw.to_string();
    }
    // Firefox reports bare schemes such as `data` or `blob`.
    if !raw.contains(':') {
        return format!("{raw}:");
    }
    match Url::parse(raw) {
        Ok(url) => match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => format!("{}:", url.scheme()),
        },
        Err(_) => raw.to_string(),
    }
}

/// Human name of what a directive guards, as used in messages.
fn blocked_kind(directive: &str) -> String {
    let directive = directive.to_ascii_lowercase();
    let kind = match directive.as_str() {
        "child-src" => "child",
        "connect-src" => "connect",
        "font-src" => "font",
        "form-action" => "form",
        "frame-src" => "frame",
        "img-src" => "image",
        "manifest-src" => "manifest",
        "media-src" => "media",
        "object-src" => "object",
        "script-src" | "script-src-elem" | "script-src-attr" => "script",
        "style-src" | "style-src-elem" | "style-src-attr" => "style",
        "worker-src" => "worker",
        other => other,
    };
    kind.to_string()
}
