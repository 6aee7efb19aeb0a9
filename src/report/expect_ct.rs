//! Expect-CT (Certificate Transparency) failure reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

use crate::report::format::ReportFormat;
use crate::report::{from_object, hostname_origin, lenient, require_hostname, unwrap_report, ReportError};

/// One signed certificate timestamp from the report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SingleCertificateTimestamp {
    #[serde(
        default,
        deserialize_with = "lenient::i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<i64>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub serialized_sct: Option<String>,

    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

/// An Expect-CT failure, from `{"expect-ct-report": {...}}` or a flat body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpectCt {
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_time: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub hostname: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub port: Option<u64>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheme: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub effective_expiration_date: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::strings",
        skip_serializing_if = "Option::is_none"
    )]
    pub served_certificate_chain: Option<Vec<String>>,

    #[serde(
        default,
        deserialize_with = "lenient::strings",
        skip_serializing_if = "Option::is_none"
    )]
    pub validated_certificate_chain: Option<Vec<String>>,

    #[serde(
        default,
        deserialize_with = "scts",
        skip_serializing_if = "Option::is_none"
    )]
    pub scts: Option<Vec<SingleCertificateTimestamp>>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub failure_mode: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub test_report: Option<bool>,

    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

fn scts<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<Vec<SingleCertificateTimestamp>>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(object) => Some(lenient::normalize_keys(object, &[])),
                    _ => None,
                })
                .filter_map(|object| {
                    serde_json::from_value::<SingleCertificateTimestamp>(Value::Object(object)).ok()
                })
                .collect(),
        ),
        _ => None,
    })
}

impl ExpectCt {
    pub fn parse(body: &[u8]) -> Result<Self, ReportError> {
        const FORMAT: ReportFormat = ReportFormat::ExpectCt;

        let inner = unwrap_report(FORMAT, body, Some("expect-ct-report"))?;
        let report: ExpectCt = from_object(FORMAT, inner, &[])?;
        require_hostname(FORMAT, report.hostname.as_deref())?;
        Ok(report)
    }

    fn hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or_default()
    }

    pub fn message(&self) -> String {
        format!("Expect-CT failed for '{}'", self.hostname())
    }

    pub fn culprit(&self) -> Option<String> {
        Some(self.hostname().to_string())
    }

    pub fn tags(&self) -> Vec<(String, String)> {
        let mut tags = vec![("hostname".to_string(), self.hostname().to_string())];
        if let Some(port) = self.port {
            tags.push(("port".to_string(), port.to_string()));
        }
        tags
    }

    pub fn origin(&self) -> Option<Url> {
        hostname_origin(self.hostname())
    }
}
