//! Expect-Staple (OCSP stapling) failure reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::report::format::ReportFormat;
use crate::report::{from_object, hostname_origin, lenient, require_hostname, unwrap_report, ReportError};

/// An Expect-Staple failure, from `{"expect-staple-report": {...}}` or a flat body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpectStaple {
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
    pub effective_expiration_date: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub response_status: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub ocsp_response: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub cert_status: Option<String>,

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

    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl ExpectStaple {
    pub fn parse(body: &[u8]) -> Result<Self, ReportError> {
        const FORMAT: ReportFormat = ReportFormat::ExpectStaple;

        let inner = unwrap_report(FORMAT, body, Some("expect-staple-report"))?;
        let report: ExpectStaple = from_object(FORMAT, inner, &[])?;
        require_hostname(FORMAT, report.hostname.as_deref())?;
        Ok(report)
    }

    fn hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or_default()
    }

    pub fn message(&self) -> String {
        format!("Expect-Staple failed for '{}'", self.hostname())
    }

    pub fn culprit(&self) -> Option<String> {
        Some(self.hostname().to_string())
    }

    pub fn tags(&self) -> Vec<(String, String)> {
        let mut tags = vec![("hostname".to_string(), self.hostname().to_string())];
        if let Some(port) = self.port {
            tags.push(("port".to_string(), port.to_string()));
        }
        if let Some(status) = &self.response_status {
            tags.push(("response-status".to_string(), status.clone()));
        }
        if let Some(status) = &self.cert_status {
            tags.push(("cert-status".to_string(), status.clone()));
        }
        tags
    }

    pub fn origin(&self) -> Option<Url> {
        hostname_origin(self.hostname())
    }
}
