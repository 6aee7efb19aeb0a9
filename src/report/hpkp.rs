//! HTTP Public Key Pinning violation reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::report::format::ReportFormat;
use crate::report::{from_object, hostname_origin, lenient, require_hostname, unwrap_report, ReportError};

/// An HPKP pin validation failure. Reports are flat objects.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Hpkp {
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
        deserialize_with = "lenient::bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub include_subdomains: Option<bool>,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub noted_hostname: Option<String>,

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
        deserialize_with = "lenient::strings",
        skip_serializing_if = "Option::is_none"
    )]
    pub known_pins: Option<Vec<String>>,

    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl Hpkp {
    pub fn parse(body: &[u8]) -> Result<Self, ReportError> {
        const FORMAT: ReportFormat = ReportFormat::Hpkp;

        let hpkp: Hpkp = from_object(FORMAT, unwrap_report(FORMAT, body, None)?, &[])?;
        require_hostname(FORMAT, hpkp.hostname.as_deref())?;
        Ok(hpkp)
    }

    fn hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or_default()
    }

    pub fn message(&self) -> String {
        format!("Public key pinning validation failed for '{}'", self.hostname())
    }

    pub fn tags(&self) -> Vec<(String, String)> {
        let mut tags = vec![("hostname".to_string(), self.hostname().to_string())];
        if let Some(port) = self.port {
            tags.push(("port".to_string(), port.to_string()));
        }
        if let Some(include) = self.include_subdomains {
            tags.push(("include-subdomains".to_string(), include.to_string()));
        }
        tags
    }

    pub fn origin(&self) -> Option<Url> {
        hostname_origin(self.hostname())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flat_report() {
        let body = br#"{
            "date-time": "2014-04-06T13:00:50Z",
            "hostname": "www.example.com",
            "port": 443,
            "include-subdomains": false,
            "known-pins": ["pin-sha256=\"d6qzRu9zOECb90Uez27xWltNsj0e1Md7GkYYkVoZWmM=\""],
            "x-extra": 1
        }"#;
        let hpkp = Hpkp::parse(body).unwrap();
        assert_eq!(hpkp.port, Some(443));
        assert_eq!(hpkp.known_pins.as_ref().map(Vec::len), Some(1));
        assert!(hpkp.other.contains_key("x_extra"));
        assert_eq!(hpkp.message(), "Public key pinning validation failed for 'www.example.com'");
        assert_eq!(
            hpkp.tags(),
            vec![
                ("hostname".to_string(), "www.example.com".to_string()),
                ("port".to_string(), "443".to_string()),
                ("include-subdomains".to_string(), "false".to_string()),
            ]
        );
        assert_eq!(hpkp.origin().unwrap().host_str(), Some("www.example.com"));
    }

    #[test]
    fn test_hostname_is_required() {
        assert!(matches!(
            Hpkp::parse(br#"{"known-pins": []}"#),
            Err(ReportError::MissingField { field: "hostname", .. })
        ));
        assert!(matches!(Hpkp::parse(b"[]"), Err(ReportError::InvalidShape { .. })));
    }
}
