//! Origin resolution and allowed-domain enforcement.
//!
//! # Data Flow
//! ```text
//! Origin header | Referer header | ?origin= | report body
//!     → resolve() (first usable value wins)
//!     → validate() against the project's OriginPolicy
//!     → Allowed | Rejected
//! ```
//!
//! # Design Decisions
//! - A request with no resolvable origin is allowed
//! - An empty allow-list rejects every request that does carry an origin
//! - `null` and unparsable values are treated as absent

pub mod matcher;

use url::Url;

pub use matcher::OriginPattern;

use crate::report::SecurityReport;

/// Compiled allow-list for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginPolicy {
    patterns: Vec<OriginPattern>,
}

impl OriginPolicy {
    pub fn new<S: AsRef<str>>(allowed_domains: &[S]) -> Self {
        Self {
            patterns: allowed_domains
                .iter()
                .filter_map(|entry| OriginPattern::parse(entry.as_ref()))
                .collect(),
        }
    }

    pub fn allows(&self, origin: &Url) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(origin))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginDecision {
    Allowed,
    Rejected,
}

impl OriginDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, OriginDecision::Allowed)
    }
}

pub fn validate(origin: Option<&Url>, policy: &OriginPolicy) -> OriginDecision {
    match origin {
        None => OriginDecision::Allowed,
        Some(origin) if policy.allows(origin) => OriginDecision::Allowed,
        Some(_) => OriginDecision::Rejected,
    }
}

/// Parse a header or query value as an origin.
pub fn parse_origin(value: &str) -> Option<Url> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        return None;
    }
    Url::parse(value).ok().filter(|url| url.host_str().is_some())
}

/// Out-of-band origin candidates, in precedence order.
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginSources<'a> {
    pub origin_header: Option<&'a str>,
    pub referer_header: Option<&'a str>,
    pub query: Option<&'a str>,
}

impl OriginSources<'_> {
    /// The explicit origin sent alongside the report, ignoring the body.
    pub fn explicit(&self) -> Option<Url> {
        [self.origin_header, self.referer_header, self.query]
            .into_iter()
            .flatten()
            .find_map(parse_origin)
    }

    /// The origin a report is judged by: explicit first, then the body.
    pub fn resolve(&self, report: &SecurityReport) -> Option<Url> {
        self.explicit().or_else(|| report.origin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn csp(document_uri: &str) -> SecurityReport {
        let body = format!(r#"{{"csp-report": {{"document-uri": "{document_uri}", "violated-directive": "img-src"}}}}"#);
        SecurityReport::from_request(Some("application/csp-report"), body.as_bytes()).unwrap()
    }

    #[test]
    fn test_validate() {
        let policy = OriginPolicy::new(&["valid.com", "*.also-valid.com"]);
        assert_eq!(validate(Some(&url("http://valid.com")), &policy), OriginDecision::Allowed);
        assert_eq!(validate(Some(&url("https://x.also-valid.com")), &policy), OriginDecision::Allowed);
        assert_eq!(validate(Some(&url("http://invalid.com")), &policy), OriginDecision::Rejected);
        assert_eq!(validate(None, &policy), OriginDecision::Allowed);
    }

    #[test]
    fn test_empty_policy_rejects_any_origin() {
        let policy = OriginPolicy::new::<&str>(&[]);
        assert!(!validate(Some(&url("http://valid.com")), &policy).is_allowed());
        assert!(validate(None, &policy).is_allowed());
    }

    #[test]
    fn test_parse_origin_ignores_null_and_garbage() {
        assert_eq!(parse_origin("null"), None);
        assert_eq!(parse_origin(""), None);
        assert_eq!(parse_origin("not a url"), None);
        assert_eq!(parse_origin("http://valid.com"), Some(url("http://valid.com/")));
    }

    #[test]
    fn test_resolve_precedence() {
        let report = csp("http://body.com/page");

        let sources = OriginSources {
            origin_header: Some("http://header.com"),
            referer_header: Some("http://referer.com/a"),
            query: Some("http://query.com"),
        };
        assert_eq!(sources.resolve(&report), Some(url("http://header.com")));

        let sources = OriginSources {
            origin_header: Some("null"),
            referer_header: Some("http://referer.com/a"),
            query: Some("http://query.com"),
        };
        assert_eq!(sources.resolve(&report), Some(url("http://referer.com/a")));

        let sources = OriginSources {
            query: Some("http://query.com"),
            ..Default::default()
        };
        assert_eq!(sources.resolve(&report), Some(url("http://query.com")));

        assert_eq!(
            OriginSources::default().resolve(&report),
            Some(url("http://body.com/page"))
        );
    }
}
