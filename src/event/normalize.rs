//! Report → canonical event normalization.
//!
//! # Responsibilities
//! - Summarize the report (message, culprit, tags) per format
//! - Build the `request` context from the report and the HTTP request
//! - Attach release/environment supplied with the request
//!
//! # Design Decisions
//! - No identity or time is assigned here; that belongs to the emitter
//! - Deterministic: the same report and context always yield the same event

use url::Url;

use crate::event::schema::{LogEntry, Request, SecurityEvent};
use crate::report::SecurityReport;

/// Request-level inputs that are not part of the report body.
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    /// Origin supplied out-of-band (header or query), not taken from the body.
    pub origin: Option<Url>,
    pub user_agent: Option<String>,
    pub release: Option<String>,
    pub environment: Option<String>,
}

pub fn normalize(report: SecurityReport, context: &EventContext) -> SecurityEvent {
    let (logger, message, culprit, tags, url, referrer) = match &report {
        SecurityReport::Csp(csp) => (
            "csp",
            csp.message(),
            csp.culprit(),
            csp.tags(),
            csp.document_uri.clone(),
            csp.referrer.clone().filter(|r| !r.is_empty()),
        ),
        SecurityReport::Hpkp(hpkp) => ("hpkp", hpkp.message(), None, hpkp.tags(), None, None),
        SecurityReport::ExpectCt(ct) => (
            "expect-ct",
            ct.message(),
            ct.culprit(),
            ct.tags(),
            None,
            None,
        ),
        SecurityReport::ExpectStaple(staple) => (
            "expect-staple",
            staple.message(),
            staple.culprit(),
            staple.tags(),
            None,
            None,
        ),
    };

    let mut headers = Vec::new();
    if let Some(origin) = &context.origin {
        headers.push(("Origin".to_string(), origin.to_string()));
    }
    if let Some(referrer) = referrer {
        headers.push(("Referer".to_string(), referrer));
    }
    if let Some(user_agent) = &context.user_agent {
        headers.push(("User-Agent".to_string(), user_agent.clone()));
    }

    SecurityEvent {
        ty: report.format(),
        logger,
        logentry: LogEntry { formatted: message },
        culprit,
        release: context.release.clone(),
        environment: context.environment.clone(),
        tags,
        request: Request { url, headers },
        report,
    }
}
