//! Request metadata extraction.
//!
//! # Responsibilities
//! - Capture receipt time before the body is parsed
//! - Pull the headers the security endpoint cares about
//!
//! # Design Decisions
//! - Request ID is set by `SetRequestIdLayer` as early as possible for tracing
//! - Header values that are not valid UTF-8 are treated as absent

use std::convert::Infallible;
use std::time::Instant;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap, HeaderName};

use crate::event::unix_timestamp;
use crate::project::X_SENTRY_AUTH;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Everything the handler needs from the request head.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    /// Receipt time, seconds since the Unix epoch.
    pub received: f64,
    pub started: Instant,
    pub request_id: Option<String>,
    pub content_type: Option<String>,
    pub user_agent: Option<String>,
    pub origin: Option<String>,
    pub referer: Option<String>,
    pub auth: Option<String>,
}

impl RequestMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            received: unix_timestamp(),
            started: Instant::now(),
            request_id: get(X_REQUEST_ID.as_str()),
            content_type: get(header::CONTENT_TYPE.as_str()),
            user_agent: get(header::USER_AGENT.as_str()),
            origin: get(header::ORIGIN.as_str()),
            referer: get(header::REFERER.as_str()),
            auth: get(X_SENTRY_AUTH),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
