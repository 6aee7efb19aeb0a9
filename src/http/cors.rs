//! CORS for the security endpoints.
//!
//! # Responsibilities
//! - Answer every `OPTIONS` preflight with the static allow-lists
//! - Expose the relay's response headers on every other response
//!
//! # Design Decisions
//! - Preflight does not require an `Origin` header
//! - Allowed headers do not depend on `Access-Control-Request-Headers`
//! - No per-origin restriction here; origins are enforced after parsing

use std::time::Duration;

use axum::http::{HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

use crate::config::CorsConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    allow_headers: Vec<HeaderName>,
    expose_headers: Vec<HeaderName>,
    max_age: Option<Duration>,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Self {
        Self {
            allow_headers: header_names(&config.allow_headers),
            expose_headers: header_names(&config.expose_headers),
            max_age: config.max_age_secs.map(Duration::from_secs),
        }
    }

    pub fn allow_headers(&self) -> &[HeaderName] {
        &self.allow_headers
    }

    pub fn expose_headers(&self) -> &[HeaderName] {
        &self.expose_headers
    }

    pub fn layer(&self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::POST])
            .allow_headers(self.allow_headers.clone())
            .expose_headers(self.expose_headers.clone());
        match self.max_age {
            Some(max_age) => layer.max_age(max_age),
            None => layer,
        }
    }
}

fn header_names(names: &[String]) -> Vec<HeaderName> {
    names
        .iter()
        .filter_map(|name| match HeaderName::from_bytes(name.as_bytes()) {
            Ok(header) => Some(header),
            Err(_) => {
                tracing::warn!(header = %name, "Ignoring invalid CORS header name");
                None
            }
        })
        .collect()
}
