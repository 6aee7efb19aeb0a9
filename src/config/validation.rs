//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (unique project ids, non-empty key lists)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check CORS header names are valid HTTP header names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::RelayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("invalid upstream url: {0}")]
    InvalidUpstream(String),

    #[error("invalid CORS header name: {0}")]
    InvalidHeaderName(String),

    #[error("duplicate project id {0}")]
    DuplicateProject(u64),

    #[error("project {0} has no public keys")]
    NoPublicKeys(u64),

    #[error("project {0} has an empty allowed domain entry")]
    EmptyDomain(u64),
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "limits.max_body_size" });
    }
    if config.upstream.queue_size == 0 {
        errors.push(ValidationError::Zero { field: "upstream.queue_size" });
    }
    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "upstream.timeout_secs" });
    }

    if let Some(url) = &config.upstream.url {
        match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => errors.push(ValidationError::InvalidUpstream(url.clone())),
        }
    }

    for name in config.cors.allow_headers.iter().chain(&config.cors.expose_headers) {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    let mut seen = HashSet::new();
    for project in &config.projects {
        if !seen.insert(project.project_id) {
            errors.push(ValidationError::DuplicateProject(project.project_id));
        }
        if project.public_keys.iter().all(|k| k.trim().is_empty()) {
            errors.push(ValidationError::NoPublicKeys(project.project_id));
        }
        if project.allowed_domains.iter().any(|d| d.trim().is_empty()) {
            errors.push(ValidationError::EmptyDomain(project.project_id));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
