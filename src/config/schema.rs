//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the security report relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Static CORS policy for the report endpoints.
    pub cors: CorsConfig,

    /// Where accepted envelopes are sent.
    pub upstream: UpstreamConfig,

    /// Provenance stamped onto emitted events.
    pub ingest: IngestConfig,

    /// Projects accepting security reports.
    pub projects: Vec<ProjectConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for reading the report and responding) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum report body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// CORS headers served on the report endpoints.
///
/// The lists are static: preflight answers never echo what the browser asked for.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Value of `Access-Control-Allow-Headers` on preflight responses.
    pub allow_headers: Vec<String>,

    /// Value of `Access-Control-Expose-Headers` on every other response.
    pub expose_headers: Vec<String>,

    /// Optional `Access-Control-Max-Age` in seconds.
    pub max_age_secs: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_headers: [
                "x-forwarded-for",
                "content-type",
                "transfer-encoding",
                "referer",
                "authorization",
                "origin",
                "authentication",
                "content-encoding",
                "x-sentry-auth",
                "accept",
                "x-requested-with",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            expose_headers: ["x-sentry-error", "x-sentry-rate-limits", "retry-after"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_age_secs: None,
        }
    }
}

/// Upstream transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL envelopes are POSTed to. When unset, envelopes are logged and dropped.
    pub url: Option<String>,

    /// Per-envelope send timeout in seconds.
    pub timeout_secs: u64,

    /// Capacity of the in-memory envelope queue.
    pub queue_size: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 5,
            queue_size: 1_000,
        }
    }
}

/// Provenance information recorded in `ingest_path`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Name of this relay instance.
    pub node_name: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            node_name: "security-relay".to_string(),
        }
    }
}

/// A project that accepts security reports.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// Numeric project identifier used in the endpoint path.
    pub project_id: u64,

    /// Public keys (DSN keys) allowed to submit for this project.
    pub public_keys: Vec<String>,

    /// Domains reports may originate from. `*` allows every origin.
    #[serde(default = "default_allowed_domains")]
    pub allowed_domains: Vec<String>,
}

fn default_allowed_domains() -> Vec<String> {
    vec!["*".to_string()]
}
