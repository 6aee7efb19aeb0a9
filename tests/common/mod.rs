//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use security_relay::config::{ProjectConfig, RelayConfig};
use security_relay::envelope::{Envelope, ItemType, QueueSink};
use security_relay::HttpServer;

pub const PROJECT_ID: u64 = 42;
pub const PUBLIC_KEY: &str = "31a5a894b4524f74a9a8d0e27e21ba91";
pub const RELEASE: &str = "01d5c3165d9fbc5c8bdcf9550a1d6793a80fc02b";
pub const ENVIRONMENT: &str = "production";
pub const USER_AGENT: &str = "Mozilla/5.0 (Security Relay Test)";

/// Fields assigned at emission time, excluded from fixture comparison.
pub const VOLATILE_FIELDS: &[&str] = &["event_id", "timestamp", "received", "ingest_path"];

pub fn project(project_id: u64, allowed_domains: &[&str]) -> ProjectConfig {
    ProjectConfig {
        project_id,
        public_keys: vec![PUBLIC_KEY.to_string()],
        allowed_domains: allowed_domains.iter().map(|d| d.to_string()).collect(),
    }
}

pub fn test_config(allowed_domains: &[&str]) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.projects.push(project(PROJECT_ID, allowed_domains));
    config
}

/// A router wired to an in-memory queue instead of an upstream.
pub struct TestRelay {
    pub router: Router,
    pub envelopes: mpsc::Receiver<Envelope>,
}

impl TestRelay {
    pub fn new(config: RelayConfig) -> Self {
        let (sink, envelopes) = QueueSink::new(16);
        let server = HttpServer::new(config, Arc::new(sink));
        Self {
            router: server.router(),
            envelopes,
        }
    }

    pub fn with_domains(allowed_domains: &[&str]) -> Self {
        Self::new(test_config(allowed_domains))
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// The next captured security event, if any was emitted.
    pub fn next_event(&mut self) -> Option<Value> {
        self.envelopes.try_recv().ok().map(|envelope| security_event(&envelope))
    }
}

pub fn security_url(project_id: u64) -> String {
    format!(
        "/api/{project_id}/security/?sentry_key={PUBLIC_KEY}&sentry_release={RELEASE}&sentry_environment={ENVIRONMENT}"
    )
}

/// A report POST as a browser would send it.
pub fn report_request(uri: &str, content_type: &str, origin: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .header("user-agent", USER_AGENT);
    if let Some(origin) = origin {
        builder = builder.header("origin", origin);
    }
    builder.body(body.into()).unwrap()
}

pub fn fixture_path(name: &str, ext: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{name}.{ext}.json"))
}

pub fn load_fixture_text(name: &str, ext: &str) -> String {
    std::fs::read_to_string(fixture_path(name, ext)).unwrap()
}

pub fn load_fixture(name: &str, ext: &str) -> Value {
    serde_json::from_str(&load_fixture_text(name, ext)).unwrap()
}

/// Parse the payload of the envelope's `security` item.
pub fn security_event(envelope: &Envelope) -> Value {
    let item = envelope
        .items()
        .iter()
        .find(|item| item.ty() == ItemType::Security)
        .expect("envelope has no security item");
    serde_json::from_slice(item.payload()).unwrap()
}

pub fn strip_volatile(mut event: Value) -> Value {
    if let Some(object) = event.as_object_mut() {
        for field in VOLATILE_FIELDS {
            object.remove(*field);
        }
    }
    event
}

/// Split a comma-separated header value into its trimmed parts.
pub fn split_header(value: &str) -> Vec<String> {
    let mut parts: Vec<String> = value.split(',').map(|p| p.trim().to_string()).collect();
    parts.sort();
    parts
}
