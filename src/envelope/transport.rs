//! Envelope delivery.
//!
//! # Responsibilities
//! - Accept envelopes from request handlers without blocking them
//! - Forward queued envelopes to the upstream ingestion endpoint
//! - Drain what is already queued when shutdown is signalled
//!
//! # Design Decisions
//! - Bounded queue; a full queue is reported to the client as 503
//! - With no upstream configured, envelopes are logged and dropped
//! - A failed upstream POST is logged and counted, never retried

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

use crate::config::UpstreamConfig;
use crate::envelope::emitter::EmitError;
use crate::envelope::item::Envelope;
use crate::observability::metrics;

pub const ENVELOPE_CONTENT_TYPE: &str = "application/x-sentry-envelope";

/// Destination for emitted envelopes.
pub trait EnvelopeSink: Send + Sync {
    fn submit(&self, envelope: Envelope) -> Result<(), EmitError>;
}

/// Sink backed by a bounded in-memory queue.
#[derive(Debug, Clone)]
pub struct QueueSink {
    tx: mpsc::Sender<Envelope>,
}

impl QueueSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl EnvelopeSink for QueueSink {
    fn submit(&self, envelope: Envelope) -> Result<(), EmitError> {
        self.tx.try_send(envelope).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EmitError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => EmitError::QueueClosed,
        })
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid upstream url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Drains the queue into the upstream.
pub struct Forwarder {
    rx: mpsc::Receiver<Envelope>,
    client: reqwest::Client,
    upstream: Option<String>,
}

impl Forwarder {
    pub fn new(rx: mpsc::Receiver<Envelope>, config: &UpstreamConfig) -> Result<Self, TransportError> {
        let upstream = match &config.url {
            Some(raw) => {
                let url = url::Url::parse(raw)?;
                Some(url.as_str().trim_end_matches('/').to_string())
            }
            None => None,
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            rx,
            client,
            upstream,
        })
    }

    /// Run until every sender is gone or shutdown is signalled.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            upstream = self.upstream.as_deref().unwrap_or("none"),
            "Envelope forwarder started"
        );

        loop {
            tokio::select! {
                envelope = self.rx.recv() => match envelope {
                    Some(envelope) => self.forward(envelope).await,
                    None => break,
                },
                _ = shutdown.recv() => {
                    self.rx.close();
                    while let Some(envelope) = self.rx.recv().await {
                        self.forward(envelope).await;
                    }
                    break;
                }
            }
        }

        tracing::info!("Envelope forwarder stopped");
    }

    async fn forward(&self, envelope: Envelope) {
        let event_id = envelope.event_id();
        let project_id = envelope.project_id();
        let body = match envelope.to_bytes() {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(event_id = %event_id, error = %e, "Failed to serialize envelope");
                metrics::record_forward("error");
                return;
            }
        };

        let Some(upstream) = &self.upstream else {
            tracing::info!(
                event_id = %event_id,
                project_id,
                bytes = body.len(),
                "No upstream configured, dropping envelope"
            );
            metrics::record_forward("dropped");
            return;
        };

        let url = format!("{upstream}/api/{project_id}/envelope/");
        let result = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, ENVELOPE_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => {
                tracing::debug!(event_id = %event_id, project_id, "Envelope forwarded");
                metrics::record_forward("ok");
            }
            Err(e) => {
                tracing::warn!(event_id = %event_id, project_id, error = %e, "Upstream rejected envelope");
                metrics::record_forward("error");
            }
        }
    }
}
