//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the security and health-check routes
//! - Wire up middleware (tracing, request ID, CORS, limits, timeout)
//! - Bind the server to a listener and shut down gracefully
//! - Swap the config snapshot when the watcher delivers a new config

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::envelope::{Emitter, EnvelopeSink};
use crate::http::cors::CorsPolicy;
use crate::http::endpoint::security_report;
use crate::http::request::X_REQUEST_ID;
use crate::project::ProjectStore;

/// Everything a request needs, replaced as a unit on reload.
pub struct RelayState {
    pub config: RelayConfig,
    pub projects: ProjectStore,
    pub emitter: Emitter,
}

impl RelayState {
    pub fn new(config: RelayConfig, sink: Arc<dyn EnvelopeSink>) -> Self {
        Self {
            projects: ProjectStore::from_config(&config.projects),
            emitter: Emitter::new(sink, config.ingest.node_name.clone()),
            config,
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<RelayState>>,
    sink: Arc<dyn EnvelopeSink>,
}

impl AppState {
    pub fn new(config: RelayConfig, sink: Arc<dyn EnvelopeSink>) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(RelayState::new(config, sink.clone()))),
            sink,
        }
    }

    /// Atomically replace the snapshot. In-flight requests keep the old one.
    pub fn reload(&self, config: RelayConfig) {
        let projects = config.projects.len();
        self.inner
            .store(Arc::new(RelayState::new(config, self.sink.clone())));
        tracing::info!(projects, "Configuration reloaded");
    }
}

/// HTTP server for the security report endpoints.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: RelayConfig, sink: Arc<dyn EnvelopeSink>) -> Self {
        let router_config = config.clone();
        let state = AppState::new(config, sink);
        let router = Self::build_router(&router_config, state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// CORS wraps the limit and timeout layers so `413` and `408` responses
    /// still carry the exposed headers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let cors = CorsPolicy::from_config(&config.cors);

        let security = Router::new()
            .route("/api/{project_id}/security/", post(security_report))
            .route("/api/{project_id}/security", post(security_report))
            .route("/api/{project_id}/csp-report/", post(security_report))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(cors.layer());

        Router::new()
            .route("/api/relay/healthcheck/live/", get(healthcheck))
            .route("/api/relay/healthcheck/ready/", get(healthcheck))
            .merge(security)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// New configs arriving on `config_updates` replace the project snapshot.
    /// Listener, limits and CORS settings are fixed at startup.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RelayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                state.reload(config);
            }
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn healthcheck() -> Json<Value> {
    Json(json!({ "is_healthy": true }))
}
