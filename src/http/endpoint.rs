//! Security report endpoint.
//!
//! # Data Flow
//! ```text
//! POST /api/{project_id}/security/
//!     → project lookup + public key check
//!     → classify + parse (report)
//!     → origin resolution + allow-list check (origin)
//!     → normalize (event)
//!     → emit (envelope)
//!     → 200, empty body
//! ```
//!
//! # Design Decisions
//! - A report from a disallowed origin still gets `200` and is dropped
//! - The config snapshot is loaded once per request

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::event::{normalize, EventContext};
use crate::http::request::RequestMeta;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::origin::{validate, OriginDecision, OriginSources};
use crate::project::public_key;
use crate::report::SecurityReport;

/// Query parameters accepted alongside a report.
///
/// `release` and `environment` are short forms; the `sentry_` names win when
/// both are sent.
#[derive(Debug, Default, Deserialize)]
pub struct SecurityParams {
    pub sentry_key: Option<String>,
    pub sentry_release: Option<String>,
    pub release: Option<String>,
    pub sentry_environment: Option<String>,
    pub environment: Option<String>,
    pub origin: Option<String>,
}

impl SecurityParams {
    pub fn release(&self) -> Option<&str> {
        self.sentry_release.as_deref().or(self.release.as_deref())
    }

    pub fn environment(&self) -> Option<&str> {
        self.sentry_environment.as_deref().or(self.environment.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Accepted,
    Filtered,
}

pub async fn security_report(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    query: Result<Query<SecurityParams>, QueryRejection>,
    meta: RequestMeta,
    body: Bytes,
) -> Response {
    let result = query
        .map_err(|e| ApiError::InvalidQuery(e.body_text()))
        .and_then(|Query(params)| handle(&state, &project_id, &params, &meta, &body));

    let response = match result {
        Ok(outcome) => {
            tracing::debug!(
                request_id = meta.request_id.as_deref().unwrap_or("unknown"),
                project_id = %project_id,
                outcome = ?outcome,
                "Security report handled"
            );
            StatusCode::OK.into_response()
        }
        Err(e) => {
            tracing::info!(
                request_id = meta.request_id.as_deref().unwrap_or("unknown"),
                project_id = %project_id,
                error = %e,
                "Security report rejected"
            );
            e.into_response()
        }
    };

    metrics::record_request(response.status().as_u16(), meta.started);
    response
}

fn handle(
    state: &AppState,
    project_id: &str,
    params: &SecurityParams,
    meta: &RequestMeta,
    body: &[u8],
) -> Result<Outcome, ApiError> {
    let relay = state.inner.load();

    let project_id: u64 = project_id.parse().map_err(|_| ApiError::InvalidProjectId)?;
    let key = public_key(params.sentry_key.as_deref(), meta.auth.as_deref());
    let project = relay.projects.authorize(project_id, key.as_deref())?;

    let report = SecurityReport::from_request(meta.content_type.as_deref(), body).map_err(|e| {
        let format = e.format().map_or("unknown", |f| f.as_str());
        metrics::record_report(format, e.kind());
        e
    })?;
    let format = report.format().as_str();

    let sources = OriginSources {
        origin_header: meta.origin.as_deref(),
        referer_header: meta.referer.as_deref(),
        query: params.origin.as_deref(),
    };
    let origin = sources.resolve(&report);
    if validate(origin.as_ref(), &project.origins) == OriginDecision::Rejected {
        tracing::debug!(
            project_id,
            format,
            origin = origin.as_ref().map(|o| o.as_str()).unwrap_or_default(),
            "Dropping report from disallowed origin"
        );
        metrics::record_report(format, "filtered");
        return Ok(Outcome::Filtered);
    }

    let context = EventContext {
        origin: sources.explicit(),
        user_agent: meta.user_agent.clone(),
        release: params.release().map(str::to_string),
        environment: params.environment().map(str::to_string),
    };
    let event = normalize(report, &context);

    match relay.emitter.emit(event, project_id, meta.received) {
        Ok(_) => {
            metrics::record_report(format, "accepted");
            Ok(Outcome::Accepted)
        }
        Err(e) => {
            tracing::error!(project_id, format, error = %e, "Failed to emit security event");
            metrics::record_report(format, e.kind());
            Err(e.into())
        }
    }
}
