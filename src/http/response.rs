//! Error responses.
//!
//! # Design Decisions
//! - Error bodies are empty; the reason travels in `x-sentry-error`
//! - Status codes follow the error's origin: client (4xx) or capacity (503)

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::envelope::EmitError;
use crate::project::AuthError;
use crate::report::ReportError;

pub const X_SENTRY_ERROR: HeaderName = HeaderName::from_static("x-sentry-error");

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid project id")]
    InvalidProjectId,

    #[error("invalid query string: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidProjectId | ApiError::InvalidQuery(_) | ApiError::Report(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Auth(AuthError::MissingKey) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(_) => StatusCode::FORBIDDEN,
            ApiError::Emit(EmitError::Serialize(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Emit(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        let message = self.to_string();
        let value = HeaderValue::from_str(&message)
            .unwrap_or_else(|_| HeaderValue::from_static("invalid request"));
        response.headers_mut().insert(X_SENTRY_ERROR, value);
        response
    }
}
