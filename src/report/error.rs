//! Report parsing errors.

use thiserror::Error;

use crate::report::format::ReportFormat;

/// Why a request body could not be turned into a [`SecurityReport`](super::SecurityReport).
#[derive(Debug, Error)]
pub enum ReportError {
    /// The body does not look like any known security report.
    #[error("unrecognized security report format")]
    UnrecognizedFormat,

    /// The body of a recognized format is not valid JSON.
    #[error("invalid {format} report: {source}")]
    InvalidJson {
        format: ReportFormat,
        #[source]
        source: serde_json::Error,
    },

    /// The JSON does not have the structure the format requires.
    #[error("invalid {format} report: {reason}")]
    InvalidShape { format: ReportFormat, reason: String },

    /// A field the format cannot do without is absent.
    #[error("invalid {format} report: missing {field}")]
    MissingField {
        format: ReportFormat,
        field: &'static str,
    },
}

impl ReportError {
    /// True when no parser claimed the body, as opposed to a parser rejecting it.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, ReportError::UnrecognizedFormat)
    }

    /// The format that rejected the body, if one claimed it.
    pub fn format(&self) -> Option<ReportFormat> {
        match self {
            ReportError::UnrecognizedFormat => None,
            ReportError::InvalidJson { format, .. }
            | ReportError::InvalidShape { format, .. }
            | ReportError::MissingField { format, .. } => Some(*format),
        }
    }

    /// Short, stable label for metrics and the `x-sentry-error` header.
    pub fn kind(&self) -> &'static str {
        match self {
            ReportError::UnrecognizedFormat => "unrecognized_format",
            ReportError::InvalidJson { .. } => "invalid_json",
            ReportError::InvalidShape { .. } => "invalid_shape",
            ReportError::MissingField { .. } => "missing_field",
        }
    }
}
