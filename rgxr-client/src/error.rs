//! Client error types.

use rgxr_protocol::Operation;
use reqwest::StatusCode;
use thiserror::Error;

/// Client errors.
///
/// Nothing is retried: every variant reaches the caller as soon as it occurs.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service answered with a non-success status.
    #[error("{operation} failed: {}", status_text(.status))]
    Request {
        operation: Operation,
        status: StatusCode,
    },

    /// A lookup by identifier matched no record.
    #[error("FA not found: {0}")]
    NotFound(String),

    /// The exchange did not produce a response at all.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A written row was expected back but the body held none.
    #[error("{0} failed: empty response")]
    EmptyResponse(Operation),

    #[error("token store error: {0}")]
    TokenStore(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns whether the service rejected the request's credentials.
    ///
    /// Such failures are reported like any other status; this only helps a
    /// caller decide to log in again.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ClientError::Request { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }

    /// Returns the status code for request failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Request { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }
}

fn status_text(status: &StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}
