//! Error handling at the route boundary.
//!
//! Route logic returns `Result<_, AppError>`; the conversion to an HTTP
//! response happens in exactly one place, [`AppError::into_response`].
//! Callers always receive a JSON body with a `status` field, and no error
//! terminates the process.
//!
//! The taxonomy is deliberately small: `internal_error` for any failure
//! inside a route body and `not_found` for unmatched routes. The `Display`
//! values double as the `error_kind` label on `http_errors_total`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

/// Error categories this service produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unmatched route (404)
    NotFound,
    /// Any failure inside a route body (500)
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable label value for the `error_kind` metric dimension.
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Internal => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Application error converted to a JSON response at the route boundary.
///
/// The JSON shape varies slightly per route (the health route answers
/// `status: "unhealthy"` rather than `status: "error"`), so the status
/// word travels with the error instead of being derived from the kind.
#[derive(Debug)]
pub struct AppError {
    /// Determines the HTTP status code and metric label
    pub kind: ErrorKind,
    /// Value of the JSON `status` field
    pub status_word: &'static str,
    /// Value of the JSON `message` field, when the route carries one
    pub message: Option<String>,
    /// Value of the JSON `error` field, describing what failed
    pub error: Option<String>,
}

impl AppError {
    /// An internal failure: 500, `{status: "error", error}`.
    pub fn internal(source: impl fmt::Display) -> Self {
        Self {
            kind: ErrorKind::Internal,
            status_word: "error",
            message: None,
            error: Some(source.to_string()),
        }
    }

    /// An internal failure on the health route: 500, `{status: "unhealthy", error}`.
    pub fn unhealthy(source: impl fmt::Display) -> Self {
        Self {
            kind: ErrorKind::Internal,
            status_word: "unhealthy",
            message: None,
            error: Some(source.to_string()),
        }
    }

    /// An unmatched route: 404, `{message, status: "error"}`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            status_word: "error",
            message: Some(message.into()),
            error: None,
        }
    }

    /// Attach a `message` field to the response body.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn log(&self) {
        match self.kind {
            ErrorKind::Internal => {
                tracing::error!(
                    error_kind = %self.kind,
                    error = self.error.as_deref().unwrap_or("unknown"),
                    "request failed"
                );
            }
            ErrorKind::NotFound => {
                tracing::debug!(
                    error_kind = %self.kind,
                    message = self.message.as_deref().unwrap_or(""),
                    "unmatched route"
                );
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "{}: {}", self.kind, error),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for AppError {}

/// JSON failure body. Absent fields are omitted, not null.
#[derive(Debug, Serialize)]
struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.kind.status_code();
        let body = ErrorBody {
            message: self.message,
            status: self.status_word,
            error: self.error,
        };

        (status, Json(body)).into_response()
    }
}

/// Result alias for route handlers.
pub type Result<T> = std::result::Result<T, AppError>;
