//! Error types for skills-dash
//!
//! One enum per failure surface. `BackendError` describes what went wrong on
//! the wire; the store, export and session layers wrap it in the error their
//! callers handle. `ApiError` maps all of them onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use skills_common::api::ErrorResponse;
use skills_common::RecordId;
use std::time::Duration;
use thiserror::Error;

/// Failure talking to the skills backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    /// Non-2xx status; `message` is the backend's `detail` when it sent one
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl BackendError {
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_decode() {
            BackendError::Parse(e.to_string())
        } else {
            BackendError::Network(e.to_string())
        }
    }
}

/// Reading the record set failed; the previous set is retained
#[derive(Debug, Error)]
#[error("Failed to fetch records: {0}")]
pub struct FetchError(#[from] pub BackendError);

/// A write, delete or reset failed; local state is unchanged
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    #[error("Record {0} has no server-side identity")]
    NoServerIdentity(RecordId),

    #[error("An edit of record {0} is already in progress")]
    EditInProgress(RecordId),

    #[error("Invalid patch: {0}")]
    InvalidPatch(String),

    #[error("Backend rejected the change: {0}")]
    Backend(#[from] BackendError),
}

/// Reset succeeded or failed at one of its two steps
#[derive(Debug, Error)]
pub enum ResetError {
    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// PDF generation failed; nothing partial is returned
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No records to export")]
    NoData,

    #[error("PDF generation timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("PDF generation failed: {0}")]
    Rejected(String),

    #[error("PDF generation failed: {0}")]
    Backend(BackendError),
}

/// Login step failed; the session stays on its current step
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Rejected(String),

    #[error("No login pending for {0}")]
    NoPendingLogin(String),

    #[error("Authentication service unavailable: {0}")]
    Backend(BackendError),

    #[error("Failed to store session: {0}")]
    Storage(#[from] skills_common::Error),
}

impl From<BackendError> for AuthError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Status { message, .. } => AuthError::Rejected(message),
            other => AuthError::Backend(other),
        }
    }
}

// ========================================
// HTTP mapping
// ========================================

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Protected route without a session (401)
    #[error("Not authenticated")]
    Unauthenticated,

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// skills-common error
    #[error("Common error: {0}")]
    Common(#[from] skills_common::Error),
}

impl From<ResetError> for ApiError {
    fn from(e: ResetError) -> Self {
        match e {
            ResetError::Persist(e) => ApiError::Persist(e),
            ResetError::Fetch(e) => ApiError::Fetch(e),
        }
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Fetch(_) => (StatusCode::BAD_GATEWAY, "FETCH_FAILED"),
            ApiError::Persist(e) => match e {
                PersistError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                PersistError::EditInProgress(_) => (StatusCode::CONFLICT, "EDIT_IN_PROGRESS"),
                PersistError::NoServerIdentity(_) => (StatusCode::CONFLICT, "NO_SERVER_IDENTITY"),
                PersistError::InvalidPatch(_) => (StatusCode::BAD_REQUEST, "INVALID_PATCH"),
                PersistError::Backend(_) => (StatusCode::BAD_GATEWAY, "PERSIST_FAILED"),
            },
            ApiError::Export(e) => match e {
                ExportError::NoData => (StatusCode::BAD_REQUEST, "NO_DATA"),
                ExportError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "EXPORT_TIMEOUT"),
                ExportError::Rejected(_) | ExportError::Backend(_) => {
                    (StatusCode::BAD_GATEWAY, "EXPORT_FAILED")
                }
            },
            ApiError::Auth(e) => match e {
                AuthError::Rejected(_) => (StatusCode::UNAUTHORIZED, "AUTH_REJECTED"),
                AuthError::NoPendingLogin(_) => (StatusCode::UNAUTHORIZED, "NO_PENDING_LOGIN"),
                AuthError::Backend(_) => (StatusCode::BAD_GATEWAY, "AUTH_UNAVAILABLE"),
                AuthError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SESSION_STORAGE"),
            },
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, "{}", self);
        } else {
            tracing::debug!(code, "{}", self);
        }
        (status, Json(ErrorResponse::new(code, self.to_string()))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
