//! Request/response types for the skills backend and the dashboard API

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::FilterState;
use crate::model::SkillRecord;

// ========================================
// Authentication Types
// ========================================

/// Step 1 of the login flow: email and password
///
/// # Examples
///
/// ```
/// use skills_common::api::types::LoginRequest;
///
/// let request = LoginRequest {
///     email: "ana@example.com".to_string(),
///     password: "hunter2".to_string(),
/// };
/// let json = serde_json::to_value(&request).unwrap();
/// assert_eq!(json["email"], "ana@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Backend acknowledgement of step 1 (a code was sent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
}

/// Step 2 of the login flow: the one-time code sent by email
///
/// The backend calls the code `otp`; `code` is accepted as an alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    #[serde(alias = "code")]
    pub otp: String,
}

/// Bearer token issued after a successful step 2
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

// ========================================
// Export Types
// ========================================

/// Body of the backend PDF export request
#[derive(Debug, Clone, Serialize)]
pub struct ExportRequest<'a> {
    pub records: &'a [SkillRecord],
    pub filters: &'a FilterState,
}

// ========================================
// Error Response Types
// ========================================

/// Error body returned by the skills backend on non-2xx responses
///
/// `detail` is usually a string, but validation failures carry a list of
/// objects instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl BackendErrorBody {
    /// Human-readable detail, if the body carried one
    pub fn detail_message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item.get("msg").and_then(Value::as_str) {
                        Some(msg) => msg.to_string(),
                        None => item.to_string(),
                    })
                    .collect();
                Some(parts.join("; "))
            }
            other => Some(other.to_string()),
        }
    }
}

/// Error body returned by the dashboard API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `FETCH_FAILED`
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

// ========================================
// Tests
// ========================================
