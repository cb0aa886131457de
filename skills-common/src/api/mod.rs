//! Wire types shared by the backend client and the dashboard HTTP API
//!
//! This module holds plain serde types only. The HTTP client and the axum
//! handlers that use them live in `skills-dash`.

pub mod types;

pub use types::{
    BackendErrorBody, ErrorBody, ErrorResponse, ExportRequest, LoginRequest, LoginResponse,
    TokenResponse, VerifyCodeRequest,
};
