//! Login flow endpoints
//!
//! These stay public: they are how a signed-out browser obtains a session.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use skills_common::api::{LoginRequest, VerifyCodeRequest};

use crate::error::ApiResult;
use crate::session::AuthStep;
use crate::AppState;

/// Auth step plus an optional message from the backend
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub step: AuthStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// GET /api/session
pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(SessionResponse {
        step: state.session.step().await,
        message: None,
    })
}

/// POST /api/session/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let message = state
        .session
        .login(state.backend.as_ref(), &request.email, &request.password)
        .await?;

    Ok(Json(SessionResponse {
        step: state.session.step().await,
        message: Some(message),
    }))
}

/// POST /api/session/verify
///
/// On success the record set is loaded so the dashboard has data right away.
/// A failed initial load does not undo the sign-in.
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyCodeRequest>,
) -> ApiResult<Json<SessionResponse>> {
    state
        .session
        .verify_code(state.backend.as_ref(), &request.email, &request.otp)
        .await?;

    let message = match state.store.refresh().await {
        Ok(records) => format!("Signed in, {} records loaded", records.len()),
        Err(e) => format!("Signed in, but loading records failed: {}", e),
    };

    Ok(Json(SessionResponse {
        step: state.session.step().await,
        message: Some(message),
    }))
}

/// POST /api/session/logout
pub async fn logout(State(state): State<AppState>) -> ApiResult<Json<SessionResponse>> {
    state.session.logout().await?;
    Ok(Json(SessionResponse {
        step: AuthStep::SignedOut,
        message: None,
    }))
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/session/login", post(login))
        .route("/api/session/verify", post(verify))
        .route("/api/session/logout", post(logout))
}
