//! Session gate for protected routes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Reject requests with 401 unless a user is signed in
///
/// Applied to protected routes only; `/health` and `/api/session/*` stay open
/// so a signed-out browser can log in.
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.session.current().await.is_none() {
        debug!(path = %request.uri().path(), "Rejected request without session");
        return Err(ApiError::Unauthenticated);
    }
    Ok(next.run(request).await)
}
