//! Whole-dashboard view endpoints

use axum::{extract::State, Json};

use crate::view::{ViewSnapshot, ViewUpdate};
use crate::AppState;

/// GET /api/view
pub async fn get_view(State(state): State<AppState>) -> Json<ViewSnapshot> {
    let records = state.store.snapshot().await;
    let view = state.view.read().await;
    Json(view.render(&records))
}

/// PUT /api/view
///
/// Switches view kind, matrix mode or table sort, then renders.
pub async fn update_view(
    State(state): State<AppState>,
    Json(update): Json<ViewUpdate>,
) -> Json<ViewSnapshot> {
    let records = state.store.snapshot().await;
    let mut view = state.view.write().await;
    view.apply(update);
    Json(view.render(&records))
}
