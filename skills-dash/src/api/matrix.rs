//! Competency matrix endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use skills_common::{MatrixMode, MatrixView};

use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct MatrixQuery {
    /// all, functional or leadership; falls back to the view's mode
    pub mode: Option<MatrixMode>,
}

/// GET /api/matrix
pub async fn get_matrix(
    State(state): State<AppState>,
    Query(query): Query<MatrixQuery>,
) -> Json<MatrixView> {
    let records = state.store.snapshot().await;
    let view = state.view.read().await;
    let mode = query.mode.unwrap_or(view.matrix_mode());
    Json(MatrixView::new(mode, &view.filtered(&records)))
}
