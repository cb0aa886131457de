//! Filter selection endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use skills_common::{all_options, facet_options, Dimension, FacetOptions, FilterState};

use crate::error::{ApiError, ApiResult};
use crate::view::ViewController;
use crate::AppState;

/// Body of PUT /api/filters/:dimension
#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    #[serde(default)]
    pub values: Vec<String>,
}

/// Body of POST /api/filters/:dimension/toggle
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub value: String,
}

/// Filter state with the option lists the filter bar shows
#[derive(Debug, Serialize)]
pub struct FiltersResponse {
    pub filters: FilterState,
    pub has_active_filters: bool,
    pub options: FacetOptions,
    pub available: FacetOptions,
    pub total_records: usize,
    pub filtered_count: usize,
}

async fn filters_response(state: &AppState, view: &ViewController) -> FiltersResponse {
    let records = state.store.snapshot().await;
    let filters = view.filters();
    FiltersResponse {
        filters: filters.clone(),
        has_active_filters: filters.has_active_filters(),
        options: all_options(&records),
        available: facet_options(&records, filters),
        total_records: records.len(),
        filtered_count: view.filtered(&records).len(),
    }
}

fn parse_dimension(segment: &str) -> Result<Dimension, ApiError> {
    segment
        .parse()
        .map_err(|e: skills_common::Error| ApiError::BadRequest(e.to_string()))
}

/// GET /api/filters
pub async fn get_filters(State(state): State<AppState>) -> Json<FiltersResponse> {
    let view = state.view.read().await;
    Json(filters_response(&state, &view).await)
}

/// PUT /api/filters/:dimension
///
/// Replaces the dimension's selection; an empty list clears it.
pub async fn set_filter(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Json(request): Json<SelectionRequest>,
) -> ApiResult<Json<FiltersResponse>> {
    let dimension = parse_dimension(&segment)?;
    let mut view = state.view.write().await;
    view.set_selection(dimension, request.values);
    Ok(Json(filters_response(&state, &view).await))
}

/// POST /api/filters/:dimension/toggle
pub async fn toggle_filter(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Json(request): Json<ToggleRequest>,
) -> ApiResult<Json<FiltersResponse>> {
    let dimension = parse_dimension(&segment)?;
    let mut view = state.view.write().await;
    view.toggle(dimension, &request.value);
    Ok(Json(filters_response(&state, &view).await))
}

/// DELETE /api/filters
pub async fn clear_filters(State(state): State<AppState>) -> Json<FiltersResponse> {
    let mut view = state.view.write().await;
    view.clear_all();
    Json(filters_response(&state, &view).await)
}
