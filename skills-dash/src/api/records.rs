//! Record endpoints: table listing, refresh, edit, delete, reset

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use skills_common::{RecordId, SkillRecord, SortColumn, SortOrder, SortSpec, TableView};

use crate::error::{ApiError, ApiResult, PersistError};
use crate::AppState;

/// Query parameters for GET /api/records
#[derive(Debug, Default, Deserialize)]
pub struct RecordsQuery {
    /// Column to sort by; falls back to the view's sort
    pub sort: Option<String>,
    /// asc (default) or desc
    pub order: Option<String>,
}

impl RecordsQuery {
    fn sort_spec(&self) -> Result<Option<SortSpec>, ApiError> {
        let Some(column) = &self.sort else {
            return Ok(None);
        };
        let column: SortColumn = column
            .parse()
            .map_err(|e: skills_common::Error| ApiError::BadRequest(e.to_string()))?;
        let order = match &self.order {
            Some(order) => order
                .parse::<SortOrder>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            None => SortOrder::default(),
        };
        Ok(Some(SortSpec::new(column, order)))
    }
}

/// Record set summary after a reload
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub total_records: usize,
    pub last_refreshed: Option<DateTime<Utc>>,
}

/// GET /api/records
///
/// Filtered records as table rows. `sort`/`order` override the view's
/// table sort for this request only.
pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> ApiResult<Json<TableView>> {
    let requested = query.sort_spec()?;
    let records = state.store.snapshot().await;

    let view = state.view.read().await;
    let sort = requested.or(view.sort());
    Ok(Json(TableView::new(view.filtered(&records), sort)))
}

/// POST /api/records/refresh
pub async fn refresh_records(State(state): State<AppState>) -> ApiResult<Json<RefreshResponse>> {
    let records = state.store.refresh().await?;
    Ok(Json(RefreshResponse {
        total_records: records.len(),
        last_refreshed: state.store.last_refreshed().await,
    }))
}

/// Map a path segment onto a stored record's id
async fn resolve_id(state: &AppState, segment: &str) -> Result<RecordId, PersistError> {
    state
        .store
        .find_id(segment)
        .await
        .ok_or_else(|| PersistError::NotFound(RecordId::from(segment)))
}

/// PUT /api/records/:id
///
/// Body is a JSON object of wire field names to new values.
pub async fn update_record(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> ApiResult<Json<SkillRecord>> {
    let id = resolve_id(&state, &segment).await?;
    let saved = state.store.update(&id, &patch).await?;
    Ok(Json(saved))
}

/// DELETE /api/records/:id
pub async fn delete_record(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> ApiResult<StatusCode> {
    let id = resolve_id(&state, &segment).await?;
    state.store.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/reset-data
pub async fn reset_data(State(state): State<AppState>) -> ApiResult<Json<RefreshResponse>> {
    let records = state.store.reset_to_default().await?;
    Ok(Json(RefreshResponse {
        total_records: records.len(),
        last_refreshed: state.store.last_refreshed().await,
    }))
}
