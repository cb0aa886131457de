//! PDF export endpoint

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::ApiResult;
use crate::export::PDF_CONTENT_TYPE;
use crate::AppState;

/// POST /api/export-pdf
///
/// Exports the current filtered view as an attachment.
pub async fn export_pdf(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.store.snapshot().await;
    let (filtered, filters) = {
        let view = state.view.read().await;
        (view.filtered(&records), view.filters().clone())
    };

    let document = state.exporter.export(&filtered, &filters).await?;

    let disposition = format!("attachment; filename=\"{}\"", document.filename);
    Ok((
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}
