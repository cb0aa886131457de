//! skills-dash library - Manpower & Skills Matrix dashboard service
//!
//! Fetches skill records from the skills backend, keeps the user's filter
//! and view state, and serves filtered tables, facets and the competency
//! matrix as JSON.

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod backend;
pub mod error;
pub mod export;
pub mod session;
pub mod store;
pub mod view;

use backend::SkillsBackend;
use export::PdfExporter;
use session::SessionManager;
use store::RecordStore;
use view::ViewController;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn SkillsBackend>,
    pub store: Arc<RecordStore>,
    pub view: Arc<RwLock<ViewController>>,
    pub session: Arc<SessionManager>,
    pub exporter: Arc<PdfExporter>,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn SkillsBackend>,
        session: SessionManager,
        export_timeout: Duration,
    ) -> Self {
        Self {
            store: Arc::new(RecordStore::new(backend.clone())),
            view: Arc::new(RwLock::new(ViewController::new())),
            session: Arc::new(session),
            exporter: Arc::new(PdfExporter::new(backend.clone(), export_timeout)),
            backend,
        }
    }
}

/// Build application router
///
/// Health and session endpoints are public; everything touching records or
/// view state requires a signed-in session.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    let protected = Router::new()
        .route("/api/view", get(api::get_view).put(api::update_view))
        .route("/api/records", get(api::list_records))
        .route("/api/records/refresh", post(api::refresh_records))
        .route(
            "/api/records/:id",
            put(api::update_record).delete(api::delete_record),
        )
        .route("/api/reset-data", post(api::reset_data))
        .route("/api/filters", get(api::get_filters).delete(api::clear_filters))
        .route("/api/filters/:dimension", put(api::set_filter))
        .route("/api/filters/:dimension/toggle", post(api::toggle_filter))
        .route("/api/matrix", get(api::get_matrix))
        .route("/api/export-pdf", post(api::export_pdf))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_session,
        ));

    let public = Router::new()
        .merge(api::health_routes())
        .merge(api::session_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
