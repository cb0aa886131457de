//! HTTP API handlers for skills-dash

pub mod auth;
pub mod export;
pub mod filters;
pub mod health;
pub mod matrix;
pub mod records;
pub mod session;
pub mod view;

pub use auth::require_session;
pub use export::export_pdf;
pub use filters::{clear_filters, get_filters, set_filter, toggle_filter};
pub use health::health_routes;
pub use matrix::get_matrix;
pub use records::{delete_record, list_records, refresh_records, reset_data, update_record};
pub use session::session_routes;
pub use view::{get_view, update_view};
