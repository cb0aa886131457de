//! HttpBackend against a local stand-in for the skills API
//!
//! The stand-in is a small axum app bound to an ephemeral port, so these
//! tests exercise real requests, status mapping and error detail parsing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use skills_common::api::{LoginRequest, VerifyCodeRequest};
use skills_common::{Dimension, FilterState, RecordId, SkillRecord};
use skills_dash::backend::{HttpBackend, SkillsBackend};
use skills_dash::error::BackendError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct ServerState {
    slow_export: AtomicBool,
    last_export: Mutex<Option<Value>>,
    reset_calls: Mutex<usize>,
}

type Shared = Arc<ServerState>;

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"detail": message}))).into_response()
}

async fn list_records() -> Json<Value> {
    Json(json!([
        {"id": 1, "Function": "Sales", "Band": "Band 2A", "Proficiency_Level": "4", "BU": "Retail"},
        {"id": 2, "Function": "Ops", "Band": "Band 1A", "Proficiency_Level": 2}
    ]))
}

async fn update_record(Path(id): Path<String>, Json(mut body): Json<Value>) -> Response {
    if id == "404" {
        return detail(StatusCode::NOT_FOUND, "Record not found");
    }
    body["Skill_Definition"] = json!("Normalised by server");
    Json(body).into_response()
}

async fn delete_record(Path(id): Path<String>) -> Response {
    if id == "404" {
        return detail(StatusCode::NOT_FOUND, "Record not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn reset_data(State(state): State<Shared>) -> Json<Value> {
    *state.reset_calls.lock().unwrap() += 1;
    Json(json!({"message": "Data reset"}))
}

async fn export_pdf(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if state.slow_export.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    *state.last_export.lock().unwrap() = Some(body);
    (
        [(axum::http::header::CONTENT_TYPE, "application/pdf")],
        b"%PDF-1.4 server".to_vec(),
    )
        .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != "pw" {
        return detail(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    Json(json!({"message": "OTP sent to email"})).into_response()
}

async fn verify_otp(Json(body): Json<Value>) -> Response {
    if body["otp"].as_str().unwrap_or_default().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": [
                {"loc": ["body", "otp"], "msg": "field required"},
                {"loc": ["body", "email"], "msg": "invalid email"}
            ]})),
        )
            .into_response();
    }
    Json(json!({"access_token": "abc", "token_type": "bearer"})).into_response()
}

async fn start_server() -> (Shared, HttpBackend) {
    let state = Shared::default();
    let app = Router::new()
        .route("/api/records", get(list_records))
        .route("/api/records/:id", put(update_record).delete(delete_record))
        .route("/api/resetData", post(reset_data))
        .route("/api/exportPdf", post(export_pdf))
        .route("/api/login", post(login))
        .route("/api/verify-otp", post(verify_otp))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let backend =
        HttpBackend::new(format!("http://{}/api/", addr), Duration::from_secs(5)).unwrap();
    (state, backend)
}

#[tokio::test]
async fn test_fetch_records_decodes_rows() {
    let (_state, backend) = start_server().await;

    let records = backend.fetch_records().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, RecordId::Int(1));
    assert_eq!(records[0].proficiency_level(), Some(4));
    assert_eq!(records[0].extra.get("BU"), Some(&json!("Retail")));
    assert_eq!(records[1].band, "Band 1A");
}

#[tokio::test]
async fn test_update_returns_server_copy() {
    let (_state, backend) = start_server().await;
    let mut record = SkillRecord::blank(1);
    record.skill_name = "Negotiation".to_string();

    let saved = backend.update_record(&record).await.unwrap();
    assert_eq!(saved.id, RecordId::Int(1));
    assert_eq!(saved.skill_name, "Negotiation");
    assert_eq!(saved.skill_definition, "Normalised by server");
}

#[tokio::test]
async fn test_error_detail_is_surfaced() {
    let (_state, backend) = start_server().await;

    let err = backend
        .update_record(&SkillRecord::blank(404))
        .await
        .unwrap_err();
    match err {
        BackendError::Status { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Record not found");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_and_reset() {
    let (state, backend) = start_server().await;

    backend.delete_record(&RecordId::Int(2)).await.unwrap();
    let err = backend.delete_record(&RecordId::Int(404)).await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    backend.reset_data().await.unwrap();
    assert_eq!(*state.reset_calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_login_flow_requests() {
    let (_state, backend) = start_server().await;

    let response = backend
        .login(&LoginRequest {
            email: "ana@example.com".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(response.message, "OTP sent to email");

    let err = backend
        .login(&LoginRequest {
            email: "ana@example.com".to_string(),
            password: "bad".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Status { status: 401, ref message } if message == "Invalid credentials"));

    let token = backend
        .verify_code(&VerifyCodeRequest {
            email: "ana@example.com".to_string(),
            otp: "123456".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(token.access_token, "abc");
    assert_eq!(token.token_type, "bearer");
}

#[tokio::test]
async fn test_validation_errors_are_joined() {
    let (_state, backend) = start_server().await;

    let err = backend
        .verify_code(&VerifyCodeRequest {
            email: "ana@example.com".to_string(),
            otp: String::new(),
        })
        .await
        .unwrap_err();
    match err {
        BackendError::Status { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "field required; invalid email");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_export_posts_records_and_filters() {
    let (state, backend) = start_server().await;
    let records = vec![SkillRecord::blank(1)];
    let filters = FilterState::new().with(Dimension::Band, ["Band 2A"]);

    let bytes = backend
        .export_pdf(&records, &filters, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(bytes, b"%PDF-1.4 server");

    let body = state.last_export.lock().unwrap().clone().unwrap();
    assert_eq!(body["records"][0]["id"], 1);
    assert_eq!(body["filters"]["Band"], json!(["Band 2A"]));
}

#[tokio::test]
async fn test_export_timeout() {
    let (state, backend) = start_server().await;
    state.slow_export.store(true, Ordering::SeqCst);

    let err = backend
        .export_pdf(
            &[SkillRecord::blank(1)],
            &FilterState::new(),
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Timeout));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let backend = HttpBackend::new("http://127.0.0.1:1/api", Duration::from_secs(2)).unwrap();
    let err = backend.fetch_records().await.unwrap_err();
    assert!(matches!(err, BackendError::Network(_)));
}
