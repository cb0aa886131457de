//! Skills backend client
//!
//! `SkillsBackend` is the seam between the dashboard and the external skills
//! API. `HttpBackend` is the production implementation; tests substitute an
//! in-memory one.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use skills_common::api::{
    BackendErrorBody, ExportRequest, LoginRequest, LoginResponse, TokenResponse,
    VerifyCodeRequest,
};
use skills_common::{FilterState, RecordId, SkillRecord};
use std::time::Duration;
use tracing::debug;

use crate::error::BackendError;

const USER_AGENT: &str = concat!("skills-dash/", env!("CARGO_PKG_VERSION"));

/// Operations the dashboard needs from the skills backend
#[async_trait]
pub trait SkillsBackend: Send + Sync {
    /// `GET /records`
    async fn fetch_records(&self) -> Result<Vec<SkillRecord>, BackendError>;

    /// `PUT /records/{id}` with the full record; returns the stored record
    async fn update_record(&self, record: &SkillRecord) -> Result<SkillRecord, BackendError>;

    /// `DELETE /records/{id}`
    async fn delete_record(&self, id: &RecordId) -> Result<(), BackendError>;

    /// `POST /resetData`
    async fn reset_data(&self) -> Result<(), BackendError>;

    /// `POST /exportPdf`; returns the PDF bytes
    ///
    /// `timeout` bounds the whole request and overrides the client default.
    async fn export_pdf(
        &self,
        records: &[SkillRecord],
        filters: &FilterState,
        timeout: Duration,
    ) -> Result<Vec<u8>, BackendError>;

    /// `POST /login`
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, BackendError>;

    /// `POST /verify-otp`
    async fn verify_code(&self, request: &VerifyCodeRequest) -> Result<TokenResponse, BackendError>;
}

/// reqwest implementation of [`SkillsBackend`]
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn record_url(&self, id: &RecordId) -> String {
        self.url(&format!("/records/{}", id))
    }
}

/// Turn a non-2xx response into `BackendError::Status`, keeping `detail`
async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<BackendErrorBody>(&text)
        .ok()
        .and_then(|body| body.detail_message())
        .unwrap_or_else(|| {
            if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                text
            }
        });

    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let response = check_status(response).await?;
    response
        .json()
        .await
        .map_err(|e| BackendError::Parse(e.to_string()))
}

#[async_trait]
impl SkillsBackend for HttpBackend {
    async fn fetch_records(&self) -> Result<Vec<SkillRecord>, BackendError> {
        let url = self.url("/records");
        debug!(url = %url, "Fetching records");

        let response = self.http_client.get(&url).send().await?;
        let records: Vec<SkillRecord> = read_json(response).await?;

        debug!(count = records.len(), "Fetched records");
        Ok(records)
    }

    async fn update_record(&self, record: &SkillRecord) -> Result<SkillRecord, BackendError> {
        let url = self.record_url(&record.id);
        debug!(url = %url, "Updating record");

        let response = self.http_client.put(&url).json(record).send().await?;
        read_json(response).await
    }

    async fn delete_record(&self, id: &RecordId) -> Result<(), BackendError> {
        let url = self.record_url(id);
        debug!(url = %url, "Deleting record");

        let response = self.http_client.delete(&url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn reset_data(&self) -> Result<(), BackendError> {
        let url = self.url("/resetData");
        debug!(url = %url, "Resetting backend data");

        let response = self.http_client.post(&url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn export_pdf(
        &self,
        records: &[SkillRecord],
        filters: &FilterState,
        timeout: Duration,
    ) -> Result<Vec<u8>, BackendError> {
        let url = self.url("/exportPdf");
        debug!(url = %url, records = records.len(), "Requesting PDF export");

        let response = self
            .http_client
            .post(&url)
            .timeout(timeout)
            .json(&ExportRequest { records, filters })
            .send()
            .await?;
        let response = check_status(response).await?;

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, BackendError> {
        let url = self.url("/login");
        debug!(url = %url, email = %request.email, "Login step 1");

        let response = self.http_client.post(&url).json(request).send().await?;
        read_json(response).await
    }

    async fn verify_code(&self, request: &VerifyCodeRequest) -> Result<TokenResponse, BackendError> {
        let url = self.url("/verify-otp");
        debug!(url = %url, email = %request.email, "Login step 2");

        let response = self.http_client.post(&url).json(request).send().await?;
        read_json(response).await
    }
}

/// True if the backend reported the addressed resource as missing
pub fn is_not_found(err: &BackendError) -> bool {
    err.status() == Some(StatusCode::NOT_FOUND.as_u16())
}
