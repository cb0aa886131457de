//! In-memory skills backend
//!
//! Holds its own copy of the record set and answers like the real API. Tests
//! inject failures and latency through the setter methods. The internal lock
//! is never held across a sleep.

use async_trait::async_trait;
use skills_common::api::{LoginRequest, LoginResponse, TokenResponse, VerifyCodeRequest};
use skills_common::{FilterState, RecordId, SkillRecord};
use skills_dash::backend::SkillsBackend;
use skills_dash::error::BackendError;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub const FAKE_PDF: &[u8] = b"%PDF-1.4 fake";
pub const VALID_OTP: &str = "123456";

#[derive(Default)]
struct Inner {
    records: Vec<SkillRecord>,
    defaults: Vec<SkillRecord>,
    fetch_failures: usize,
    fetch_delays: VecDeque<Duration>,
    write_failure: Option<String>,
    update_delay: Option<Duration>,
    delete_calls: usize,
    export_delay: Option<Duration>,
    export_failure: Option<(u16, String)>,
    exported: Vec<(usize, FilterState)>,
    users: Vec<(String, String)>,
}

#[derive(Default)]
pub struct FakeBackend {
    inner: Mutex<Inner>,
}

fn status(status: u16, message: &str) -> BackendError {
    BackendError::Status {
        status,
        message: message.to_string(),
    }
}

impl FakeBackend {
    pub fn with_records(records: Vec<SkillRecord>) -> Self {
        let backend = Self::default();
        {
            let mut inner = backend.inner.lock().unwrap();
            inner.defaults = records.clone();
            inner.records = records;
        }
        backend
    }

    pub fn with_user(self, email: &str, password: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .users
            .push((email.to_string(), password.to_string()));
        self
    }

    pub fn records(&self) -> Vec<SkillRecord> {
        self.inner.lock().unwrap().records.clone()
    }

    pub fn set_records(&self, records: Vec<SkillRecord>) {
        self.inner.lock().unwrap().records = records;
    }

    pub fn set_defaults(&self, records: Vec<SkillRecord>) {
        self.inner.lock().unwrap().defaults = records;
    }

    pub fn remove_remote(&self, id: &RecordId) {
        self.inner.lock().unwrap().records.retain(|r| &r.id != id);
    }

    pub fn fail_next_fetch(&self) {
        self.inner.lock().unwrap().fetch_failures += 1;
    }

    /// Delay the next fetch; queued delays apply in call order
    pub fn push_fetch_delay(&self, delay: Duration) {
        self.inner.lock().unwrap().fetch_delays.push_back(delay);
    }

    /// Make updates, deletes and resets fail with a 500 and `message`
    pub fn fail_writes(&self, message: &str) {
        self.inner.lock().unwrap().write_failure = Some(message.to_string());
    }

    pub fn allow_writes(&self) {
        self.inner.lock().unwrap().write_failure = None;
    }

    pub fn set_update_delay(&self, delay: Duration) {
        self.inner.lock().unwrap().update_delay = Some(delay);
    }

    pub fn delete_calls(&self) -> usize {
        self.inner.lock().unwrap().delete_calls
    }

    pub fn set_export_delay(&self, delay: Duration) {
        self.inner.lock().unwrap().export_delay = Some(delay);
    }

    pub fn fail_export(&self, status: u16, detail: &str) {
        self.inner.lock().unwrap().export_failure = Some((status, detail.to_string()));
    }

    /// Record count and filters of each completed export request
    pub fn exports(&self) -> Vec<(usize, FilterState)> {
        self.inner.lock().unwrap().exported.clone()
    }
}

#[async_trait]
impl SkillsBackend for FakeBackend {
    async fn fetch_records(&self) -> Result<Vec<SkillRecord>, BackendError> {
        // Snapshot at request time so a slow response carries old data
        let (result, delay) = {
            let mut inner = self.inner.lock().unwrap();
            let delay = inner.fetch_delays.pop_front();
            if inner.fetch_failures > 0 {
                inner.fetch_failures -= 1;
                (Err(status(503, "Service unavailable")), delay)
            } else {
                (Ok(inner.records.clone()), delay)
            }
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn update_record(&self, record: &SkillRecord) -> Result<SkillRecord, BackendError> {
        let delay = self.inner.lock().unwrap().update_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock().unwrap();
        if let Some(message) = &inner.write_failure {
            return Err(status(500, message));
        }
        let slot = inner
            .records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| status(404, "Record not found"))?;
        *slot = record.clone();
        Ok(slot.clone())
    }

    async fn delete_record(&self, id: &RecordId) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().unwrap();
        inner.delete_calls += 1;
        if let Some(message) = &inner.write_failure {
            return Err(status(500, message));
        }
        let before = inner.records.len();
        inner.records.retain(|r| &r.id != id);
        if inner.records.len() == before {
            return Err(status(404, "Record not found"));
        }
        Ok(())
    }

    async fn reset_data(&self) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(message) = &inner.write_failure {
            return Err(status(500, message));
        }
        inner.records = inner.defaults.clone();
        Ok(())
    }

    async fn export_pdf(
        &self,
        records: &[SkillRecord],
        filters: &FilterState,
        _timeout: Duration,
    ) -> Result<Vec<u8>, BackendError> {
        let (delay, failure) = {
            let inner = self.inner.lock().unwrap();
            (inner.export_delay, inner.export_failure.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((code, detail)) = failure {
            return Err(status(code, &detail));
        }
        self.inner
            .lock()
            .unwrap()
            .exported
            .push((records.len(), filters.clone()));
        Ok(FAKE_PDF.to_vec())
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, BackendError> {
        let inner = self.inner.lock().unwrap();
        let known = inner
            .users
            .iter()
            .any(|(email, password)| *email == request.email && *password == request.password);
        if !known {
            return Err(status(401, "Invalid credentials"));
        }
        Ok(LoginResponse {
            message: "OTP sent to email".to_string(),
        })
    }

    async fn verify_code(&self, request: &VerifyCodeRequest) -> Result<TokenResponse, BackendError> {
        if request.otp != VALID_OTP {
            return Err(status(400, "Invalid OTP"));
        }
        Ok(TokenResponse {
            access_token: format!("token-for-{}", request.email),
            token_type: "bearer".to_string(),
        })
    }
}
