//! PDF export of the current filtered view
//!
//! Rendering happens on the backend. This module refuses empty exports,
//! bounds the request by a fixed ceiling and names the resulting file.

use chrono::{Local, NaiveDate};
use skills_common::{FilterState, SkillRecord};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::backend::SkillsBackend;
use crate::error::{BackendError, ExportError};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A generated PDF ready to download
#[derive(Debug, Clone, PartialEq)]
pub struct PdfDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// `skills_matrix_YYYY-MM-DD.pdf`
///
/// ```
/// use chrono::NaiveDate;
/// use skills_dash::export::export_filename;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
/// assert_eq!(export_filename(date), "skills_matrix_2024-03-07.pdf");
/// ```
pub fn export_filename(date: NaiveDate) -> String {
    format!("skills_matrix_{}.pdf", date.format("%Y-%m-%d"))
}

pub struct PdfExporter {
    backend: Arc<dyn SkillsBackend>,
    timeout: Duration,
}

impl PdfExporter {
    pub fn new(backend: Arc<dyn SkillsBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Generate a PDF of `records` as filtered by `filters`
    pub async fn export(
        &self,
        records: &[SkillRecord],
        filters: &FilterState,
    ) -> Result<PdfDocument, ExportError> {
        if records.is_empty() {
            return Err(ExportError::NoData);
        }

        info!(records = records.len(), "Generating PDF export");
        let request = self.backend.export_pdf(records, filters, self.timeout);

        let bytes = match tokio::time::timeout(self.timeout, request).await {
            Err(_) | Ok(Err(BackendError::Timeout)) => {
                warn!("PDF export timed out after {:?}", self.timeout);
                return Err(ExportError::Timeout(self.timeout));
            }
            Ok(Err(BackendError::Status { message, .. })) => {
                warn!("PDF export rejected: {}", message);
                return Err(ExportError::Rejected(message));
            }
            Ok(Err(e)) => {
                warn!("PDF export failed: {}", e);
                return Err(ExportError::Backend(e));
            }
            Ok(Ok(bytes)) => bytes,
        };

        let filename = export_filename(Local::now().date_naive());
        info!(filename = %filename, size = bytes.len(), "PDF export ready");
        Ok(PdfDocument { filename, bytes })
    }
}
