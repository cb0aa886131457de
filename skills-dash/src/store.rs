//! Record Store
//!
//! Holds the full, unfiltered record set and mediates every change to it.
//! The backend is the source of truth:
//!
//! - `refresh` replaces the set wholesale; the newest request wins.
//! - `update` is optimistic and rolls back exactly on failure.
//! - `remove` only drops a record after the backend confirms.
//! - `reset_to_default` resets the backend, then refreshes.
//!
//! The record lock is never held across a backend call.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use skills_common::{RecordId, SkillRecord};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::backend::{is_not_found, SkillsBackend};
use crate::error::{BackendError, FetchError, PersistError, ResetError};

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<SkillRecord>,
    /// Ticket of the refresh whose result is currently installed
    applied_ticket: u64,
    last_refreshed: Option<DateTime<Utc>>,
}

/// In-memory record set backed by a [`SkillsBackend`]
pub struct RecordStore {
    backend: Arc<dyn SkillsBackend>,
    state: RwLock<StoreState>,
    next_ticket: AtomicU64,
    /// Ids with an outstanding edit or delete
    in_flight: Mutex<HashSet<RecordId>>,
}

/// Marks a record busy until dropped
struct EditGuard<'a> {
    in_flight: &'a Mutex<HashSet<RecordId>>,
    id: RecordId,
}

impl Drop for EditGuard<'_> {
    fn drop(&mut self) {
        let mut ids = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        ids.remove(&self.id);
    }
}

impl RecordStore {
    pub fn new(backend: Arc<dyn SkillsBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(StoreState::default()),
            next_ticket: AtomicU64::new(0),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    // ========================================
    // Reads
    // ========================================

    /// Clone of the current record set
    pub async fn snapshot(&self) -> Vec<SkillRecord> {
        self.state.read().await.records.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }

    pub async fn get(&self, id: &RecordId) -> Option<SkillRecord> {
        self.state
            .read()
            .await
            .records
            .iter()
            .find(|r| &r.id == id)
            .cloned()
    }

    /// Resolve a textual id (e.g. a URL path segment) to a stored record's id
    ///
    /// Matches on the rendered form, so `"7"` finds a record whether the
    /// backend sent `7` or `"7"`.
    pub async fn find_id(&self, text: &str) -> Option<RecordId> {
        self.state
            .read()
            .await
            .records
            .iter()
            .find(|r| r.id.to_string() == text)
            .map(|r| r.id.clone())
    }

    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_refreshed
    }

    // ========================================
    // Refresh
    // ========================================

    /// Replace the local set with the backend's
    ///
    /// On failure the previous set is kept. If a newer refresh has already
    /// been applied by the time this one returns, this result is discarded
    /// and the current set is returned instead.
    pub async fn refresh(&self) -> Result<Vec<SkillRecord>, FetchError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(ticket, "Refreshing records");

        let fetched = match self.backend.fetch_records().await {
            Ok(records) => records,
            Err(e) => {
                warn!(ticket, "Refresh failed, keeping previous records: {}", e);
                return Err(FetchError(e));
            }
        };

        let mut state = self.state.write().await;
        if ticket < state.applied_ticket {
            debug!(
                ticket,
                applied = state.applied_ticket,
                "Discarding stale refresh result"
            );
            return Ok(state.records.clone());
        }

        state.records = fetched;
        state.applied_ticket = ticket;
        state.last_refreshed = Some(Utc::now());
        info!(count = state.records.len(), "Records refreshed");
        Ok(state.records.clone())
    }

    // ========================================
    // Mutations
    // ========================================

    fn begin_edit(&self, id: &RecordId) -> Result<EditGuard<'_>, PersistError> {
        if id.is_synthetic() {
            return Err(PersistError::NoServerIdentity(id.clone()));
        }
        let mut ids = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !ids.insert(id.clone()) {
            return Err(PersistError::EditInProgress(id.clone()));
        }
        Ok(EditGuard {
            in_flight: &self.in_flight,
            id: id.clone(),
        })
    }

    /// Optimistically apply `patch` (wire field names) to one record
    ///
    /// The local copy changes immediately; the full patched record is then
    /// sent to the backend. On success the backend's echo replaces the local
    /// copy. On failure the record is restored to its pre-update value,
    /// unless a refresh has replaced it in the meantime.
    pub async fn update(
        &self,
        id: &RecordId,
        patch: &Map<String, Value>,
    ) -> Result<SkillRecord, PersistError> {
        let _guard = self.begin_edit(id)?;

        let (original, patched) = {
            let mut state = self.state.write().await;
            let slot = state
                .records
                .iter_mut()
                .find(|r| &r.id == id)
                .ok_or_else(|| PersistError::NotFound(id.clone()))?;
            let original = slot.clone();
            let patched = original
                .patched(patch)
                .map_err(|e| PersistError::InvalidPatch(e.to_string()))?;
            *slot = patched.clone();
            (original, patched)
        };
        debug!(id = %id, "Applied optimistic update");

        match self.backend.update_record(&patched).await {
            Ok(mut saved) => {
                saved.id = id.clone();
                let mut state = self.state.write().await;
                if let Some(slot) = state.records.iter_mut().find(|r| &r.id == id) {
                    *slot = saved.clone();
                }
                info!(id = %id, "Record updated");
                Ok(saved)
            }
            Err(e) => {
                let mut state = self.state.write().await;
                // A refresh may have replaced the record meanwhile; only undo our own write
                if let Some(slot) = state.records.iter_mut().find(|r| &r.id == id) {
                    if *slot == patched {
                        *slot = original;
                    }
                }
                warn!(id = %id, "Update rejected, rolled back: {}", e);
                Err(persist_error(id, e))
            }
        }
    }

    /// Delete a record once the backend confirms
    pub async fn remove(&self, id: &RecordId) -> Result<(), PersistError> {
        let _guard = self.begin_edit(id)?;

        if self.get(id).await.is_none() {
            return Err(PersistError::NotFound(id.clone()));
        }

        if let Err(e) = self.backend.delete_record(id).await {
            warn!(id = %id, "Delete rejected: {}", e);
            return Err(persist_error(id, e));
        }

        self.state.write().await.records.retain(|r| &r.id != id);
        info!(id = %id, "Record deleted");
        Ok(())
    }

    /// Reset the backend dataset to its defaults and reload it
    pub async fn reset_to_default(&self) -> Result<Vec<SkillRecord>, ResetError> {
        if let Err(e) = self.backend.reset_data().await {
            warn!("Reset rejected: {}", e);
            return Err(PersistError::Backend(e).into());
        }
        info!("Backend data reset to defaults");
        Ok(self.refresh().await?)
    }
}

fn persist_error(id: &RecordId, e: BackendError) -> PersistError {
    if is_not_found(&e) {
        PersistError::NotFound(id.clone())
    } else {
        PersistError::Backend(e)
    }
}
