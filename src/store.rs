//! Report store contract.
//!
//! A record is created `Pending` before any work starts and must end up
//! either `Ready` (with the rendered payload) or `Failed` (with a reason).

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a stored report record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a stored report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    Ready,
    Failed { reason: String },
}

/// Errors raised by a report store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Report store write failed: {0}")]
    Write(String),

    #[error("Unknown report record: {0}")]
    UnknownRecord(RecordId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persists report records and their rendered payloads.
pub trait ReportStore: Send + Sync {
    /// Create a `Pending` record for a document about to be produced.
    fn create_pending(&self, filename: &str, mime_type: &str) -> StoreResult<RecordId>;

    /// Attach the rendered payload and mark the record `Ready`.
    fn mark_ready(&self, id: RecordId, payload: Vec<u8>) -> StoreResult<()>;

    /// Mark the record `Failed` so it does not stay pending forever.
    fn mark_failed(&self, id: RecordId, reason: &str) -> StoreResult<()>;
}

/// A stored report record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReport {
    pub filename: String,
    pub mime_type: String,
    pub status: ReportStatus,
    pub payload: Option<Vec<u8>>,
}

/// Report store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    records: Mutex<HashMap<RecordId, StoredReport>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a record.
    pub fn get(&self, id: RecordId) -> Option<StoredReport> {
        self.records.lock().ok()?.get(&id).cloned()
    }

    /// Snapshot of every record.
    pub fn records(&self) -> Vec<(RecordId, StoredReport)> {
        self.records
            .lock()
            .map(|records| {
                records
                    .iter()
                    .map(|(id, record)| (*id, record.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update(&self, id: RecordId, apply: impl FnOnce(&mut StoredReport)) -> StoreResult<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StoreError::Write("report store lock poisoned".to_string()))?;
        let record = records.get_mut(&id).ok_or(StoreError::UnknownRecord(id))?;
        apply(record);
        Ok(())
    }
}

impl ReportStore for MemoryReportStore {
    fn create_pending(&self, filename: &str, mime_type: &str) -> StoreResult<RecordId> {
        let id = RecordId::new();
        let mut records = self
            .records
            .lock()
            .map_err(|_| StoreError::Write("report store lock poisoned".to_string()))?;
        records.insert(
            id,
            StoredReport {
                filename: filename.to_string(),
                mime_type: mime_type.to_string(),
                status: ReportStatus::Pending,
                payload: None,
            },
        );
        Ok(id)
    }

    fn mark_ready(&self, id: RecordId, payload: Vec<u8>) -> StoreResult<()> {
        self.update(id, |record| {
            record.status = ReportStatus::Ready;
            record.payload = Some(payload);
        })
    }

    fn mark_failed(&self, id: RecordId, reason: &str) -> StoreResult<()> {
        self.update(id, |record| {
            record.status = ReportStatus::Failed {
                reason: reason.to_string(),
            };
        })
    }
}
