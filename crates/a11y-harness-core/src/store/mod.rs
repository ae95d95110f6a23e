//! Persistence for finalized reports.
//!
//! A harness with a store attached persists every report it finalizes, so
//! that all stored reports can later be listed and verified together.

pub mod fs;
pub mod memory;

use a11y_harness_domain::{AuditError, Report, ReportId};
use async_trait::async_trait;
use thiserror::Error;

pub use fs::FsReportStore;
pub use memory::MemoryReportStore;

/// Errors from report store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("report not found: {0}")]
    NotFound(ReportId),

    #[error("corrupt report at {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for AuditError {
    fn from(err: StoreError) -> Self {
        AuditError::Store(err.to_string())
    }
}

/// Backend-agnostic report storage.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Backend name used in logs.
    fn backend(&self) -> &str;

    /// Persist `report`. Storing the same report twice is a no-op.
    async fn put(&self, report: &Report) -> StoreResult<ReportId>;

    /// Load one report by id.
    async fn get(&self, id: &ReportId) -> StoreResult<Report>;

    /// Ids of all stored reports, oldest finalization first.
    async fn list(&self) -> StoreResult<Vec<ReportId>>;

    /// All stored reports, oldest finalization first.
    async fn load_all(&self) -> StoreResult<Vec<Report>> {
        let mut reports = Vec::new();
        for id in self.list().await? {
            reports.push(self.get(&id).await?);
        }
        Ok(reports)
    }
}
