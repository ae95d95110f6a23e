use std::sync::Mutex;

use a11y_harness_domain::{Report, ReportId};
use async_trait::async_trait;

use super::{ReportStore, StoreError, StoreResult};

/// In-memory report store; insertion order is finalization order.
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    reports: Mutex<Vec<Report>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "report store mutex poisoned",
    ))
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn put(&self, report: &Report) -> StoreResult<ReportId> {
        let mut reports = self.reports.lock().map_err(|_| poisoned())?;
        if !reports.iter().any(|r| r.id() == report.id()) {
            reports.push(report.clone());
        }
        Ok(report.id().clone())
    }

    async fn get(&self, id: &ReportId) -> StoreResult<Report> {
        let reports = self.reports.lock().map_err(|_| poisoned())?;
        reports
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn list(&self) -> StoreResult<Vec<ReportId>> {
        let reports = self.reports.lock().map_err(|_| poisoned())?;
        Ok(reports.iter().map(|r| r.id().clone()).collect())
    }

    async fn load_all(&self) -> StoreResult<Vec<Report>> {
        let reports = self.reports.lock().map_err(|_| poisoned())?;
        Ok(reports.clone())
    }
}
