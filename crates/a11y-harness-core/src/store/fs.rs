use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use a11y_harness_domain::{Report, ReportId};
use async_trait::async_trait;
use tempfile::NamedTempFile;

use super::{ReportStore, StoreError, StoreResult};

/// Filesystem-backed report store.
///
/// Layout: `<root>/reports/<report-id>.json`. Reports are verified against
/// their digest when loaded. [`FsReportStore::get`] reports a corrupt file
/// as [`StoreError::Corrupt`]; listings skip it with a warning so that one
/// bad file does not hide every other report.
pub struct FsReportStore {
    reports_dir: PathBuf,
}

impl FsReportStore {
    /// Create a store rooted at `root`. Creates `root/reports/` if needed.
    pub fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let reports_dir = root.as_ref().join("reports");
        fs::create_dir_all(&reports_dir)?;
        Ok(Self { reports_dir })
    }

    fn report_path(&self, id: &ReportId) -> PathBuf {
        self.reports_dir.join(format!("{}.json", id))
    }

    fn read_report(&self, path: &Path) -> StoreResult<Report> {
        let data = fs::read(path)?;
        let report: Report = serde_json::from_slice(&data).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        report.verify().map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(report)
    }

    fn read_all(&self) -> StoreResult<Vec<Report>> {
        let mut reports = Vec::new();
        for entry in fs::read_dir(&self.reports_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_report(&path) {
                Ok(report) => reports.push(report),
                Err(StoreError::Corrupt { path, reason }) => {
                    crate::obs::emit_report_skipped(&path, &reason);
                }
                Err(err) => return Err(err),
            }
        }
        reports.sort_by(|a, b| {
            a.finalized_at()
                .cmp(&b.finalized_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(reports)
    }
}

#[async_trait]
impl ReportStore for FsReportStore {
    fn backend(&self) -> &str {
        "fs"
    }

    async fn put(&self, report: &Report) -> StoreResult<ReportId> {
        let path = self.report_path(report.id());
        if path.exists() {
            return Ok(report.id().clone());
        }

        // Atomic write: temp file in the same directory, then rename.
        let content = serde_json::to_vec_pretty(report)?;
        let mut tmp = NamedTempFile::new_in(&self.reports_dir)?;
        tmp.write_all(&content)?;
        tmp.persist(&path).map_err(|e| e.error)?;

        Ok(report.id().clone())
    }

    async fn get(&self, id: &ReportId) -> StoreResult<Report> {
        let path = self.report_path(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.read_report(&path)
    }

    async fn list(&self) -> StoreResult<Vec<ReportId>> {
        Ok(self.read_all()?.iter().map(|r| r.id().clone()).collect())
    }

    async fn load_all(&self) -> StoreResult<Vec<Report>> {
        self.read_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a11y_harness_domain::SessionId;

    fn make_store() -> (tempfile::TempDir, FsReportStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsReportStore::new(dir.path()).unwrap();
        (dir, store)
    }

    fn empty_report() -> Report {
        Report::new(SessionId::new(), Vec::new(), Vec::new(), Vec::new())
    }

    #[tokio::test]
    async fn report_roundtrip() {
        let (_dir, store) = make_store();
        let report = empty_report();
        let id = store.put(&report).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap(), report);
    }

    #[tokio::test]
    async fn put_writes_single_file() {
        let (dir, store) = make_store();
        let report = empty_report();
        store.put(&report).await.unwrap();
        store.put(&report).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("reports"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_returns_not_found() {
        let (_dir, store) = make_store();
        let report = empty_report();
        match store.get(report.id()).await {
            Err(StoreError::NotFound(id)) => assert_eq!(&id, report.id()),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn tampered_file_is_corrupt() {
        let (dir, store) = make_store();
        let report = empty_report();
        let id = store.put(&report).await.unwrap();

        let path = dir.path().join("reports").join(format!("{}.json", id));
        let mut value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        value["session_id"] = serde_json::json!(SessionId::new());
        std::fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert!(matches!(
            store.get(&id).await,
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn list_follows_finalization_order() {
        let (_dir, store) = make_store();
        let mut expected = Vec::new();
        for _ in 0..20 {
            let report = empty_report();
            expected.push(store.put(&report).await.unwrap());
            // finalized_at must differ even on coarse clocks
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        assert_eq!(store.list().await.unwrap(), expected);

        let loaded: Vec<_> = store
            .load_all()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id().clone())
            .collect();
        assert_eq!(loaded, expected);
    }

    #[tokio::test]
    async fn corrupt_file_is_skipped_by_listing() {
        let (dir, store) = make_store();
        let kept = store.put(&empty_report()).await.unwrap();
        let broken = store.put(&empty_report()).await.unwrap();

        let path = dir.path().join("reports").join(format!("{}.json", broken));
        std::fs::write(&path, b"{ not json").unwrap();

        assert_eq!(store.list().await.unwrap(), vec![kept.clone()]);
        assert_eq!(store.load_all().await.unwrap().len(), 1);
        assert!(matches!(
            store.get(&broken).await,
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn non_json_files_are_ignored() {
        let (dir, store) = make_store();
        std::fs::write(dir.path().join("reports").join("README"), "notes").unwrap();
        store.put(&empty_report()).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
