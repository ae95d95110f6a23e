//! Audit harness: one explicit session object per test.
//!
//! Composes a [`SessionRecorder`], a [`FindingCollector`], a [`RuleEngine`]
//! and an optional [`ReportStore`]. Typical use from a UI test:
//!
//! 1. [`AuditHarness::new`] during test setup.
//! 2. [`AuditHarness::start_analyze`] before driving the UI.
//! 3. [`AuditHarness::observe`] after every UI action.
//! 4. [`AuditHarness::stop_analyze`] at teardown to get the [`Report`].
//! 5. Assert on [`AuditHarness::verify`] or the `aggregator` queries.

use std::sync::Arc;

use a11y_harness_domain::{
    AuditError, RawFinding, Report, ReportId, Result, SessionId, SnapshotId,
};
use tracing::Instrument;

use crate::aggregator::{self, Verdict};
use crate::collector::{FindingCollector, IngestOutcome};
use crate::config::AuditConfig;
use crate::engine::{evaluate_with_timeout, RuleEngine};
use crate::recorder::SessionRecorder;
use crate::store::{FsReportStore, ReportStore};

/// Result of observing one UI action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub snapshot_id: SnapshotId,
    pub outcome: IngestOutcome,
}

pub struct AuditHarness {
    config: AuditConfig,
    engine: Arc<dyn RuleEngine>,
    store: Option<Arc<dyn ReportStore>>,
    recorder: SessionRecorder,
    collector: Option<FindingCollector>,
}

impl AuditHarness {
    /// Create a harness with a validated config and no report store.
    pub fn new(engine: Arc<dyn RuleEngine>, config: AuditConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            engine,
            store: None,
            recorder: SessionRecorder::new(),
            collector: None,
        })
    }

    /// Like [`AuditHarness::new`], attaching an [`FsReportStore`] when the
    /// config names a `report_dir`.
    pub fn from_config(engine: Arc<dyn RuleEngine>, config: AuditConfig) -> Result<Self> {
        let store: Option<Arc<dyn ReportStore>> = match &config.report_dir {
            Some(dir) => Some(Arc::new(FsReportStore::new(dir)?)),
            None => None,
        };
        let mut harness = Self::new(engine, config)?;
        harness.store = store;
        Ok(harness)
    }

    pub fn with_store(mut self, store: Arc<dyn ReportStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn recorder(&self) -> &SessionRecorder {
        &self.recorder
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Start recording; every observed action becomes a snapshot.
    pub fn start_analyze(&mut self) -> Result<SessionId> {
        let session_id = self.recorder.start()?;
        self.collector = Some(FindingCollector::with_filter(
            session_id,
            self.config.filter.clone(),
        ));
        Ok(session_id)
    }

    /// Snapshot the UI state after `action` and run the rule engine on it.
    pub async fn observe(&mut self, action: &str) -> Result<Observation> {
        let snapshot_id = self.recorder.record_action(action)?;
        let snapshot = self
            .recorder
            .snapshot(&snapshot_id)
            .cloned()
            .ok_or(AuditError::UnknownSnapshot(snapshot_id))?;

        let span = tracing::info_span!("a11y.session", session_id = %snapshot_id.session);
        let raw = evaluate_with_timeout(
            self.engine.as_ref(),
            &snapshot,
            self.config.engine_timeout(),
        )
        .instrument(span)
        .await?;

        let outcome = self.ingest(snapshot_id, raw)?;
        Ok(Observation {
            snapshot_id,
            outcome,
        })
    }

    /// Ingest findings produced outside the harness for a recorded snapshot.
    pub fn ingest(&mut self, snapshot_id: SnapshotId, raw: Vec<RawFinding>) -> Result<IngestOutcome> {
        let collector = self
            .collector
            .as_mut()
            .ok_or(AuditError::UnknownSnapshot(snapshot_id))?;
        collector.ingest(&self.recorder, snapshot_id, raw)
    }

    /// Stop recording, finalize the report and persist it if a store is attached.
    ///
    /// Persisting is best effort: a store failure is logged as
    /// `report.store_failed` and the finalized report is still returned.
    pub async fn stop_analyze(&mut self) -> Result<Report> {
        self.recorder.stop()?;
        let collector = self.collector.take().ok_or(AuditError::NotRunning)?;
        let report = collector.finalize(&self.recorder)?;

        if let Some(store) = &self.store {
            match store.put(&report).await {
                Ok(id) => crate::obs::emit_report_stored(&id, store.backend()),
                Err(err) => crate::obs::emit_store_error(report.id(), store.backend(), &err),
            }
        }
        Ok(report)
    }

    /// One-shot audit of the current UI state: start, observe `action`, stop.
    pub async fn analyze(&mut self, action: &str) -> Result<Report> {
        self.start_analyze()?;
        if let Err(err) = self.observe(action).await {
            // Leave the harness idle so the next test can start cleanly.
            self.recorder.stop().ok();
            self.collector = None;
            return Err(err);
        }
        self.stop_analyze().await
    }

    /// Check `report` against the configured critical-issue threshold.
    pub fn verify(&self, report: &Report) -> Result<Verdict> {
        aggregator::evaluate(report, self.config.max_allowed_critical_issues)
    }

    /// Every report in the attached store (empty without a store).
    pub async fn stored_reports(&self) -> Result<Vec<Report>> {
        match &self.store {
            Some(store) => Ok(store.load_all().await?),
            None => Ok(Vec::new()),
        }
    }

    /// Verdict for every stored report, oldest first.
    pub async fn verify_stored(&self) -> Result<Vec<(ReportId, Verdict)>> {
        self.stored_reports()
            .await?
            .iter()
            .map(|report| Ok((report.id().clone(), self.verify(report)?)))
            .collect()
    }
}
