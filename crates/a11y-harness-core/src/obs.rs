//! Structured observability hooks for audit session lifecycle events.
//!
//! This module provides:
//! - Session-scoped tracing spans via `SessionSpan` RAII guard
//! - Emission functions for lifecycle events: start, snapshot, ingest, stop,
//!   finalize, verdict, engine failure
//!
//! Every event carries a stable `event` field (e.g. `session.started`).
//! Lifecycle events are emitted at `info!`, per-snapshot detail at `debug!`,
//! and recoverable problems at `warn!`.

use a11y_harness_domain::{MalformedReason, Report, ReportId, SessionId, SnapshotId};
use tracing::{debug, info, warn};

use crate::aggregator::Verdict;

/// RAII guard that enters a session-scoped tracing span.
///
/// # Example
///
/// ```ignore
/// let _span = SessionSpan::enter(&session_id);
/// // every event below is associated with session_id
/// ```
pub struct SessionSpan {
    _span: tracing::span::EnteredSpan,
}

impl SessionSpan {
    pub fn enter(session_id: &SessionId) -> Self {
        let span = tracing::info_span!("a11y.session", session_id = %session_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_session_started(session_id: &SessionId) {
    info!(event = "session.started", session_id = %session_id);
}

pub fn emit_snapshot_recorded(snapshot_id: &SnapshotId, action: &str, offset_ms: u64) {
    debug!(
        event = "session.snapshot_recorded",
        snapshot_id = %snapshot_id,
        action = %action,
        offset_ms = offset_ms,
    );
}

pub fn emit_session_stopped(session_id: &SessionId, snapshot_count: usize) {
    info!(
        event = "session.stopped",
        session_id = %session_id,
        snapshot_count = snapshot_count,
    );
}

pub fn emit_findings_ingested(
    snapshot_id: &SnapshotId,
    accepted: usize,
    filtered: usize,
    malformed: usize,
) {
    debug!(
        event = "findings.ingested",
        snapshot_id = %snapshot_id,
        accepted = accepted,
        filtered = filtered,
        malformed = malformed,
    );
}

/// Warn-level: a raw finding was discarded during normalization.
pub fn emit_malformed_finding(snapshot_id: &SnapshotId, index: usize, reason: &MalformedReason) {
    warn!(
        event = "findings.malformed",
        snapshot_id = %snapshot_id,
        index = index,
        reason = %reason,
    );
}

pub fn emit_report_finalized(report: &Report) {
    info!(
        event = "report.finalized",
        report_id = %report.id().short(),
        session_id = %report.session_id(),
        snapshots = report.snapshots().len(),
        findings = report.len(),
        warnings = report.warnings().len(),
    );
}

pub fn emit_verdict(report_id: &ReportId, verdict: &Verdict) {
    info!(
        event = "report.verdict",
        report_id = %report_id.short(),
        critical_count = verdict.critical_count,
        max_critical_allowed = verdict.max_critical_allowed,
        passed = verdict.passed,
    );
}

/// Warn-level: the rule engine failed or timed out for a snapshot.
pub fn emit_engine_error(snapshot_id: &SnapshotId, engine: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "engine.error",
        snapshot_id = %snapshot_id,
        engine = %engine,
        error = %error,
    );
}

pub fn emit_report_stored(report_id: &ReportId, backend: &str) {
    info!(event = "report.stored", report_id = %report_id.short(), backend = %backend);
}

/// Warn-level: a finalized report could not be persisted.
pub fn emit_store_error(report_id: &ReportId, backend: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "report.store_failed",
        report_id = %report_id.short(),
        backend = %backend,
        error = %error,
    );
}

/// Warn-level: a stored report failed to load and was left out of a listing.
pub fn emit_report_skipped(path: &str, reason: &str) {
    warn!(event = "report.skipped", path = %path, reason = %reason);
}
