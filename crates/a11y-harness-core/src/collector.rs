//! Finding collector: normalizes raw engine output into a session report.
//!
//! Normalization maps each raw finding onto the closed [`Severity`] and
//! [`IssueType`] enumerations. Entries that do not map are kept as
//! [`MalformedFinding`] warnings; they never abort ingestion.

use std::collections::BTreeMap;

use a11y_harness_domain::{
    AuditError, Finding, IssueType, MalformedFinding, MalformedReason, RawFinding, Report, Result,
    SessionId, Severity, SnapshotId,
};

use crate::config::IssueFilter;
use crate::recorder::SessionRecorder;

/// Per-batch ingestion tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Normalized findings added to the report
    pub accepted: usize,
    /// Well-formed findings dropped by the issue filter
    pub filtered: usize,
    /// Entries recorded as `MalformedFinding` warnings
    pub malformed: usize,
}

/// Collects findings for exactly one session.
#[derive(Debug)]
pub struct FindingCollector {
    session_id: SessionId,
    filter: IssueFilter,
    findings: Vec<Finding>,
    warnings: Vec<MalformedFinding>,
    /// Next discovery ordinal per snapshot seq
    ordinals: BTreeMap<u32, u32>,
}

impl FindingCollector {
    /// Create a collector bound to `session_id` that admits every issue type.
    pub fn new(session_id: SessionId) -> Self {
        Self::with_filter(session_id, IssueFilter::all())
    }

    pub fn with_filter(session_id: SessionId, filter: IssueFilter) -> Self {
        FindingCollector {
            session_id,
            filter,
            findings: Vec::new(),
            warnings: Vec::new(),
            ordinals: BTreeMap::new(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Findings ingested so far, in ingestion order.
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn warnings(&self) -> &[MalformedFinding] {
        &self.warnings
    }

    /// Normalize `raw` findings attributed to `snapshot_id`.
    ///
    /// Fails with `UnknownSnapshot` when the snapshot was not produced by
    /// `recorder` for this collector's session.
    pub fn ingest<I>(
        &mut self,
        recorder: &SessionRecorder,
        snapshot_id: SnapshotId,
        raw: I,
    ) -> Result<IngestOutcome>
    where
        I: IntoIterator<Item = RawFinding>,
    {
        if snapshot_id.session != self.session_id || recorder.snapshot(&snapshot_id).is_none() {
            return Err(AuditError::UnknownSnapshot(snapshot_id));
        }

        let mut outcome = IngestOutcome::default();
        for (index, raw) in raw.into_iter().enumerate() {
            let (severity, issue_type) = match normalize(&raw) {
                Ok(tags) => tags,
                Err(reason) => {
                    crate::obs::emit_malformed_finding(&snapshot_id, index, &reason);
                    self.warnings.push(MalformedFinding {
                        snapshot_id,
                        index,
                        reason,
                    });
                    outcome.malformed += 1;
                    continue;
                }
            };

            if !self.filter.allows(issue_type) {
                outcome.filtered += 1;
                continue;
            }

            let ordinal = self.ordinals.entry(snapshot_id.seq).or_insert(0);
            self.findings.push(Finding {
                snapshot_id,
                ordinal: *ordinal,
                severity,
                issue_type,
                description: raw.description,
                element: raw.element,
            });
            *ordinal += 1;
            outcome.accepted += 1;
        }

        crate::obs::emit_findings_ingested(
            &snapshot_id,
            outcome.accepted,
            outcome.filtered,
            outcome.malformed,
        );
        Ok(outcome)
    }

    /// Produce the immutable report for this session.
    ///
    /// Requires the recorder to be idle and still holding this session.
    pub fn finalize(mut self, recorder: &SessionRecorder) -> Result<Report> {
        let _span = crate::obs::SessionSpan::enter(&self.session_id);
        match recorder.session_id() {
            Some(current) if current == self.session_id => {}
            other => {
                return Err(AuditError::SessionMismatch {
                    expected: self.session_id,
                    actual: other.map_or_else(|| "none".to_string(), |s| s.to_string()),
                })
            }
        }
        if recorder.is_recording() {
            return Err(AuditError::SessionNotStopped(self.session_id));
        }

        let snapshots = recorder.snapshots().to_vec();
        self.findings.sort_by_key(|f| {
            let offset = snapshots
                .get(f.snapshot_id.seq as usize)
                .map_or(u64::MAX, |s| s.offset_ms);
            (offset, f.snapshot_id.seq, f.ordinal)
        });

        let report = Report::new(self.session_id, snapshots, self.findings, self.warnings);
        crate::obs::emit_report_finalized(&report);
        Ok(report)
    }
}

fn normalize(raw: &RawFinding) -> std::result::Result<(Severity, IssueType), MalformedReason> {
    let severity = raw
        .severity
        .parse::<Severity>()
        .map_err(|_| MalformedReason::UnknownSeverity(raw.severity.clone()))?;
    let issue_type = raw
        .issue_type
        .parse::<IssueType>()
        .map_err(|_| MalformedReason::UnknownIssueType(raw.issue_type.clone()))?;
    Ok((severity, issue_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> (SessionRecorder, SessionId) {
        let mut recorder = SessionRecorder::new();
        let session = recorder.start().expect("start");
        (recorder, session)
    }

    #[test]
    fn test_normalize_accepts_known_tags() {
        let raw = RawFinding::new("Critical", "colorContrast", "ratio 1.8:1");
        assert_eq!(
            normalize(&raw),
            Ok((Severity::Critical, IssueType::ColorContrast))
        );
    }

    #[test]
    fn test_normalize_reports_severity_first() {
        let raw = RawFinding::new("urgent", "nonsense", "");
        assert_eq!(
            normalize(&raw),
            Err(MalformedReason::UnknownSeverity("urgent".to_string()))
        );
    }

    #[test]
    fn test_ingest_unknown_snapshot() {
        let (recorder, session) = started();
        let mut collector = FindingCollector::new(session);
        let bogus = SnapshotId::new(session, 7);
        match collector.ingest(&recorder, bogus, Vec::new()) {
            Err(AuditError::UnknownSnapshot(id)) => assert_eq!(id, bogus),
            other => panic!("expected UnknownSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn test_ingest_foreign_session_snapshot() {
        let (mut recorder, _session) = started();
        let snap = recorder.record_action("launch").expect("record");
        let mut collector = FindingCollector::new(SessionId::new());
        assert!(matches!(
            collector.ingest(&recorder, snap, Vec::new()),
            Err(AuditError::UnknownSnapshot(_))
        ));
    }

    #[test]
    fn test_ingest_keeps_going_past_malformed() {
        let (mut recorder, session) = started();
        let snap = recorder.record_action("launch").expect("record");
        let mut collector = FindingCollector::new(session);

        let outcome = collector
            .ingest(
                &recorder,
                snap,
                vec![
                    RawFinding::new("minor", "missing-label", "button has no label"),
                    RawFinding::new("catastrophic", "missing-label", "bad severity"),
                    RawFinding::new("major", "wobbly-pixels", "bad issue type"),
                    RawFinding::new("major", "tappableArea", "28x28pt target"),
                ],
            )
            .expect("ingest");

        assert_eq!(
            outcome,
            IngestOutcome {
                accepted: 2,
                filtered: 0,
                malformed: 2
            }
        );
        assert_eq!(collector.warnings()[0].index, 1);
        assert_eq!(
            collector.warnings()[1].reason,
            MalformedReason::UnknownIssueType("wobbly-pixels".to_string())
        );
        let ordinals: Vec<u32> = collector.findings().iter().map(|f| f.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1]);
    }

    #[test]
    fn test_filter_drops_out_of_scope_types() {
        let (mut recorder, session) = started();
        let snap = recorder.record_action("launch").expect("record");
        let mut collector =
            FindingCollector::with_filter(session, IssueFilter::only([IssueType::ColorContrast]));

        let outcome = collector
            .ingest(
                &recorder,
                snap,
                vec![
                    RawFinding::new("minor", "color-contrast", "kept"),
                    RawFinding::new("minor", "missing-label", "dropped"),
                ],
            )
            .expect("ingest");

        assert_eq!(outcome.accepted, 1);
        assert_eq!(outcome.filtered, 1);
        assert!(collector.warnings().is_empty());
    }

    #[test]
    fn test_finalize_while_recording_fails() {
        let (recorder, session) = started();
        let collector = FindingCollector::new(session);
        match collector.finalize(&recorder) {
            Err(AuditError::SessionNotStopped(id)) => assert_eq!(id, session),
            other => panic!("expected SessionNotStopped, got {other:?}"),
        }
    }

    #[test]
    fn test_finalize_after_restart_is_mismatch() {
        let (mut recorder, session) = started();
        recorder.stop().expect("stop");
        recorder.start().expect("restart");
        recorder.stop().expect("stop again");

        let collector = FindingCollector::new(session);
        assert!(matches!(
            collector.finalize(&recorder),
            Err(AuditError::SessionMismatch { .. })
        ));
    }

    #[test]
    fn test_late_ingest_after_stop_is_accepted() {
        let (mut recorder, session) = started();
        let snap = recorder.record_action("launch").expect("record");
        recorder.stop().expect("stop");

        let mut collector = FindingCollector::new(session);
        collector
            .ingest(&recorder, snap, vec![RawFinding::new("minor", "focus-order", "")])
            .expect("late ingest");
        let report = collector.finalize(&recorder).expect("finalize");
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_report_orders_by_snapshot_then_discovery() {
        let (mut recorder, session) = started();
        let first = recorder.record_action("launch").expect("first");
        let second = recorder.record_action("tap").expect("second");
        let mut collector = FindingCollector::new(session);

        // Ingest out of snapshot order, and the same snapshot twice.
        collector
            .ingest(&recorder, second, vec![RawFinding::new("minor", "focus-order", "s2-a")])
            .expect("ingest");
        collector
            .ingest(&recorder, first, vec![RawFinding::new("major", "missing-label", "s1-a")])
            .expect("ingest");
        collector
            .ingest(&recorder, second, vec![RawFinding::new("cosmetic", "dynamic-type", "s2-b")])
            .expect("ingest");

        recorder.stop().expect("stop");
        let report = collector.finalize(&recorder).expect("finalize");
        let order: Vec<&str> = report.findings().iter().map(|f| f.description.as_str()).collect();
        assert_eq!(order, vec!["s1-a", "s2-a", "s2-b"]);
        report.verify().expect("consistent report");
    }
}
