//! a11y-harness Core Library
//!
//! Accessibility auditing for UI test sessions:
//! - `recorder`: session lifecycle and snapshot boundaries
//! - `collector`: normalization of rule-engine findings into a report
//! - `aggregator`: severity counts, issue-type filters and pass/fail verdicts
//! - `harness`: one explicit session object wiring the above to a rule engine
//!
//! Supporting modules cover configuration, report persistence, artifacts,
//! and structured tracing.

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod engine;
pub mod fakes;
pub mod harness;
pub mod obs;
pub mod recorder;
pub mod reporting;
pub mod store;
pub mod telemetry;

pub use a11y_harness_domain::{
    AuditError, Finding, IssueType, MalformedFinding, MalformedReason, RawFinding, Report,
    ReportId, Result, SessionId, Severity, Snapshot, SnapshotId,
};

pub use aggregator::{
    affected_elements, count_by_severity, evaluate, filter_by_issue_type, is_ok, is_passing,
    max_severity, severity_counts, ByIssueType, Verdict,
};
pub use collector::{FindingCollector, IngestOutcome};
pub use config::{AuditConfig, IssueFilter, LogConfig};
pub use engine::{evaluate_with_timeout, RuleEngine};
pub use fakes::ScriptedRuleEngine;
pub use harness::{AuditHarness, Observation};
pub use recorder::SessionRecorder;
pub use reporting::{render_report_md, write_report_json, ReportArtifact, ReportSummaryArtifact};
pub use store::{FsReportStore, MemoryReportStore, ReportStore, StoreError, StoreResult};

pub use obs::{
    emit_engine_error, emit_findings_ingested, emit_malformed_finding, emit_report_finalized,
    emit_report_skipped, emit_report_stored, emit_session_started, emit_session_stopped,
    emit_snapshot_recorded, emit_store_error, emit_verdict, SessionSpan,
};
pub use telemetry::{init_from_config, init_tracing};

/// a11y-harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
