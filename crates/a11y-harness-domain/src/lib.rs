//! a11y-harness Domain Model
//!
//! Defines the objects exchanged between a UI test session and the
//! accessibility rule engine that inspects it:
//! - Snapshot: one observed UI state plus the action that produced it
//! - RawFinding: an engine finding before normalization
//! - Finding: a normalized issue with closed severity and issue type
//! - MalformedFinding: a raw entry that could not be normalized
//! - Report: the finalized, ordered findings of one session
//!
//! Reports are serializable and content-addressable (SHA256 over the
//! session id, snapshots and findings).

pub mod error;
pub mod schema;

pub use error::{AuditError, Result};
pub use schema::{
    canonical_tag, compute_report_digest, Finding, IssueType, MalformedFinding, MalformedReason,
    RawFinding, Report, ReportId, SessionId, Severity, Snapshot, SnapshotId,
};

/// a11y-harness domain version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
