//! Audit domain schema definitions
//!
//! Severity and issue type are closed enumerations. Raw engine output is
//! free-form text and only becomes a [`Finding`] once both tags map onto
//! these enumerations.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::error::{AuditError, Result};

// ============================================================================
// 1. IDENTIFIERS
// ============================================================================

/// Identity of one recording session (one `start()`..`stop()` span)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a snapshot: the owning session plus a dense 0-based sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotId {
    pub session: SessionId,
    pub seq: u32,
}

impl SnapshotId {
    pub fn new(session: SessionId, seq: u32) -> Self {
        SnapshotId { session, seq }
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.session, self.seq)
    }
}

/// Content address of a finalized report (SHA256 hex)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportId(String);

impl ReportId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short digest (first 12 chars)
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ReportId {
    type Err = AuditError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let valid = s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(AuditError::Store(format!("invalid report id: {}", s)));
        }
        Ok(ReportId(s.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for ReportId {
    type Error = AuditError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ReportId> for String {
    fn from(id: ReportId) -> Self {
        id.0
    }
}

// ============================================================================
// 2. CLOSED ENUMERATIONS
// ============================================================================

/// Issue severity, totally ordered: cosmetic < minor < major < critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Cosmetic,
    Minor,
    Major,
    Critical,
}

impl Severity {
    /// All severities in ascending order
    pub const ALL: [Severity; 4] = [
        Severity::Cosmetic,
        Severity::Minor,
        Severity::Major,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Cosmetic => "cosmetic",
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosmetic" => Ok(Severity::Cosmetic),
            "minor" => Ok(Severity::Minor),
            "major" => Ok(Severity::Major),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// Accessibility issue categories reported by the rule engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    /// Foreground/background contrast below the required ratio
    ColorContrast,
    /// Interactive element without an accessibility label
    MissingLabel,
    /// Touch target smaller than the minimum tappable size
    TappableArea,
    /// Several elements sharing the same accessibility label
    DuplicateLabel,
    /// Text that does not scale with the user's preferred size
    DynamicType,
    /// Element whose role does not match how it can be interacted with
    InteractableRole,
    /// Focus traversal order that does not follow the visual order
    FocusOrder,
    /// Image without a description for assistive technology
    ImageDescription,
}

impl IssueType {
    pub const ALL: [IssueType; 8] = [
        IssueType::ColorContrast,
        IssueType::MissingLabel,
        IssueType::TappableArea,
        IssueType::DuplicateLabel,
        IssueType::DynamicType,
        IssueType::InteractableRole,
        IssueType::FocusOrder,
        IssueType::ImageDescription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::ColorContrast => "color-contrast",
            IssueType::MissingLabel => "missing-label",
            IssueType::TappableArea => "tappable-area",
            IssueType::DuplicateLabel => "duplicate-label",
            IssueType::DynamicType => "dynamic-type",
            IssueType::InteractableRole => "interactable-role",
            IssueType::FocusOrder => "focus-order",
            IssueType::ImageDescription => "image-description",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match canonical_tag(s).as_str() {
            "color-contrast" | "contrast" => Ok(IssueType::ColorContrast),
            "missing-label" | "missing-accessibility-label" => Ok(IssueType::MissingLabel),
            "tappable-area" | "touch-target" => Ok(IssueType::TappableArea),
            "duplicate-label" => Ok(IssueType::DuplicateLabel),
            "dynamic-type" | "text-scaling" => Ok(IssueType::DynamicType),
            "interactable-role" => Ok(IssueType::InteractableRole),
            "focus-order" => Ok(IssueType::FocusOrder),
            "image-description" | "missing-image-description" => Ok(IssueType::ImageDescription),
            other => Err(format!("unknown issue type: {}", other)),
        }
    }
}

fn camel_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static regex"))
}

/// Canonical kebab-case form of a free-form tag.
///
/// `colorContrast`, `Color Contrast` and `COLOR_CONTRAST` all become
/// `color-contrast`.
pub fn canonical_tag(raw: &str) -> String {
    let split = camel_boundary().replace_all(raw.trim(), "${1}-${2}");
    let lowered: String = split
        .chars()
        .map(|c| {
            if c == '_' || c.is_whitespace() {
                '-'
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect();
    lowered
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

// ============================================================================
// 3. SNAPSHOTS AND FINDINGS
// ============================================================================

/// One observed UI state and the action that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,

    /// Name of the UI action that triggered this state (e.g. "tap login")
    pub action: String,

    /// Wall-clock capture time (informational only)
    pub captured_at: DateTime<Utc>,

    /// Monotonic milliseconds since the session started
    pub offset_ms: u64,
}

/// A finding as emitted by the rule engine, before normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFinding {
    pub severity: String,
    pub issue_type: String,
    #[serde(default)]
    pub description: String,
    /// Accessibility identifier of the offending element, if known
    #[serde(default)]
    pub element: Option<String>,
}

impl RawFinding {
    pub fn new(
        severity: impl Into<String>,
        issue_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        RawFinding {
            severity: severity.into(),
            issue_type: issue_type.into(),
            description: description.into(),
            element: None,
        }
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }
}

/// A normalized accessibility issue tied to exactly one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub snapshot_id: SnapshotId,

    /// Discovery order within the snapshot (0-based)
    pub ordinal: u32,

    pub severity: Severity,
    pub issue_type: IssueType,
    pub description: String,
    pub element: Option<String>,
}

/// Why a raw finding could not be normalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MalformedReason {
    UnknownSeverity(String),
    UnknownIssueType(String),
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::UnknownSeverity(s) => write!(f, "unknown severity '{}'", s),
            MalformedReason::UnknownIssueType(s) => write!(f, "unknown issue type '{}'", s),
        }
    }
}

/// Non-fatal warning: a raw finding that was discarded during ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedFinding {
    pub snapshot_id: SnapshotId,
    /// Position of the entry in the batch passed to `ingest`
    pub index: usize,
    pub reason: MalformedReason,
}

// ============================================================================
// 4. REPORT
// ============================================================================

/// Finalized, immutable findings of one session.
///
/// # Invariants
///
/// - every finding references a snapshot contained in `snapshots`
/// - `snapshots` are in creation order
/// - `findings` follow snapshot order, then discovery order
/// - `id` is the digest of `(session_id, snapshots, findings)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    id: ReportId,
    session_id: SessionId,
    snapshots: Vec<Snapshot>,
    findings: Vec<Finding>,
    warnings: Vec<MalformedFinding>,
    finalized_at: DateTime<Utc>,
}

impl Report {
    /// Assemble a report and compute its digest.
    ///
    /// Callers are expected to pass already ordered snapshots and findings;
    /// use [`Report::verify`] to check a report loaded from elsewhere.
    pub fn new(
        session_id: SessionId,
        snapshots: Vec<Snapshot>,
        findings: Vec<Finding>,
        warnings: Vec<MalformedFinding>,
    ) -> Self {
        let id = ReportId(compute_report_digest(&session_id, &snapshots, &findings));
        Report {
            id,
            session_id,
            snapshots,
            findings,
            warnings,
            finalized_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &ReportId {
        &self.id
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn snapshot(&self, id: &SnapshotId) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| &s.id == id)
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn warnings(&self) -> &[MalformedFinding] {
        &self.warnings
    }

    pub fn finalized_at(&self) -> DateTime<Utc> {
        self.finalized_at
    }

    /// Total number of findings
    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Check the digest and the snapshot-reference invariant.
    pub fn verify(&self) -> Result<()> {
        let actual = compute_report_digest(&self.session_id, &self.snapshots, &self.findings);
        if actual != self.id.0 {
            return Err(AuditError::DigestMismatch {
                expected: self.id.0.clone(),
                actual,
            });
        }
        for finding in &self.findings {
            if self.snapshot(&finding.snapshot_id).is_none() {
                return Err(AuditError::OrphanFinding(finding.snapshot_id));
            }
        }
        Ok(())
    }
}

// ============================================================================
// DIGEST COMPUTATION
// ============================================================================

/// Snapshot fields that take part in the report digest.
#[derive(Serialize)]
struct SnapshotDigestView<'a> {
    seq: u32,
    offset_ms: u64,
    action: &'a str,
}

#[derive(Serialize)]
struct ReportDigestView<'a> {
    session_id: &'a SessionId,
    snapshots: Vec<SnapshotDigestView<'a>>,
    findings: &'a [Finding],
}

/// SHA256 over the canonical JSON of `(session_id, snapshots, findings)`.
///
/// Wall-clock capture times are left out of the snapshot view; `offset_ms`
/// already orders them within the session.
pub fn compute_report_digest(
    session_id: &SessionId,
    snapshots: &[Snapshot],
    findings: &[Finding],
) -> String {
    let view = ReportDigestView {
        session_id,
        snapshots: snapshots
            .iter()
            .map(|s| SnapshotDigestView {
                seq: s.id.seq,
                offset_ms: s.offset_ms,
                action: &s.action,
            })
            .collect(),
        findings,
    };
    let json = serde_json::to_vec(&view).expect("report digest view is serializable");
    let mut hasher = Sha256::new();
    hasher.update(&json);
    hex::encode(hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
