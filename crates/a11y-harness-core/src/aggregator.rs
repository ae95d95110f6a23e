//! Verdict queries over a finalized [`Report`].
//!
//! All functions are read-only. Counting and filtering never fail; only the
//! pass/fail check validates its threshold.

use std::collections::BTreeMap;

use a11y_harness_domain::{AuditError, Finding, IssueType, Report, Result, Severity};
use serde::{Deserialize, Serialize};

/// Number of findings at exactly `severity`.
pub fn count_by_severity(report: &Report, severity: Severity) -> usize {
    report
        .findings()
        .iter()
        .filter(|f| f.severity == severity)
        .count()
}

/// Histogram over all four severities (zero entries included).
pub fn severity_counts(report: &Report) -> BTreeMap<Severity, usize> {
    let mut counts: BTreeMap<Severity, usize> = Severity::ALL.iter().map(|s| (*s, 0)).collect();
    for finding in report.findings() {
        *counts.entry(finding.severity).or_insert(0) += 1;
    }
    counts
}

/// Highest severity present in the report.
pub fn max_severity(report: &Report) -> Option<Severity> {
    report.findings().iter().map(|f| f.severity).max()
}

/// Lazy view over the findings of one issue type.
///
/// Cloning the iterator, or calling [`ByIssueType::restart`], replays the
/// sequence from the beginning.
#[derive(Debug, Clone)]
pub struct ByIssueType<'a> {
    findings: &'a [Finding],
    issue_type: IssueType,
    pos: usize,
}

impl<'a> ByIssueType<'a> {
    pub fn issue_type(&self) -> IssueType {
        self.issue_type
    }

    pub fn restart(&mut self) {
        self.pos = 0;
    }
}

impl<'a> Iterator for ByIssueType<'a> {
    type Item = &'a Finding;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(finding) = self.findings.get(self.pos) {
            self.pos += 1;
            if finding.issue_type == self.issue_type {
                return Some(finding);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.findings.len().saturating_sub(self.pos)))
    }
}

/// Findings tagged `issue_type`, in report order.
pub fn filter_by_issue_type(report: &Report, issue_type: IssueType) -> ByIssueType<'_> {
    ByIssueType {
        findings: report.findings(),
        issue_type,
        pos: 0,
    }
}

/// True iff the critical count is strictly below `max_critical_allowed`.
pub fn is_passing(report: &Report, max_critical_allowed: i64) -> Result<bool> {
    evaluate(report, max_critical_allowed).map(|v| v.passed)
}

/// True iff the report carries no findings at all.
pub fn is_ok(report: &Report) -> bool {
    report.is_empty()
}

/// Distinct element identifiers with at least one finding, first-seen order.
pub fn affected_elements(report: &Report) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for element in report.findings().iter().filter_map(|f| f.element.as_deref()) {
        if !seen.contains(&element) {
            seen.push(element);
        }
    }
    seen
}

/// Outcome of checking a report against a critical-issue threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub critical_count: usize,
    pub max_critical_allowed: i64,
    pub passed: bool,
}

/// Evaluate `report` against `max_critical_allowed`.
pub fn evaluate(report: &Report, max_critical_allowed: i64) -> Result<Verdict> {
    if max_critical_allowed < 0 {
        return Err(AuditError::InvalidThreshold(max_critical_allowed));
    }
    let critical_count = count_by_severity(report, Severity::Critical);
    let passed = i64::try_from(critical_count).map_or(false, |n| n < max_critical_allowed);

    let verdict = Verdict {
        critical_count,
        max_critical_allowed,
        passed,
    };
    crate::obs::emit_verdict(report.id(), &verdict);
    Ok(verdict)
}
