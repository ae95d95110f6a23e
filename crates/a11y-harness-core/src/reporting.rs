use std::collections::BTreeMap;
use std::path::Path;

use a11y_harness_domain::{Report, Severity};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator::{self, Verdict};

pub const REPORT_SCHEMA_VERSION: &str = "1";

/// Compact summary section persisted next to the full report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSummaryArtifact {
    pub total_snapshots: usize,
    pub total_findings: usize,
    pub malformed_findings: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub affected_elements: usize,
    pub verdict: Verdict,
}

/// Canonical report artifact written for CI and test-run attachments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummaryArtifact,
    pub report: Report,
}

impl ReportArtifact {
    pub fn new(report: &Report, verdict: Verdict) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            summary: ReportSummaryArtifact {
                total_snapshots: report.snapshots().len(),
                total_findings: report.len(),
                malformed_findings: report.warnings().len(),
                by_severity: aggregator::severity_counts(report),
                affected_elements: aggregator::affected_elements(report).len(),
                verdict,
            },
            report: report.clone(),
        }
    }
}

/// Write the report artifact as pretty JSON.
pub fn write_report_json(path: &Path, report: &Report, verdict: Verdict) -> Result<()> {
    let artifact = ReportArtifact::new(report, verdict);
    let content = serde_json::to_string_pretty(&artifact).context("serialize report artifact")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render a markdown summary for test logs or PR comments.
pub fn render_report_md(report: &Report, verdict: &Verdict) -> String {
    let mut out = String::new();
    out.push_str("# Accessibility Report\n\n");
    out.push_str(&format!(
        "- report: `{}`\n- session: `{}`\n- snapshots: {}\n- findings: {}\n\n",
        report.id().short(),
        report.session_id(),
        report.snapshots().len(),
        report.len()
    ));

    out.push_str("## By Severity\n");
    for (severity, count) in aggregator::severity_counts(report).iter().rev() {
        out.push_str(&format!("- {}: {}\n", severity, count));
    }
    out.push('\n');

    if !report.is_empty() {
        out.push_str("## Findings\n");
        for finding in report.findings() {
            let action = report
                .snapshot(&finding.snapshot_id)
                .map_or("?", |s| s.action.as_str());
            out.push_str(&format!(
                "- **{}** `{}` after `{}`",
                finding.severity, finding.issue_type, action
            ));
            if let Some(element) = &finding.element {
                out.push_str(&format!(" on `{}`", element));
            }
            if !finding.description.is_empty() {
                out.push_str(&format!(": {}", finding.description));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if !report.warnings().is_empty() {
        out.push_str(&format!(
            "## Discarded ({} malformed)\n",
            report.warnings().len()
        ));
        for warning in report.warnings() {
            out.push_str(&format!(
                "- snapshot #{} entry {}: {}\n",
                warning.snapshot_id.seq, warning.index, warning.reason
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "## Verdict\n{}: {} critical (allowed < {})\n",
        if verdict.passed { "PASS" } else { "FAIL" },
        verdict.critical_count,
        verdict.max_critical_allowed
    ));
    out
}
