//! Harness configuration.
//!
//! Every harness owns its own [`AuditConfig`]; nothing here is process-wide.
//! Configs load from TOML or JSON and can be overridden from the environment:
//!
//! - `A11Y_MAX_CRITICAL_ISSUES`
//! - `A11Y_ENGINE_TIMEOUT_MS`
//! - `A11Y_REPORT_DIR`
//! - `A11Y_LOG_LEVEL`
//! - `A11Y_LOG_JSON`

use std::path::{Path, PathBuf};
use std::time::Duration;

use a11y_harness_domain::{AuditError, IssueType, Result};
use serde::{Deserialize, Serialize};
use tracing::Level;

pub const ENV_MAX_CRITICAL_ISSUES: &str = "A11Y_MAX_CRITICAL_ISSUES";
pub const ENV_ENGINE_TIMEOUT_MS: &str = "A11Y_ENGINE_TIMEOUT_MS";
pub const ENV_REPORT_DIR: &str = "A11Y_REPORT_DIR";
pub const ENV_LOG_LEVEL: &str = "A11Y_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "A11Y_LOG_JSON";

/// Include/exclude lists applied to findings at ingestion time.
///
/// An empty `include` list admits every issue type; `exclude` always wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueFilter {
    #[serde(default)]
    pub include: Vec<IssueType>,
    #[serde(default)]
    pub exclude: Vec<IssueType>,
}

impl IssueFilter {
    /// Admit every issue type.
    pub fn all() -> Self {
        Self::default()
    }

    /// Admit only the listed issue types.
    pub fn only(issue_types: impl IntoIterator<Item = IssueType>) -> Self {
        Self {
            include: issue_types.into_iter().collect(),
            exclude: Vec::new(),
        }
    }

    /// Add an issue type to the exclude list.
    pub fn excluding(mut self, issue_type: IssueType) -> Self {
        self.exclude.push(issue_type);
        self
    }

    pub fn allows(&self, issue_type: IssueType) -> bool {
        (self.include.is_empty() || self.include.contains(&issue_type))
            && !self.exclude.contains(&issue_type)
    }
}

/// How harness events are logged; see [`crate::telemetry::init_from_config`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Default level for harness targets when `RUST_LOG` is unset.
    pub level: String,
    /// Newline-delimited JSON instead of human-readable lines.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LogConfig {
    pub fn level(&self) -> Result<Level> {
        self.level
            .trim()
            .parse()
            .map_err(|_| AuditError::Config(format!("unknown log level: {}", self.level)))
    }
}

/// Per-harness configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuditConfig {
    /// A report passes while its critical count stays strictly below this.
    pub max_allowed_critical_issues: i64,

    /// Upper bound for one rule-engine evaluation.
    pub engine_timeout_ms: u64,

    /// Which issue types are collected.
    pub filter: IssueFilter,

    /// Where finalized reports are persisted, if anywhere.
    pub report_dir: Option<PathBuf>,

    pub log: LogConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_allowed_critical_issues: 3,
            engine_timeout_ms: 30_000,
            filter: IssueFilter::default(),
            report_dir: None,
            log: LogConfig::default(),
        }
    }
}

impl AuditConfig {
    /// Load from a `.toml` or `.json` file and validate.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: AuditConfig = match ext {
            "toml" => toml::from_str(&content)
                .map_err(|e| AuditError::Config(format!("parse {}: {}", path.display(), e)))?,
            "json" => serde_json::from_str(&content)?,
            other => {
                return Err(AuditError::Config(format!(
                    "unsupported config format '{}' for {}",
                    other,
                    path.display()
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Apply `A11Y_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MAX_CRITICAL_ISSUES) {
            self.max_allowed_critical_issues = raw.trim().parse().map_err(|_| {
                AuditError::Config(format!("{} is not an integer: {}", ENV_MAX_CRITICAL_ISSUES, raw))
            })?;
        }
        if let Some(raw) = lookup(ENV_ENGINE_TIMEOUT_MS) {
            self.engine_timeout_ms = raw.trim().parse().map_err(|_| {
                AuditError::Config(format!("{} is not an integer: {}", ENV_ENGINE_TIMEOUT_MS, raw))
            })?;
        }
        if let Some(raw) = lookup(ENV_REPORT_DIR) {
            self.report_dir = Some(PathBuf::from(raw));
        }
        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            self.log.level = raw.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_LOG_JSON) {
            self.log.json = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(AuditError::Config(format!(
                        "{} is not a boolean: {}",
                        ENV_LOG_JSON, raw
                    )))
                }
            };
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_allowed_critical_issues < 0 {
            return Err(AuditError::InvalidThreshold(self.max_allowed_critical_issues));
        }
        if self.engine_timeout_ms == 0 {
            return Err(AuditError::Config(
                "engine_timeout_ms must be greater than zero".to_string(),
            ));
        }
        self.log.level()?;
        Ok(())
    }

    pub fn engine_timeout(&self) -> Duration {
        Duration::from_millis(self.engine_timeout_ms)
    }

    pub fn with_max_allowed_critical_issues(mut self, max: i64) -> Self {
        self.max_allowed_critical_issues = max;
        self
    }

    pub fn with_filter(mut self, filter: IssueFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_engine_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.engine_timeout_ms = timeout_ms;
        self
    }

    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AuditConfig::default();
        assert_eq!(config.max_allowed_critical_issues, 3);
        assert_eq!(config.engine_timeout(), Duration::from_secs(30));
        assert!(config.report_dir.is_none());
        config.validate().expect("default is valid");
    }

    #[test]
    fn test_filter_semantics() {
        let all = IssueFilter::all();
        assert!(IssueType::ALL.iter().all(|t| all.allows(*t)));

        let contrast = IssueFilter::only([IssueType::ColorContrast]);
        assert!(contrast.allows(IssueType::ColorContrast));
        assert!(!contrast.allows(IssueType::MissingLabel));

        let no_focus = IssueFilter::all().excluding(IssueType::FocusOrder);
        assert!(!no_focus.allows(IssueType::FocusOrder));
        assert!(no_focus.allows(IssueType::TappableArea));

        let contradictory =
            IssueFilter::only([IssueType::ColorContrast]).excluding(IssueType::ColorContrast);
        assert!(!contradictory.allows(IssueType::ColorContrast));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let config = AuditConfig::default().with_max_allowed_critical_issues(-2);
        assert!(matches!(
            config.validate(),
            Err(AuditError::InvalidThreshold(-2))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = AuditConfig::default().with_engine_timeout_ms(0);
        assert!(matches!(config.validate(), Err(AuditError::Config(_))));
    }

    #[test]
    fn test_overrides_apply() {
        let env: HashMap<&str, &str> = [
            (ENV_MAX_CRITICAL_ISSUES, "0"),
            (ENV_ENGINE_TIMEOUT_MS, " 1500 "),
            (ENV_REPORT_DIR, "/tmp/a11y-reports"),
        ]
        .into_iter()
        .collect();

        let config = AuditConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .expect("overrides");
        assert_eq!(config.max_allowed_critical_issues, 0);
        assert_eq!(config.engine_timeout_ms, 1500);
        assert_eq!(config.report_dir, Some(PathBuf::from("/tmp/a11y-reports")));
    }

    #[test]
    fn test_override_parse_error() {
        let result = AuditConfig::default().with_overrides(|key| {
            (key == ENV_MAX_CRITICAL_ISSUES).then(|| "three".to_string())
        });
        assert!(matches!(result, Err(AuditError::Config(_))));
    }

    #[test]
    fn test_negative_override_rejected() {
        let result = AuditConfig::default()
            .with_overrides(|key| (key == ENV_MAX_CRITICAL_ISSUES).then(|| "-1".to_string()));
        assert!(matches!(result, Err(AuditError::InvalidThreshold(-1))));
    }

    #[test]
    fn test_load_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a11y.toml");
        std::fs::write(
            &path,
            r#"
max_allowed_critical_issues = 1
engine_timeout_ms = 5000

[filter]
include = ["color-contrast"]
"#,
        )
        .expect("write");

        let config = AuditConfig::from_file(&path).expect("load");
        assert_eq!(config.max_allowed_critical_issues, 1);
        assert_eq!(config.engine_timeout_ms, 5000);
        assert_eq!(config.filter, IssueFilter::only([IssueType::ColorContrast]));
    }

    #[test]
    fn test_load_json_partial_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a11y.json");
        std::fs::write(&path, r#"{"max_allowed_critical_issues": 5}"#).expect("write");

        let config = AuditConfig::from_file(&path).expect("load");
        assert_eq!(config.max_allowed_critical_issues, 5);
        assert_eq!(config.engine_timeout_ms, 30_000);
    }

    #[test]
    fn test_log_overrides_apply() {
        let config = AuditConfig::default()
            .with_overrides(|key| match key {
                ENV_LOG_LEVEL => Some("DEBUG".to_string()),
                ENV_LOG_JSON => Some("true".to_string()),
                _ => None,
            })
            .expect("overrides");
        assert_eq!(config.log.level().expect("level"), Level::DEBUG);
        assert!(config.log.json);
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let result = AuditConfig::default()
            .with_overrides(|key| (key == ENV_LOG_LEVEL).then(|| "chatty".to_string()));
        assert!(matches!(result, Err(AuditError::Config(_))));

        let result = AuditConfig::default()
            .with_overrides(|key| (key == ENV_LOG_JSON).then(|| "maybe".to_string()));
        assert!(matches!(result, Err(AuditError::Config(_))));
    }

    #[test]
    fn test_load_toml_log_section() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a11y.toml");
        std::fs::write(&path, "[log]\nlevel = \"warn\"\njson = true\n").expect("write");

        let config = AuditConfig::from_file(&path).expect("load");
        assert_eq!(config.log.level().expect("level"), Level::WARN);
        assert!(config.log.json);
        assert_eq!(config.max_allowed_critical_issues, 3);
    }

    #[test]
    fn test_load_unknown_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a11y.yaml");
        std::fs::write(&path, "max_allowed_critical_issues: 1").expect("write");
        assert!(matches!(
            AuditConfig::from_file(&path),
            Err(AuditError::Config(_))
        ));
    }

    #[test]
    fn test_load_invalid_threshold_in_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a11y.toml");
        std::fs::write(&path, "max_allowed_critical_issues = -4\n").expect("write");
        assert!(matches!(
            AuditConfig::from_file(&path),
            Err(AuditError::InvalidThreshold(-4))
        ));
    }
}
