//! Tracing initialisation for UI test suites embedding the harness.
//!
//! Call [`init_tracing`] (or [`init_from_config`]) once from the suite's
//! setup. Harness events are enabled at the requested level while other
//! crates stay at `warn`, unless `RUST_LOG` says otherwise. Output goes
//! through the test writer so that `cargo test` captures it per test.

use a11y_harness_domain::{AuditError, Result};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogConfig;

const HARNESS_TARGETS: [&str; 2] = ["a11y_harness_core", "a11y_harness_domain"];

/// Filter directives enabling harness targets at `level`.
pub fn harness_directives(level: Level) -> String {
    let mut directives = String::from("warn");
    for target in HARNESS_TARGETS {
        directives.push_str(&format!(",{}={}", target, level.as_str().to_lowercase()));
    }
    directives
}

fn harness_filter(level: Level) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(harness_directives(level))
            .map_err(|e| AuditError::Config(format!("invalid log filter: {}", e))),
    }
}

/// Install the global subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed; the
/// existing one is left in place.
pub fn init_tracing(json: bool, level: Level) -> Result<bool> {
    let filter = harness_filter(level)?;
    let installed = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_test_writer().json())
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_test_writer())
            .try_init()
            .is_ok()
    };
    Ok(installed)
}

/// Install the global subscriber from the `log` section of an audit config.
pub fn init_from_config(config: &LogConfig) -> Result<bool> {
    init_tracing(config.json, config.level()?)
}
