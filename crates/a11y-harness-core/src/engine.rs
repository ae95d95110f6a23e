//! Rule engine seam.
//!
//! The engine that actually inspects UI state is an external collaborator.
//! The harness only hands it a [`Snapshot`] and expects raw findings back;
//! failures and timeouts surface as collector-level errors and are not
//! retried.

use std::time::Duration;

use a11y_harness_domain::{AuditError, RawFinding, Result, Snapshot};
use async_trait::async_trait;

/// External accessibility rule engine.
#[async_trait]
pub trait RuleEngine: Send + Sync {
    /// Engine name used in logs and error messages.
    fn name(&self) -> &str;

    /// Evaluate the UI state captured by `snapshot`.
    async fn evaluate(&self, snapshot: &Snapshot) -> anyhow::Result<Vec<RawFinding>>;
}

/// Run `engine` on `snapshot`, bounded by `timeout`.
pub async fn evaluate_with_timeout(
    engine: &dyn RuleEngine,
    snapshot: &Snapshot,
    timeout: Duration,
) -> Result<Vec<RawFinding>> {
    match tokio::time::timeout(timeout, engine.evaluate(snapshot)).await {
        Ok(Ok(raw)) => Ok(raw),
        Ok(Err(e)) => {
            crate::obs::emit_engine_error(&snapshot.id, engine.name(), &e);
            Err(AuditError::Engine(format!("{}: {:#}", engine.name(), e)))
        }
        Err(_) => {
            let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            let err = AuditError::EngineTimeout {
                snapshot: snapshot.id,
                timeout_ms,
            };
            crate::obs::emit_engine_error(&snapshot.id, engine.name(), &err);
            Err(err)
        }
    }
}
