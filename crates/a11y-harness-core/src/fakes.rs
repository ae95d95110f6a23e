//! In-process fakes for the rule engine seam.
//!
//! `ScriptedRuleEngine` answers each snapshot from a table keyed by the
//! snapshot's action name, so harness behavior can be exercised without a
//! real accessibility engine.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use a11y_harness_domain::{RawFinding, Snapshot};
use async_trait::async_trait;

use crate::engine::RuleEngine;

#[derive(Debug, Clone)]
enum Script {
    Findings(Vec<RawFinding>),
    Fail(String),
    Stall(Duration),
}

/// Rule engine that replays scripted responses per action name.
///
/// Actions without a script produce no findings.
#[derive(Debug, Default)]
pub struct ScriptedRuleEngine {
    scripts: HashMap<String, Script>,
    evaluated: Mutex<Vec<String>>,
}

impl ScriptedRuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `findings` whenever `action` is evaluated.
    pub fn on(mut self, action: &str, findings: Vec<RawFinding>) -> Self {
        self.scripts
            .insert(action.to_string(), Script::Findings(findings));
        self
    }

    /// Fail with `message` whenever `action` is evaluated.
    pub fn failing_on(mut self, action: &str, message: &str) -> Self {
        self.scripts
            .insert(action.to_string(), Script::Fail(message.to_string()));
        self
    }

    /// Sleep for `delay` before answering `action` with no findings.
    pub fn stalling_on(mut self, action: &str, delay: Duration) -> Self {
        self.scripts
            .insert(action.to_string(), Script::Stall(delay));
        self
    }

    /// Action names evaluated so far, in call order.
    pub fn evaluated(&self) -> Vec<String> {
        self.evaluated
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RuleEngine for ScriptedRuleEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn evaluate(&self, snapshot: &Snapshot) -> anyhow::Result<Vec<RawFinding>> {
        if let Ok(mut calls) = self.evaluated.lock() {
            calls.push(snapshot.action.clone());
        }

        match self.scripts.get(&snapshot.action) {
            None => Ok(Vec::new()),
            Some(Script::Findings(findings)) => Ok(findings.clone()),
            Some(Script::Fail(message)) => Err(anyhow::anyhow!("{}", message)),
            Some(Script::Stall(delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(Vec::new())
            }
        }
    }
}
