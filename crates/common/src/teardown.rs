//! Deferred cleanup actions with guaranteed LIFO execution.

use std::time::Instant;

use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{info, warn};

type TeardownFn = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<()>> + Send>;

/// Record of one executed teardown action.
#[derive(Debug, Clone, Serialize)]
pub struct TeardownOutcome {
    pub label: String,
    pub success: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A stack of labeled cleanup actions.
///
/// Actions run in inverse registration order, so a caller that registers
/// cleanup immediately before each acquisition gets resources released in
/// the reverse order they were acquired. A failing action is recorded and
/// never prevents the remaining actions from running.
#[derive(Default)]
pub struct TeardownStack {
    actions: Vec<(String, TeardownFn)>,
}

impl TeardownStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` to run during teardown. Later registrations run
    /// first.
    pub fn push<F, Fut>(&mut self, label: &str, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.actions
            .push((label.to_string(), Box::new(move || Box::pin(action()))));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every registered action, most recent first, and report what
    /// happened to each.
    pub async fn run_all(mut self) -> Vec<TeardownOutcome> {
        let mut outcomes = Vec::with_capacity(self.actions.len());
        while let Some((label, action)) = self.actions.pop() {
            info!("teardown: {}", label);
            let start = Instant::now();
            let result = action().await;
            let duration_ms = start.elapsed().as_millis() as u64;
            match result {
                Ok(()) => outcomes.push(TeardownOutcome {
                    label,
                    success: true,
                    duration_ms,
                    error: None,
                }),
                Err(err) => {
                    warn!("teardown '{}' failed: {:#}", label, err);
                    outcomes.push(TeardownOutcome {
                        label,
                        success: false,
                        duration_ms,
                        error: Some(format!("{:#}", err)),
                    });
                }
            }
        }
        outcomes
    }
}

/// First failed outcome, if any.
pub fn first_failure(outcomes: &[TeardownOutcome]) -> Option<&TeardownOutcome> {
    outcomes.iter().find(|outcome| !outcome.success)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[tokio::test]
    async fn actions_run_in_inverse_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut stack = TeardownStack::new();
        for step in ["sweep", "delete-group", "destroy"] {
            let order = order.clone();
            stack.push(step, move || async move {
                order.lock().unwrap().push(step);
                Ok(())
            });
        }

        let outcomes = stack.run_all().await;

        assert_eq!(*order.lock().unwrap(), ["destroy", "delete-group", "sweep"]);
        let labels: Vec<&str> = outcomes.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["destroy", "delete-group", "sweep"]);
    }

    #[tokio::test]
    async fn failure_does_not_stop_remaining_actions() {
        let ran = Arc::new(Mutex::new(Vec::new()));
        let mut stack = TeardownStack::new();
        {
            let ran = ran.clone();
            stack.push("last", move || async move {
                ran.lock().unwrap().push("last");
                Ok(())
            });
        }
        stack.push("broken", || async { anyhow::bail!("resource busy") });

        let outcomes = stack.run_all().await;

        assert_eq!(*ran.lock().unwrap(), ["last"]);
        assert!(!outcomes[0].success);
        assert!(outcomes[0].error.as_deref().unwrap().contains("resource busy"));
        assert!(outcomes[1].success);

        let failed = first_failure(&outcomes).unwrap();
        assert_eq!(failed.label, "broken");
    }

    #[tokio::test]
    async fn empty_stack_runs_nothing() {
        let stack = TeardownStack::new();
        assert!(stack.is_empty());
        assert!(stack.run_all().await.is_empty());
    }
}
