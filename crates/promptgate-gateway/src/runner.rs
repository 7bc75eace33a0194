//! Suite-run orchestrator
//!
//! `submit` creates the run row synchronously (durably visible before it
//! returns, so an immediate poll never sees "not found") and hands
//! execution to a background task. Cases execute strictly in stored
//! suite order, sequentially, so upstream side effects stay bounded and
//! result ordering is reproducible.
//!
//! Failure policy: an upstream failure on a single case records a
//! failing result and the run continues; a storage failure aborts the
//! run as `Failed`. Terminal runs are never resumed.

use parking_lot::Mutex;
use promptgate_core::{Error, Result};
use promptgate_store::{Case, ExpectedOutcome, NewRunResult, Run, RunStatus, Store};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::exchange::{ExchangeOutcome, GatewayService};
use crate::upstream::ChatRequest;

/// What the gateway was observed to do with a case's prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObservedOutcome {
    Allowed,
    Blocked,
}

/// Drives suites through the gateway path and aggregates outcomes
#[derive(Clone)]
pub struct RunOrchestrator {
    store: Arc<dyn Store>,
    gateway: Arc<GatewayService>,
    excerpt_limit: usize,
    /// In-flight runs mapped to their cancellation flag; entries exist
    /// from submission until the run reaches a terminal state
    in_flight: Arc<Mutex<HashMap<String, bool>>>,
}

impl RunOrchestrator {
    /// Create an orchestrator over the given store and gateway path
    pub fn new(store: Arc<dyn Store>, gateway: Arc<GatewayService>, excerpt_limit: usize) -> Self {
        Self {
            store,
            gateway,
            excerpt_limit,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Submit a run and return it without waiting for execution.
    ///
    /// `total_cases` is frozen from the suite's case set at this
    /// instant; later case edits do not affect the run.
    pub async fn submit(&self, suite_id: &str, model_id: &str) -> Result<Run> {
        let _suite = self
            .store
            .get_suite(suite_id)
            .await?
            .ok_or_else(|| Error::invalid_request(format!("suite not found: {}", suite_id)))?;

        let cases = self.store.cases_for_suite(suite_id).await?;
        let run = self
            .store
            .create_run(suite_id, model_id, cases.len() as u32)
            .await?;

        metrics::counter!("promptgate_runs_total").increment(1);
        info!(run_id = %run.id, suite_id, model_id, total_cases = run.total_cases, "run submitted");

        self.in_flight.lock().insert(run.id.clone(), false);

        let orchestrator = self.clone();
        let run_id = run.id.clone();
        let model_id = model_id.to_string();
        tokio::spawn(async move {
            orchestrator.execute_run(run_id, model_id, cases).await;
        });

        Ok(run)
    }

    /// Request cooperative cancellation of a running run. Runs that have
    /// already reached a terminal state are no longer tracked, so
    /// cancelling them is a no-op.
    pub fn cancel(&self, run_id: &str) {
        if let Some(requested) = self.in_flight.lock().get_mut(run_id) {
            *requested = true;
        }
    }

    fn is_cancelled(&self, run_id: &str) -> bool {
        self.in_flight.lock().get(run_id).copied().unwrap_or(false)
    }

    /// Background execution loop for one run
    async fn execute_run(&self, run_id: String, model_id: String, cases: Vec<Case>) {
        for case in &cases {
            if self.is_cancelled(&run_id) {
                warn!(run_id = %run_id, "run cancelled, stopping");
                self.finish(&run_id, RunStatus::Failed).await;
                return;
            }

            if let Err(e) = self.execute_case(&run_id, &model_id, case).await {
                // Errors surfacing here are outside the gateway path
                // (storage and the like); they terminate the run.
                error!(run_id = %run_id, case_id = %case.id, error = %e, "run execution failure");
                self.finish(&run_id, RunStatus::Failed).await;
                return;
            }
        }

        self.finish(&run_id, RunStatus::Completed).await;
        info!(run_id = %run_id, cases = cases.len(), "run completed");
    }

    /// Execute and score a single case, persisting its result.
    ///
    /// Only storage failures bubble up; upstream failures are folded
    /// into a failing result so one flaky case cannot invalidate the
    /// batch.
    async fn execute_case(&self, run_id: &str, model_id: &str, case: &Case) -> Result<()> {
        let request = ChatRequest::single_user(model_id, case.prompt.clone());

        let (observed, violations, excerpt) = match self.gateway.execute(&request, None).await {
            Ok(ExchangeOutcome::Blocked { violations, .. }) => (
                ObservedOutcome::Blocked,
                Some(serde_json::to_value(&violations)?),
                None,
            ),
            Ok(ExchangeOutcome::Completed { text, violations, .. }) => {
                let violations = if violations.is_empty() {
                    None
                } else {
                    Some(serde_json::to_value(&violations)?)
                };
                (ObservedOutcome::Allowed, violations, text)
            }
            Err(e @ (Error::Upstream { .. } | Error::UpstreamUnreachable(_))) => {
                warn!(case_id = %case.id, error = %e, "upstream failure, recording failed case");
                self.persist_outcome(run_id, &case.id, false, None, None).await?;
                metrics::counter!("promptgate_run_cases_total", "result" => "failed").increment(1);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let passed = match case.expected_outcome {
            ExpectedOutcome::Block => observed == ObservedOutcome::Blocked,
            ExpectedOutcome::Allow => observed == ObservedOutcome::Allowed,
        };

        let excerpt = excerpt.map(|t| truncate(&t, self.excerpt_limit));
        self.persist_outcome(run_id, &case.id, passed, violations, excerpt)
            .await?;

        let result_label = if passed { "passed" } else { "failed" };
        metrics::counter!("promptgate_run_cases_total", "result" => result_label).increment(1);
        Ok(())
    }

    /// Persist the result row, then bump the run counters
    async fn persist_outcome(
        &self,
        run_id: &str,
        case_id: &str,
        passed: bool,
        violations: Option<serde_json::Value>,
        response_excerpt: Option<String>,
    ) -> Result<()> {
        self.store
            .create_run_result(NewRunResult {
                run_id: run_id.to_string(),
                case_id: case_id.to_string(),
                passed,
                violations,
                response_excerpt,
            })
            .await?;

        self.store.record_case_outcome(run_id, passed).await
    }

    /// Move the run to a terminal status; storage failures here can only
    /// be logged
    async fn finish(&self, run_id: &str, status: RunStatus) {
        self.in_flight.lock().remove(run_id);
        if let Err(e) = self.store.finish_run(run_id, status).await {
            error!(run_id, error = %e, "failed to persist terminal run status");
        }
    }
}

/// Truncate to a character count without splitting a code point
fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use promptgate_store::MemoryStore;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 5), "héllo");
        assert_eq!(truncate("short", 500), "short");
    }

    #[tokio::test]
    async fn test_cancel_ignores_runs_no_longer_in_flight() {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(GatewayService::new(&GatewayConfig::default()).unwrap());
        let orchestrator = RunOrchestrator::new(store, gateway, 500);

        // Cancelling an untracked id must not leave any state behind
        orchestrator.cancel("run_done");
        assert!(!orchestrator.is_cancelled("run_done"));
        assert!(orchestrator.in_flight.lock().is_empty());
    }
}
