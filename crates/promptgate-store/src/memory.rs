//! In-memory store
//!
//! All state lives behind a single `parking_lot` lock, which makes each
//! trait operation atomic by construction. The lock is never held across
//! an await point.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use promptgate_core::{Error, Result};
use std::collections::HashMap;
use tracing::debug;

use crate::models::{Case, NewCase, NewRunResult, Run, RunResult, RunStatus, Suite};
use crate::store::Store;

#[derive(Default)]
struct Inner {
    suites: HashMap<String, Suite>,
    /// Cases per suite, in insertion (stored) order
    cases: HashMap<String, Vec<Case>>,
    runs: HashMap<String, Run>,
    /// Results per run, in creation order
    results: HashMap<String, Vec<RunResult>>,
}

/// Lock-protected in-memory implementation of [`Store`]
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4())
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_suite(&self, name: &str, description: Option<&str>) -> Result<Suite> {
        let suite = Suite {
            id: new_id("suite"),
            name: name.to_string(),
            description: description.map(str::to_owned),
            created_at: Utc::now(),
        };

        let mut inner = self.inner.write();
        inner.cases.insert(suite.id.clone(), Vec::new());
        inner.suites.insert(suite.id.clone(), suite.clone());
        debug!(suite_id = %suite.id, "suite created");
        Ok(suite)
    }

    async fn get_suite(&self, suite_id: &str) -> Result<Option<Suite>> {
        Ok(self.inner.read().suites.get(suite_id).cloned())
    }

    async fn create_case(&self, suite_id: &str, case: NewCase) -> Result<Case> {
        let mut inner = self.inner.write();
        if !inner.suites.contains_key(suite_id) {
            return Err(Error::store(format!("suite not found: {}", suite_id)));
        }

        let case = Case {
            id: new_id("case"),
            suite_id: suite_id.to_string(),
            prompt: case.prompt,
            expected_outcome: case.expected_outcome,
            expected_notes: case.expected_notes,
            tags: case.tags,
            created_at: Utc::now(),
        };

        inner
            .cases
            .entry(suite_id.to_string())
            .or_default()
            .push(case.clone());
        Ok(case)
    }

    async fn cases_for_suite(&self, suite_id: &str) -> Result<Vec<Case>> {
        let inner = self.inner.read();
        if !inner.suites.contains_key(suite_id) {
            return Err(Error::store(format!("suite not found: {}", suite_id)));
        }
        Ok(inner.cases.get(suite_id).cloned().unwrap_or_default())
    }

    async fn create_run(&self, suite_id: &str, model_id: &str, total_cases: u32) -> Result<Run> {
        let run = Run {
            id: new_id("run"),
            suite_id: suite_id.to_string(),
            model_id: model_id.to_string(),
            status: RunStatus::Running,
            total_cases,
            completed_cases: 0,
            passed_cases: 0,
            failed_cases: 0,
            created_at: Utc::now(),
            completed_at: None,
        };

        let mut inner = self.inner.write();
        if !inner.suites.contains_key(suite_id) {
            return Err(Error::store(format!("suite not found: {}", suite_id)));
        }
        inner.results.insert(run.id.clone(), Vec::new());
        inner.runs.insert(run.id.clone(), run.clone());
        debug!(run_id = %run.id, total_cases, "run created");
        Ok(run)
    }

    async fn get_run(&self, run_id: &str) -> Result<Option<Run>> {
        Ok(self.inner.read().runs.get(run_id).cloned())
    }

    async fn create_run_result(&self, result: NewRunResult) -> Result<RunResult> {
        let mut inner = self.inner.write();
        if !inner.runs.contains_key(&result.run_id) {
            return Err(Error::store(format!("run not found: {}", result.run_id)));
        }

        let record = RunResult {
            id: new_id("res"),
            run_id: result.run_id.clone(),
            case_id: result.case_id,
            passed: result.passed,
            violations: result.violations,
            response_excerpt: result.response_excerpt,
            created_at: Utc::now(),
        };

        inner
            .results
            .entry(result.run_id)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn results_for_run(&self, run_id: &str) -> Result<Vec<RunResult>> {
        let inner = self.inner.read();
        if !inner.runs.contains_key(run_id) {
            return Err(Error::store(format!("run not found: {}", run_id)));
        }
        Ok(inner.results.get(run_id).cloned().unwrap_or_default())
    }

    async fn record_case_outcome(&self, run_id: &str, passed: bool) -> Result<()> {
        let mut inner = self.inner.write();
        let run = inner
            .runs
            .get_mut(run_id)
            .ok_or_else(|| Error::store(format!("run not found: {}", run_id)))?;

        run.completed_cases += 1;
        if passed {
            run.passed_cases += 1;
        } else {
            run.failed_cases += 1;
        }
        Ok(())
    }

    async fn finish_run(&self, run_id: &str, status: RunStatus) -> Result<()> {
        let mut inner = self.inner.write();
        let run = inner
            .runs
            .get_mut(run_id)
            .ok_or_else(|| Error::store(format!("run not found: {}", run_id)))?;

        run.status = status;
        run.completed_at = Some(Utc::now());
        debug!(run_id, ?status, "run finished");
        Ok(())
    }

    async fn delete_run(&self, run_id: &str) -> Result<()> {
        let mut inner = self.inner.write();
        inner.runs.remove(run_id);
        inner.results.remove(run_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExpectedOutcome;

    fn new_case(prompt: &str, expected: ExpectedOutcome) -> NewCase {
        NewCase {
            prompt: prompt.to_string(),
            expected_outcome: expected,
            expected_notes: None,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_cases_preserve_insertion_order() {
        let store = MemoryStore::new();
        let suite = store.create_suite("ordering", None).await.unwrap();

        for i in 0..5 {
            store
                .create_case(&suite.id, new_case(&format!("prompt {}", i), ExpectedOutcome::Allow))
                .await
                .unwrap();
        }

        let cases = store.cases_for_suite(&suite.id).await.unwrap();
        let prompts: Vec<&str> = cases.iter().map(|c| c.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["prompt 0", "prompt 1", "prompt 2", "prompt 3", "prompt 4"]);
    }

    #[tokio::test]
    async fn test_counter_invariant_holds() {
        let store = MemoryStore::new();
        let suite = store.create_suite("counters", None).await.unwrap();
        let run = store.create_run(&suite.id, "test-model", 3).await.unwrap();

        store.record_case_outcome(&run.id, true).await.unwrap();
        store.record_case_outcome(&run.id, false).await.unwrap();
        store.record_case_outcome(&run.id, true).await.unwrap();

        let run = store.get_run(&run.id).await.unwrap().unwrap();
        assert_eq!(run.completed_cases, 3);
        assert_eq!(run.passed_cases, 2);
        assert_eq!(run.failed_cases, 1);
        assert_eq!(run.completed_cases, run.passed_cases + run.failed_cases);
    }

    #[tokio::test]
    async fn test_total_cases_frozen_at_run_creation() {
        let store = MemoryStore::new();
        let suite = store.create_suite("frozen", None).await.unwrap();
        store
            .create_case(&suite.id, new_case("one", ExpectedOutcome::Allow))
            .await
            .unwrap();

        let cases = store.cases_for_suite(&suite.id).await.unwrap();
        let run = store
            .create_run(&suite.id, "test-model", cases.len() as u32)
            .await
            .unwrap();

        // A case added after submission must not change the run
        store
            .create_case(&suite.id, new_case("two", ExpectedOutcome::Allow))
            .await
            .unwrap();

        let run = store.get_run(&run.id).await.unwrap().unwrap();
        assert_eq!(run.total_cases, 1);
    }

    #[tokio::test]
    async fn test_delete_run_cascades_to_results() {
        let store = MemoryStore::new();
        let suite = store.create_suite("cascade", None).await.unwrap();
        let case = store
            .create_case(&suite.id, new_case("p", ExpectedOutcome::Allow))
            .await
            .unwrap();
        let run = store.create_run(&suite.id, "test-model", 1).await.unwrap();

        store
            .create_run_result(NewRunResult {
                run_id: run.id.clone(),
                case_id: case.id.clone(),
                passed: true,
                violations: None,
                response_excerpt: None,
            })
            .await
            .unwrap();

        store.delete_run(&run.id).await.unwrap();
        assert!(store.get_run(&run.id).await.unwrap().is_none());
        assert!(store.results_for_run(&run.id).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        use std::sync::Arc;

        let store = Arc::new(MemoryStore::new());
        let suite = store.create_suite("concurrent", None).await.unwrap();
        let run = store.create_run(&suite.id, "test-model", 100).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..100u32 {
            let store = store.clone();
            let run_id = run.id.clone();
            handles.push(tokio::spawn(async move {
                store.record_case_outcome(&run_id, i % 2 == 0).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let run = store.get_run(&run.id).await.unwrap().unwrap();
        assert_eq!(run.completed_cases, 100);
        assert_eq!(run.passed_cases, 50);
        assert_eq!(run.failed_cases, 50);
    }

    #[tokio::test]
    async fn test_unknown_suite_is_a_store_error() {
        let store = MemoryStore::new();
        let err = store
            .create_case("suite_missing", new_case("p", ExpectedOutcome::Allow))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }
}
