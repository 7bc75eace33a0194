//! Storage collaborator interface
//!
//! The rest of the system talks to persistence exclusively through this
//! trait. Every operation is individually atomic as provided by the
//! backing implementation.

use async_trait::async_trait;
use promptgate_core::Result;

use crate::models::{Case, NewCase, NewRunResult, Run, RunResult, RunStatus, Suite};

/// Narrow create/read/update/delete interface over suites, cases,
/// runs, and results
#[async_trait]
pub trait Store: Send + Sync {
    /// Create a suite
    async fn create_suite(&self, name: &str, description: Option<&str>) -> Result<Suite>;

    /// Read a suite by id
    async fn get_suite(&self, suite_id: &str) -> Result<Option<Suite>>;

    /// Append a case to a suite
    async fn create_case(&self, suite_id: &str, case: NewCase) -> Result<Case>;

    /// Read a suite's cases in stored order
    async fn cases_for_suite(&self, suite_id: &str) -> Result<Vec<Case>>;

    /// Create a run row with `total_cases` frozen and counters at zero.
    ///
    /// The row must be durably visible before this returns, so a client
    /// polling immediately after submission never observes "not found".
    async fn create_run(&self, suite_id: &str, model_id: &str, total_cases: u32) -> Result<Run>;

    /// Read a run by id
    async fn get_run(&self, run_id: &str) -> Result<Option<Run>>;

    /// Record one per-case result
    async fn create_run_result(&self, result: NewRunResult) -> Result<RunResult>;

    /// Read a run's results in creation order
    async fn results_for_run(&self, run_id: &str) -> Result<Vec<RunResult>>;

    /// Atomically increment `completed_cases` and exactly one of
    /// `passed_cases`/`failed_cases`
    async fn record_case_outcome(&self, run_id: &str, passed: bool) -> Result<()>;

    /// Move a run to a terminal status and stamp `completed_at`
    async fn finish_run(&self, run_id: &str, status: RunStatus) -> Result<()>;

    /// Delete a run, cascading to its results
    async fn delete_run(&self, run_id: &str) -> Result<()>;
}
