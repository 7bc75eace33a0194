//! Storage models
//!
//! Lifecycle: a Suite owns its Cases and is referenced, not owned, by
//! zero or more Runs; a Run owns its RunResults (deleting a Run
//! cascades). A Run freezes `total_cases` at submission time, so case
//! edits never retroactively alter an in-flight or historical run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named collection of test prompts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suite {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Expected gateway outcome for a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedOutcome {
    /// The prompt should pass through the gateway
    Allow,
    /// The prompt should be rejected by policy
    Block,
}

/// One prompt plus its expectation within a suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub suite_id: String,
    pub prompt: String,
    pub expected_outcome: ExpectedOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a case (suite authoring or bulk import)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCase {
    pub prompt: String,
    pub expected_outcome: ExpectedOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Terminal and in-flight states of a run
///
/// Transitions: `Running -> Completed` or `Running -> Failed`, nothing
/// else. A terminal run is never resumed or re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// One execution of a suite against a model
///
/// `completed_cases == passed_cases + failed_cases` holds at every
/// observable point once case execution has started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub suite_id: String,
    pub model_id: String,
    pub status: RunStatus,
    pub total_cases: u32,
    pub completed_cases: u32,
    pub passed_cases: u32,
    pub failed_cases: u32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Run {
    /// Whether the run has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status != RunStatus::Running
    }
}

/// Per-case outcome record, created exactly once in suite order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub id: String,
    pub run_id: String,
    pub case_id: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_excerpt: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for recording a run result
#[derive(Debug, Clone)]
pub struct NewRunResult {
    pub run_id: String,
    pub case_id: String,
    pub passed: bool,
    pub violations: Option<serde_json::Value>,
    pub response_excerpt: Option<String>,
}
