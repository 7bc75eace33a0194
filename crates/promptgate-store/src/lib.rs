//! Promptgate Store
//!
//! Storage models for suites, cases, runs, and run results, plus the
//! narrow [`Store`] interface the rest of the system depends on. Each
//! trait operation is individually atomic; the orchestrator relies on
//! `record_case_outcome` being an atomic increment (not a read-then-write
//! of a cached value) so concurrent runs never lose counter updates.

pub mod memory;
pub mod models;
pub mod store;

pub use memory::MemoryStore;
pub use models::{
    Case, ExpectedOutcome, NewCase, NewRunResult, Run, RunResult, RunStatus, Suite,
};
pub use store::Store;
