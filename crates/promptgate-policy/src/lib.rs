//! Promptgate Policy
//!
//! The decision pipeline between client and upstream:
//! - [`DecisionEngine`] classifies message content into a
//!   [`promptgate_core::PolicyDecision`]
//! - [`EnforcementGate`] turns a decision and the configured enforcement
//!   mode into the externally observable outcome

pub mod engine;
pub mod gate;

pub use engine::DecisionEngine;
pub use gate::{EnforcementGate, GateOutcome};
