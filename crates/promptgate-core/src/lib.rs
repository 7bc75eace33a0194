//! Promptgate Core
//!
//! Core types and utilities shared across Promptgate components.
//!
//! This crate provides:
//! - Common types for chat messages, violations, and policy decisions
//! - Error types and result handling
//! - The enforcement mode switch shared by the gate and configuration
//! - Tolerant extraction of generated text from upstream response bodies

pub mod adapters;
pub mod error;
pub mod types;

pub use adapters::extract_output_text;
pub use error::{Error, Result};
pub use types::{ChatMessage, EnforcementMode, PolicyAction, PolicyDecision, Violation};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{ChatMessage, EnforcementMode, PolicyAction, PolicyDecision, Violation};
}
