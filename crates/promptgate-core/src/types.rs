//! Core types for Promptgate

use serde::{Deserialize, Serialize};

/// A chat message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

/// A single policy finding against a piece of text
///
/// Categories are dot-namespaced, e.g. `pii.email`, `pii_output.email`,
/// `prompt-injection`. Produced fresh per evaluation call, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Category identifier
    pub category: String,

    /// Human-readable explanation
    pub reason: String,
}

impl Violation {
    /// Create a new violation
    pub fn new(category: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            reason: reason.into(),
        }
    }

    /// Return a copy of this violation with the category re-tagged
    /// from one namespace prefix to another (e.g. `pii.` -> `pii_output.`)
    pub fn retag(&self, from_prefix: &str, to_prefix: &str) -> Self {
        let category = match self.category.strip_prefix(from_prefix) {
            Some(rest) => format!("{}{}", to_prefix, rest),
            None => self.category.clone(),
        };
        Self {
            category,
            reason: self.reason.clone(),
        }
    }
}

/// Action side of a policy decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    /// The exchange may proceed
    Allow,
    /// The exchange must be rejected
    Block,
}

/// Outcome of evaluating one side of an exchange
///
/// `action` is `Block` iff violations are present and the engine runs in
/// block mode; under audit mode the action stays `Allow` while the
/// violations remain populated for the caller to surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Allow or block
    pub action: PolicyAction,

    /// Ordered findings (PII first, then heuristic)
    pub violations: Vec<Violation>,
}

impl PolicyDecision {
    /// An empty, non-blocking decision
    pub fn allow() -> Self {
        Self {
            action: PolicyAction::Allow,
            violations: Vec::new(),
        }
    }

    /// Build a decision from findings under the given enforcement mode
    pub fn from_violations(violations: Vec<Violation>, mode: EnforcementMode) -> Self {
        let action = if !violations.is_empty() && mode == EnforcementMode::Block {
            PolicyAction::Block
        } else {
            PolicyAction::Allow
        };
        Self { action, violations }
    }

    /// Whether any violation was recorded, regardless of action
    pub fn is_flagged(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Process-wide enforcement switch
///
/// `Block` rejects flagged exchanges; `Audit` lets them through with the
/// violations attached as metadata. Passed explicitly into the gate so
/// tests can exercise both modes without environment mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementMode {
    /// Reject flagged exchanges
    #[default]
    Block,
    /// Annotate flagged exchanges and let them through
    Audit,
}

impl std::str::FromStr for EnforcementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "audit" => Ok(Self::Audit),
            other => Err(format!("unknown enforcement mode: {}", other)),
        }
    }
}

impl std::fmt::Display for EnforcementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Block => write!(f, "block"),
            Self::Audit => write!(f, "audit"),
        }
    }
}
