//! Enforcement gate
//!
//! Turns a [`PolicyDecision`] into the externally observable outcome
//! under the configured enforcement mode. The mode is passed in at
//! construction rather than read from a hidden global, and is applied
//! twice per exchange: before the upstream call (input decision) and
//! after receiving the upstream response (output decision). An
//! output-side reject cannot "unsend" the request; it withholds the
//! final response from the caller.

use promptgate_core::{EnforcementMode, PolicyDecision, Violation};

/// Externally observable outcome of gating one decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// No violations; the exchange proceeds unconditionally
    Proceed,

    /// Audit mode with violations; the exchange proceeds with the
    /// violations surfaced as metadata
    Annotate(Vec<Violation>),

    /// Block mode with violations; the exchange must be rejected
    Reject {
        /// First violation, surfaced as the primary error
        primary: Violation,
        /// Full violation list, retained for observability
        violations: Vec<Violation>,
    },
}

/// Applies the enforcement mode to policy decisions
#[derive(Debug, Clone, Copy)]
pub struct EnforcementGate {
    mode: EnforcementMode,
}

impl EnforcementGate {
    /// Create a gate for the given mode
    pub fn new(mode: EnforcementMode) -> Self {
        Self { mode }
    }

    /// Decide the outcome for one policy decision
    pub fn decide(&self, decision: &PolicyDecision) -> GateOutcome {
        let Some(primary) = decision.violations.first() else {
            return GateOutcome::Proceed;
        };

        match self.mode {
            EnforcementMode::Block => GateOutcome::Reject {
                primary: primary.clone(),
                violations: decision.violations.clone(),
            },
            EnforcementMode::Audit => GateOutcome::Annotate(decision.violations.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flagged_decision(mode: EnforcementMode) -> PolicyDecision {
        PolicyDecision::from_violations(
            vec![
                Violation::new("pii.email", "email address detected"),
                Violation::new("pii.phone", "phone number detected"),
            ],
            mode,
        )
    }

    #[test]
    fn test_block_mode_rejects_with_first_violation_primary() {
        let gate = EnforcementGate::new(EnforcementMode::Block);
        let outcome = gate.decide(&flagged_decision(EnforcementMode::Block));

        match outcome {
            GateOutcome::Reject { primary, violations } => {
                assert_eq!(primary.category, "pii.email");
                assert_eq!(violations.len(), 2);
            }
            other => panic!("expected reject, got {:?}", other),
        }
    }

    #[test]
    fn test_audit_mode_annotates_instead_of_rejecting() {
        let gate = EnforcementGate::new(EnforcementMode::Audit);
        let outcome = gate.decide(&flagged_decision(EnforcementMode::Audit));

        match outcome {
            GateOutcome::Annotate(violations) => assert_eq!(violations.len(), 2),
            other => panic!("expected annotate, got {:?}", other),
        }
    }

    #[test]
    fn test_clean_decision_proceeds_in_both_modes() {
        for mode in [EnforcementMode::Block, EnforcementMode::Audit] {
            let gate = EnforcementGate::new(mode);
            assert_eq!(gate.decide(&PolicyDecision::allow()), GateOutcome::Proceed);
        }
    }
}
