//! Gateway exchange path
//!
//! One reusable service composing the full request/response cycle:
//! input decision -> enforcement gate -> upstream call -> output
//! decision -> enforcement gate. Used by the HTTP handler for live
//! traffic and by the run orchestrator for batch replays.

use promptgate_core::{extract_output_text, Result, Violation};
use promptgate_policy::{DecisionEngine, EnforcementGate, GateOutcome};
use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::upstream::{ChatRequest, UpstreamClient};

/// Which side of the exchange produced the block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStage {
    /// Input-side block; the upstream call was never made
    Input,
    /// Output-side block; the response is withheld from the caller
    Output,
}

/// Outcome of driving one exchange through the gateway path
#[derive(Debug)]
pub enum ExchangeOutcome {
    /// The upstream response may be returned to the caller. Under audit
    /// mode `violations` carries annotations from either side.
    Completed {
        /// Raw upstream response body
        body: serde_json::Value,
        /// Generated text extracted from the body, if recognized
        text: Option<String>,
        /// Audit-mode annotations, empty when the exchange was clean
        violations: Vec<Violation>,
    },
    /// The exchange was rejected by policy
    Blocked {
        stage: BlockStage,
        violations: Vec<Violation>,
    },
}

/// The decision pipeline plus the upstream caller
pub struct GatewayService {
    engine: DecisionEngine,
    gate: EnforcementGate,
    upstream: UpstreamClient,
}

impl GatewayService {
    /// Build the service from configuration
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Ok(Self {
            engine: DecisionEngine::new(config.mode)?,
            gate: EnforcementGate::new(config.mode),
            upstream: UpstreamClient::new(
                &config.upstream_url,
                config.api_key.clone(),
                config.request_timeout_secs,
            )?,
        })
    }

    /// Drive one exchange through the full gateway path.
    ///
    /// Upstream failures propagate as errors; policy blocks are an
    /// [`ExchangeOutcome`], not an error.
    pub async fn execute(
        &self,
        request: &ChatRequest,
        auth: Option<&str>,
    ) -> Result<ExchangeOutcome> {
        let input_decision = self.engine.evaluate_input(&request.messages);
        let mut annotations: Vec<Violation> = Vec::new();

        match self.gate.decide(&input_decision) {
            GateOutcome::Reject { primary, violations } => {
                info!(category = %primary.category, "exchange blocked on input");
                metrics::counter!("promptgate_decisions_total", "phase" => "input", "action" => "block")
                    .increment(1);
                return Ok(ExchangeOutcome::Blocked {
                    stage: BlockStage::Input,
                    violations,
                });
            }
            GateOutcome::Annotate(violations) => {
                debug!(violations = violations.len(), "input annotated under audit mode");
                metrics::counter!("promptgate_decisions_total", "phase" => "input", "action" => "annotate")
                    .increment(1);
                annotations.extend(violations);
            }
            GateOutcome::Proceed => {
                metrics::counter!("promptgate_decisions_total", "phase" => "input", "action" => "pass")
                    .increment(1);
            }
        }

        let body = self.upstream.send(request, auth).await?;
        let text = extract_output_text(&body);

        let output_decision = self
            .engine
            .evaluate_output(text.as_deref().unwrap_or_default());

        match self.gate.decide(&output_decision) {
            GateOutcome::Reject { primary, violations } => {
                // The upstream call already happened; all we can do is
                // withhold the response from the caller.
                info!(category = %primary.category, "exchange blocked on output");
                metrics::counter!("promptgate_decisions_total", "phase" => "output", "action" => "block")
                    .increment(1);
                Ok(ExchangeOutcome::Blocked {
                    stage: BlockStage::Output,
                    violations,
                })
            }
            GateOutcome::Annotate(violations) => {
                debug!(violations = violations.len(), "output annotated under audit mode");
                metrics::counter!("promptgate_decisions_total", "phase" => "output", "action" => "annotate")
                    .increment(1);
                annotations.extend(violations);
                Ok(ExchangeOutcome::Completed {
                    body,
                    text,
                    violations: annotations,
                })
            }
            GateOutcome::Proceed => {
                metrics::counter!("promptgate_decisions_total", "phase" => "output", "action" => "pass")
                    .increment(1);
                Ok(ExchangeOutcome::Completed {
                    body,
                    text,
                    violations: annotations,
                })
            }
        }
    }
}
