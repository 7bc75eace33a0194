//! Promptgate Gateway
//!
//! The HTTP surface of Promptgate plus the asynchronous suite-run
//! orchestrator. Sits between a client and an upstream text-generation
//! service, inspecting both sides of each exchange and deciding whether
//! to allow, block, or audit it.
//!
//! Data flow: client request -> decision engine (input) -> enforcement
//! gate -> upstream caller -> decision engine (output) -> enforcement
//! gate -> response. The run orchestrator drives many such exchanges
//! against the same path and aggregates outcomes.

pub mod config;
pub mod exchange;
pub mod routes;
pub mod runner;
pub mod upstream;

pub use config::{Cli, GatewayConfig};
pub use exchange::{BlockStage, ExchangeOutcome, GatewayService};
pub use routes::{create_router, AppState};
pub use runner::RunOrchestrator;
pub use upstream::{ChatRequest, UpstreamClient};
