//! Gateway configuration

use clap::Parser;
use promptgate_core::EnforcementMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Command-line interface
#[derive(Parser, Debug)]
#[command(name = "promptgate")]
#[command(about = "Promptgate policy gateway", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Upstream model provider base URL
    #[arg(short, long)]
    pub upstream: Option<String>,

    /// Enforcement mode (block or audit)
    #[arg(short, long)]
    pub mode: Option<EnforcementMode>,

    /// Listen address
    #[arg(short = 'l', long, default_value = "0.0.0.0")]
    pub listen: String,

    /// Listen port
    #[arg(short = 'P', long, default_value = "8080")]
    pub port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Upstream model provider base URL (without the /v1 suffix)
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Enforcement mode applied to flagged exchanges
    #[serde(default)]
    pub mode: EnforcementMode,

    /// API key attached as a bearer token to upstream calls when the
    /// client did not supply its own Authorization header
    #[serde(default)]
    pub api_key: Option<String>,

    /// Upstream request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum length of the response excerpt stored per run result
    #[serde(default = "default_excerpt_limit")]
    pub excerpt_limit: usize,
}

impl GatewayConfig {
    /// Load configuration from a YAML file with CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        if let Some(upstream) = &cli.upstream {
            config.upstream_url = upstream.clone();
        }

        if let Some(mode) = cli.mode {
            config.mode = mode;
        }

        Ok(config)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            upstream_url: default_upstream_url(),
            mode: EnforcementMode::default(),
            api_key: None,
            request_timeout_secs: default_request_timeout(),
            excerpt_limit: default_excerpt_limit(),
        }
    }
}

fn default_upstream_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_request_timeout() -> u64 {
    300
}

fn default_excerpt_limit() -> usize {
    500
}
