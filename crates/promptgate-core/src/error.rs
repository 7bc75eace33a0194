//! Error types for Promptgate

/// Result type alias using Promptgate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Promptgate operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed input, rejected before any policy evaluation
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream responded with a non-success status
    #[error("upstream error: status {status}: {body}")]
    Upstream {
        /// HTTP status code returned by the upstream
        status: u16,
        /// Response body, verbatim
        body: String,
    },

    /// Transport-level failure reaching the upstream
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// Storage collaborator failure
    #[error("store error: {0}")]
    Store(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new invalid-request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a new store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
