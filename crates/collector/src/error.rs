//! Collection Error Types

use thiserror::Error;

/// Errors from polling a single alert source
#[derive(Debug, Error)]
pub enum CollectError {
    /// Endpoint entry cannot be turned into a URL
    #[error("Invalid endpoint {entry:?}: {reason}")]
    InvalidEndpoint { entry: String, reason: String },

    /// Connection or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// No complete response within the request timeout
    #[error("Timeout waiting for response after {0}ms")]
    Timeout(u64),

    /// Source answered with a non-success status
    #[error("Non-OK response: {0}")]
    Status(u16),

    /// Body was not a JSON array of alerts
    #[error("Error parsing JSON: {0}")]
    Decode(String),
}

impl CollectError {
    /// Short label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            CollectError::InvalidEndpoint { .. } => "invalid_endpoint",
            CollectError::Transport(_) => "transport",
            CollectError::Timeout(_) => "timeout",
            CollectError::Status(_) => "status",
            CollectError::Decode(_) => "decode",
        }
    }
}
