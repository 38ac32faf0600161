//! Error types for the AI client

use std::time::Duration;

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Problems building a client; these never happen per request.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid AI service address: {0}")]
    InvalidAddress(String),

    #[error("Unsupported scheme in {0}: only http:// endpoints are supported")]
    UnsupportedScheme(String),
}

/// Why an AI move request failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    #[error("AI service unreachable: {0}")]
    Unreachable(String),

    #[error("AI service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("AI service rejected credentials (HTTP {0})")]
    Unauthorized(u16),

    #[error("Malformed AI response: {0}")]
    MalformedResponse(String),

    #[error("AI returned illegal move {mv}: {detail}")]
    IllegalMoveReturned { mv: String, detail: String },

    #[error("No legal move available")]
    NoMoveAvailable,
}

impl AiError {
    /// Transport failures are worth another attempt; answers are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout(_))
    }
}
