use ai_client::{AiError, Evaluation};

use crate::config::FallbackPolicy;

use super::snapshot::SessionSnapshot;

/// Events broadcast from the session actor to all subscribers.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum SessionEvent {
    /// Full state snapshot after any mutation.
    StateChanged(SessionSnapshot),
    /// An AI request was sent for `generation`.
    AiThinking {
        request_id: u64,
        generation: u64,
        oracle: String,
    },
    /// The AI's move was applied.
    AiMoved {
        uci: String,
        san: String,
        oracle: String,
        evaluation: Evaluation,
    },
    /// The AI could not produce a usable move; `fallback` says what happens next.
    AiFailed {
        error: AiError,
        fallback: FallbackPolicy,
    },
    /// An answer arrived for a request or position that is no longer current.
    StaleAiResponse { request_id: u64, generation: u64 },
    AiCancelled { request_id: u64 },
    /// Error notification.
    Error(String),
}
