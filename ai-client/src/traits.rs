//! MoveOracle trait abstraction for AI move sources

use std::time::Duration;

use async_trait::async_trait;
use chess::{Move, Snapshot};

use crate::error::AiError;
use crate::wire::Evaluation;

/// A move chosen by an oracle for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiMove {
    pub mv: Move,
    pub evaluation: Evaluation,
    /// Generation of the snapshot the move was computed against.
    pub generation: u64,
}

/// Something that picks a move for a position.
/// Implemented by RemoteAiClient, the local engine oracle and MockOracle.
#[async_trait]
pub trait MoveOracle: Send + Sync {
    /// Choose a move for the side to move in `snapshot`.
    ///
    /// `think` is advisory; implementations bound their own wall time.
    /// A returned move has already passed `chess::validate` against the
    /// snapshot.
    async fn request_move(&self, snapshot: &Snapshot, think: Duration)
        -> Result<AiMove, AiError>;

    /// Short label for logs and status lines.
    fn name(&self) -> &str;
}
