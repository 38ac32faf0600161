use ai_client::AiError;
use chess::{BoardState, GamePhase, GameStatus, HistoryEntry, Piece, PieceColor, Square};

/// Complete, immutable snapshot of session state.
/// Sent to subscribers on every state change and on subscribe.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub generation: u64,
    pub board: BoardState,
    pub fen: String,
    pub side_to_move: PieceColor,
    pub phase: GamePhase,
    pub status: GameStatus,
    pub history: Vec<MoveRecord>,
    pub last_move: Option<(Square, Square)>,
    pub ai_side: Option<PieceColor>,
    pub ai_thinking: bool,
    /// Set after a failed AI turn until the next retry or state change.
    pub last_ai_error: Option<AiError>,
}

impl SessionSnapshot {
    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    /// Is the AI expected to move in this position?
    pub fn ai_to_move(&self) -> bool {
        self.ai_side.is_some() && self.phase.to_move() == self.ai_side
    }
}

/// A single move in the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub uci: String,
    pub san: String,
    pub mover: PieceColor,
    pub captured: Option<Piece>,
    pub fen_after: String,
}

impl From<&HistoryEntry> for MoveRecord {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            uci: entry.uci(),
            san: entry.san.clone(),
            mover: entry.mover,
            captured: entry.captured,
            fen_after: chess::format_fen(&entry.state_after),
        }
    }
}
