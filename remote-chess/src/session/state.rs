use std::sync::Arc;
use std::time::Duration;

use ai_client::{AiError, AiMove, MoveOracle};
use chess::{Game, PgnTags, PieceColor};
use tokio::task::JoinHandle;

use crate::config::FallbackPolicy;

use super::commands::SessionError;
use super::snapshot::{MoveRecord, SessionSnapshot};

/// Result of one AI request, sent back to the actor by the request task.
#[derive(Debug)]
pub(crate) struct AiOutcome {
    pub request_id: u64,
    pub generation: u64,
    pub oracle: String,
    /// The request came from the local fallback after a remote failure.
    pub fallback: bool,
    pub result: Result<AiMove, AiError>,
}

/// The one AI request the actor is waiting for.
pub(crate) struct PendingAi {
    pub request_id: u64,
    pub generation: u64,
    pub fallback: bool,
    pub task: JoinHandle<()>,
}

/// Internal mutable state, owned entirely by the session actor. No locks.
pub(crate) struct SessionState {
    pub session_id: String,
    pub game: Game,
    pub ai_side: Option<PieceColor>,
    pub oracle: Arc<dyn MoveOracle>,
    pub local_oracle: Arc<dyn MoveOracle>,
    pub think: Duration,
    pub fallback: FallbackPolicy,
    pub pending: Option<PendingAi>,
    next_request_id: u64,
    /// After a reported failure or a cancel the AI waits for `RequestAi`.
    pub ai_paused: bool,
    pub last_ai_error: Option<AiError>,
}

impl SessionState {
    pub fn new(
        session_id: String,
        game: Game,
        oracle: Arc<dyn MoveOracle>,
        local_oracle: Arc<dyn MoveOracle>,
    ) -> Self {
        Self {
            session_id,
            game,
            ai_side: None,
            oracle,
            local_oracle,
            think: crate::session::DEFAULT_THINK,
            fallback: FallbackPolicy::default(),
            pending: None,
            next_request_id: 1,
            ai_paused: false,
            last_ai_error: None,
        }
    }

    /// Build a full snapshot of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let history: Vec<MoveRecord> = self.game.history().iter().map(MoveRecord::from).collect();
        let last_move = self.game.history().last().map(|e| (e.mv.from, e.mv.to));

        SessionSnapshot {
            session_id: self.session_id.clone(),
            generation: self.game.generation(),
            board: self.game.current_state(),
            fen: self.game.fen(),
            side_to_move: self.game.state().side_to_move(),
            phase: self.game.phase(),
            status: self.game.status(),
            history,
            last_move,
            ai_side: self.ai_side,
            ai_thinking: self.pending.is_some(),
            last_ai_error: self.last_ai_error.clone(),
        }
    }

    pub fn allocate_request_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// Should the actor start an AI request now?
    pub fn should_start_ai(&self) -> bool {
        self.pending.is_none()
            && !self.ai_paused
            && self.ai_side.is_some()
            && self.game.phase().to_move() == self.ai_side
    }

    /// Abort the in-flight request, if any, and return its id.
    pub fn cancel_pending(&mut self) -> Option<u64> {
        let pending = self.pending.take()?;
        pending.task.abort();
        tracing::debug!(request_id = pending.request_id, "AI request cancelled");
        Some(pending.request_id)
    }

    /// Swap in a new live game. Its generation continues past the old one's.
    pub fn replace_game(&mut self, mut game: Game) {
        game.continue_generation_from(self.game.generation());
        self.game = game;
        self.ai_paused = false;
        self.last_ai_error = None;
    }

    pub fn apply_takeback(&mut self) -> Result<SessionSnapshot, SessionError> {
        let mut back = self.game.takeback(1)?;
        let ai_to_move = self.ai_side.is_some() && back.phase().to_move() == self.ai_side;
        if ai_to_move && !back.history().is_empty() {
            back = self.game.takeback(2)?;
        }
        self.replace_game(back);
        Ok(self.snapshot())
    }

    pub fn apply_new_game(&mut self, fen: Option<&str>) -> Result<SessionSnapshot, SessionError> {
        let game = match fen {
            Some(f) => Game::from_fen(f).map_err(|e| SessionError::InvalidFen(e.to_string()))?,
            None => Game::new(),
        };
        self.replace_game(game);
        Ok(self.snapshot())
    }

    pub fn apply_rewind(&mut self, ply: usize) -> Result<SessionSnapshot, SessionError> {
        let len = self.game.history().len();
        if ply > len {
            return Err(SessionError::PlyOutOfRange { ply, len });
        }
        let game = self.game.replay_prefix(ply)?;
        self.replace_game(game);
        Ok(self.snapshot())
    }

    pub fn pgn_tags(&self) -> PgnTags {
        let name = |color: PieceColor| {
            if self.ai_side == Some(color) {
                format!("AI ({})", self.oracle.name())
            } else {
                "Human".to_string()
            }
        };
        PgnTags {
            event: "Casual game".to_string(),
            site: "remote-chess".to_string(),
            white: name(PieceColor::White),
            black: name(PieceColor::Black),
            ..PgnTags::default()
        }
    }
}
