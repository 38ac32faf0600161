//! Offline fallback engine.
//!
//! A small negamax searcher used when no remote AI service is configured or
//! when the remote one fails and the session falls back to playing locally.

mod eval;
mod search;

use std::sync::atomic::AtomicBool;
use std::time::Instant;

use chess::{BoardState, Move, PositionKey};

pub use eval::{evaluate, piece_value, MATE_SCORE};
pub use search::{pick_best_move, SearchLimits, SearchOutcome};

pub const DEFAULT_DEPTH: u8 = 3;

/// What the engine chose and how it got there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u8,
    pub nodes: u64,
}

#[derive(Debug, Clone)]
pub struct SimpleEngine {
    depth: u8,
}

impl SimpleEngine {
    pub fn new() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
        }
    }

    pub fn with_depth(depth: u8) -> Self {
        Self {
            depth: depth.max(1),
        }
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Search `state`, stopping early at `deadline` or when `stop` is set.
    pub fn search(
        &self,
        state: &BoardState,
        history: &[PositionKey],
        deadline: Option<Instant>,
        stop: Option<&AtomicBool>,
    ) -> SearchResult {
        let limits = SearchLimits {
            depth: self.depth,
            deadline,
            stop,
        };
        let outcome = pick_best_move(state, history, limits);
        tracing::debug!(
            nodes = outcome.nodes,
            stopped = outcome.stopped,
            "local search finished"
        );
        SearchResult {
            best_move: outcome.best_move.map(|(mv, _)| mv),
            score: outcome.best_move.map_or(0, |(_, s)| s),
            depth: self.depth,
            nodes: outcome.nodes,
        }
    }
}

impl Default for SimpleEngine {
    fn default() -> Self {
        Self::new()
    }
}
