use crate::board::{BoardState, PositionKey};
use crate::fen::{format_fen, parse_fen, FenError};
use crate::movegen::generate_legal_moves;
use crate::moves::Move;
use crate::notation::format_san;
use crate::pgn::{format_pgn, PgnTags};
use crate::rules::{classify, validate, GameStatus, IllegalMoveError};
use crate::types::{Piece, PieceColor, PieceKind};

/// One game from a start position: the current board, the append-only move
/// history and the status derived from them.
///
/// Every successful state change (a move, a resignation, an abort) bumps
/// the generation counter, which callers use to recognise stale work.
#[derive(Debug, Clone)]
pub struct Game {
    start: BoardState,
    start_fen: String,
    state: BoardState,
    history: Vec<HistoryEntry>,
    positions: Vec<PositionKey>,
    status: GameStatus,
    generation: u64,
}

/// A move that was applied to the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub mv: Move,
    pub san: String,
    pub mover: PieceColor,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub state_after: BoardState,
}

impl HistoryEntry {
    pub fn uci(&self) -> String {
        self.mv.to_string()
    }
}

/// Whose turn it is, or why the game is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    AwaitingWhiteMove,
    AwaitingBlackMove,
    Terminal(GameStatus),
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    /// Color expected to move next, if any.
    pub fn to_move(self) -> Option<PieceColor> {
        match self {
            Self::AwaitingWhiteMove => Some(PieceColor::White),
            Self::AwaitingBlackMove => Some(PieceColor::Black),
            Self::Terminal(_) => None,
        }
    }
}

/// Immutable copy of a game at one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub generation: u64,
    pub state: BoardState,
    pub history_uci: Vec<String>,
    pub start_fen: String,
}

impl Snapshot {
    pub fn fen(&self) -> String {
        format_fen(&self.state)
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.state.side_to_move()
    }
}

impl Game {
    pub fn new() -> Self {
        Self::from_state(BoardState::initial())
    }

    /// Start a game from an arbitrary position.
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        Ok(Self::from_state(parse_fen(fen)?))
    }

    fn from_state(start: BoardState) -> Self {
        let positions = vec![start.key()];
        let status = classify(&start, &positions);
        Self {
            start_fen: format_fen(&start),
            state: start.clone(),
            start,
            history: Vec::new(),
            positions,
            status,
            generation: 0,
        }
    }

    /// Validate and play `candidate`.
    ///
    /// Nothing changes on failure. A game in a terminal status rejects every
    /// move with [`GameError::SessionTerminated`].
    pub fn apply_move(&mut self, candidate: &Move) -> Result<HistoryEntry, GameError> {
        if self.status.is_terminal() {
            return Err(GameError::SessionTerminated(self.status));
        }
        let mv = validate(&self.state, candidate)?;
        let mover = self.state.side_to_move();
        let piece = self
            .state
            .piece_at(mv.from)
            .ok_or(GameError::Corrupt("validated move has no piece"))?;
        let captured = if mv.flags.en_passant {
            Some(Piece::new(mover.opposite(), PieceKind::Pawn))
        } else {
            self.state.piece_at(mv.to)
        };
        let san = format_san(&self.state, &mv);
        let next = self.state.successor(&mv);

        self.positions.push(next.key());
        self.status = classify(&next, &self.positions);
        self.state = next;
        self.generation += 1;

        let entry = HistoryEntry {
            mv,
            san,
            mover,
            piece,
            captured,
            state_after: self.state.clone(),
        };
        self.history.push(entry.clone());
        Ok(entry)
    }

    /// The side `loser` gives up.
    pub fn resign(&mut self, loser: PieceColor) -> Result<(), GameError> {
        self.finish(GameStatus::Resigned {
            winner: loser.opposite(),
        })
    }

    pub fn abort(&mut self) -> Result<(), GameError> {
        self.finish(GameStatus::Aborted)
    }

    fn finish(&mut self, status: GameStatus) -> Result<(), GameError> {
        if self.status.is_terminal() {
            return Err(GameError::SessionTerminated(self.status));
        }
        self.status = status;
        self.generation += 1;
        Ok(())
    }

    pub fn current_state(&self) -> BoardState {
        self.state.clone()
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn phase(&self) -> GamePhase {
        if self.status.is_terminal() {
            return GamePhase::Terminal(self.status);
        }
        match self.state.side_to_move() {
            PieceColor::White => GamePhase::AwaitingWhiteMove,
            PieceColor::Black => GamePhase::AwaitingBlackMove,
        }
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    pub fn fen(&self) -> String {
        format_fen(&self.state)
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        if self.status.is_terminal() {
            return Vec::new();
        }
        generate_legal_moves(&self.state)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            generation: self.generation,
            state: self.state.clone(),
            history_uci: self.history.iter().map(HistoryEntry::uci).collect(),
            start_fen: self.start_fen.clone(),
        }
    }

    /// Board after `ply` half-moves; `0` is the start position.
    pub fn position_at(&self, ply: usize) -> Option<&BoardState> {
        match ply {
            0 => Some(&self.start),
            n => self.history.get(n - 1).map(|entry| &entry.state_after),
        }
    }

    /// A fresh game that replays the first `plies` moves of this one.
    ///
    /// The new game's generation continues past this game's so that work
    /// started against either one can never be mistaken for current.
    pub fn replay_prefix(&self, plies: usize) -> Result<Game, GameError> {
        let mut game = Self::from_state(self.start.clone());
        for entry in self.history.iter().take(plies) {
            game.apply_move(&entry.mv)?;
        }
        game.continue_generation_from(self.generation);
        Ok(game)
    }

    /// Take back the last `plies` moves, producing a new game.
    pub fn takeback(&self, plies: usize) -> Result<Game, GameError> {
        if matches!(
            self.status,
            GameStatus::Resigned { .. } | GameStatus::Aborted
        ) {
            return Err(GameError::SessionTerminated(self.status));
        }
        if self.history.is_empty() {
            return Err(GameError::NothingToUndo);
        }
        self.replay_prefix(self.history.len().saturating_sub(plies))
    }

    /// Make this game's generation strictly greater than `previous`.
    pub fn continue_generation_from(&mut self, previous: u64) {
        self.generation = self.generation.max(previous + 1);
    }

    pub fn to_pgn(&self, tags: &PgnTags) -> String {
        format_pgn(self, tags)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Game is over ({0})")]
    SessionTerminated(GameStatus),
    #[error(transparent)]
    IllegalMove(#[from] IllegalMoveError),
    #[error("FEN parse error: {0}")]
    Fen(#[from] FenError),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Inconsistent game state: {0}")]
    Corrupt(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::parse_uci;
    use crate::rules::IllegalReason;

    fn play(game: &mut Game, moves: &[&str]) {
        for text in moves {
            game.apply_move(&parse_uci(text).unwrap()).unwrap();
        }
    }

    #[test]
    fn new_game_awaits_white() {
        let game = Game::new();
        assert_eq!(game.phase(), GamePhase::AwaitingWhiteMove);
        assert_eq!(game.generation(), 0);
        assert!(game.history().is_empty());
        assert_eq!(game.legal_moves().len(), 20);
    }

    #[test]
    fn applying_a_move_records_history() {
        let mut game = Game::new();
        let entry = game.apply_move(&parse_uci("e2e4").unwrap()).unwrap();
        assert_eq!(entry.san, "e4");
        assert_eq!(entry.mover, PieceColor::White);
        assert_eq!(entry.captured, None);
        assert_eq!(game.phase(), GamePhase::AwaitingBlackMove);
        assert_eq!(game.generation(), 1);
        assert_eq!(game.snapshot().history_uci, vec!["e2e4".to_string()]);
    }

    #[test]
    fn illegal_move_changes_nothing() {
        let mut game = Game::new();
        let before = game.snapshot();
        let err = game.apply_move(&parse_uci("e2e5").unwrap()).unwrap_err();
        assert!(matches!(
            err,
            GameError::IllegalMove(IllegalMoveError {
                reason: IllegalReason::Unreachable,
                ..
            })
        ));
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn en_passant_capture_is_recorded() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "a7a6", "e4e5", "d7d5"]);
        let entry = game.apply_move(&parse_uci("e5d6").unwrap()).unwrap();
        assert_eq!(
            entry.captured,
            Some(Piece::new(PieceColor::Black, PieceKind::Pawn))
        );
        assert_eq!(entry.san, "exd6");
    }

    #[test]
    fn resign_and_abort_are_terminal() {
        let mut game = Game::new();
        game.resign(PieceColor::White).unwrap();
        assert_eq!(
            game.phase(),
            GamePhase::Terminal(GameStatus::Resigned {
                winner: PieceColor::Black
            })
        );
        assert!(matches!(
            game.abort(),
            Err(GameError::SessionTerminated(_))
        ));
        assert!(game.legal_moves().is_empty());

        let mut game = Game::new();
        game.abort().unwrap();
        assert_eq!(game.status(), GameStatus::Aborted);
        assert_eq!(game.generation(), 1);
    }

    #[test]
    fn position_at_walks_the_history() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "e7e5"]);
        assert_eq!(game.position_at(0), Some(&BoardState::initial()));
        assert_eq!(
            game.position_at(1).map(BoardState::side_to_move),
            Some(PieceColor::Black)
        );
        assert_eq!(game.position_at(2), Some(game.state()));
        assert_eq!(game.position_at(3), None);
    }

    #[test]
    fn takeback_keeps_generation_monotonic() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "e7e5", "g1f3"]);
        let back = game.takeback(2).unwrap();
        assert_eq!(back.history().len(), 1);
        assert_eq!(back.phase(), GamePhase::AwaitingBlackMove);
        assert!(back.generation() > game.generation());
        // The original is untouched.
        assert_eq!(game.history().len(), 3);

        assert!(matches!(
            Game::new().takeback(1),
            Err(GameError::NothingToUndo)
        ));
    }

    #[test]
    fn loading_a_finished_position_is_terminal() {
        let game =
            Game::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert!(game.phase().is_terminal());
        assert_eq!(game.phase().to_move(), None);
    }
}
