//! Move validation and game-status classification.

use std::fmt;

use crate::board::{castle_target, king_home, rook_home, BoardState, PositionKey};
use crate::movegen::{castle_path_open, generate_legal_moves, has_legal_move, pseudo_moves};
use crate::moves::Move;
use crate::types::{CastleSide, Piece, PieceColor, PieceKind, Square};

/// Status of a position, or of a session that was ended by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Ongoing,
    Check,
    Checkmate { winner: PieceColor },
    Stalemate,
    DrawFiftyMove,
    DrawRepetition,
    DrawInsufficientMaterial,
    Resigned { winner: PieceColor },
    Aborted,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Ongoing | Self::Check)
    }

    pub fn winner(self) -> Option<PieceColor> {
        match self {
            Self::Checkmate { winner } | Self::Resigned { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn is_draw(self) -> bool {
        matches!(
            self,
            Self::Stalemate
                | Self::DrawFiftyMove
                | Self::DrawRepetition
                | Self::DrawInsufficientMaterial
        )
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ongoing => write!(f, "ongoing"),
            Self::Check => write!(f, "check"),
            Self::Checkmate { winner } => write!(f, "checkmate, {} wins", winner),
            Self::Stalemate => write!(f, "draw by stalemate"),
            Self::DrawFiftyMove => write!(f, "draw by fifty-move rule"),
            Self::DrawRepetition => write!(f, "draw by threefold repetition"),
            Self::DrawInsufficientMaterial => write!(f, "draw by insufficient material"),
            Self::Resigned { winner } => write!(f, "{} resigned, {} wins", winner.opposite(), winner),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Why a candidate move was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IllegalReason {
    /// No piece on the source square.
    NoPiece,
    /// The piece belongs to the side that is not on move.
    OutOfTurn,
    /// The destination holds a piece of the mover's own color.
    WrongSidePiece,
    /// Missing, invalid or misplaced promotion kind.
    MalformedPromotion,
    /// Another piece stands in the way.
    BlockedPath,
    /// The mover's king would be in check afterwards.
    ExposesKing,
    /// Castling right already lost.
    NoCastlingRights,
    /// The piece never moves that way.
    Unreachable,
}

impl fmt::Display for IllegalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoPiece => "no piece on source square",
            Self::OutOfTurn => "piece belongs to the side not on move",
            Self::WrongSidePiece => "destination occupied by own piece",
            Self::MalformedPromotion => "malformed promotion",
            Self::BlockedPath => "path is blocked",
            Self::ExposesKing => "king would be in check",
            Self::NoCastlingRights => "castling right lost",
            Self::Unreachable => "piece cannot move that way",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Illegal move {mv}: {reason}")]
pub struct IllegalMoveError {
    pub mv: Move,
    pub reason: IllegalReason,
}

/// Check a candidate against the legal moves of `state`.
///
/// Matching ignores the candidate's flags; on success the generated move
/// (with capture/en-passant/castle flags set) is returned.
pub fn validate(state: &BoardState, candidate: &Move) -> Result<Move, IllegalMoveError> {
    generate_legal_moves(state)
        .into_iter()
        .find(|legal| legal.same_action(candidate))
        .ok_or_else(|| IllegalMoveError {
            mv: *candidate,
            reason: diagnose(state, candidate),
        })
}

fn diagnose(state: &BoardState, mv: &Move) -> IllegalReason {
    let mover = state.side_to_move();
    let Some(piece) = state.piece_at(mv.from) else {
        return IllegalReason::NoPiece;
    };
    if piece.color != mover {
        return IllegalReason::OutOfTurn;
    }
    if state.piece_at(mv.to).is_some_and(|pc| pc.color == mover) {
        return IllegalReason::WrongSidePiece;
    }

    match mv.promotion {
        Some(kind) => {
            if piece.kind != PieceKind::Pawn
                || mv.to.rank() != mover.promotion_rank()
                || !kind.is_promotion_target()
            {
                return IllegalReason::MalformedPromotion;
            }
        }
        None => {
            let queened = Move::with_promotion(mv.from, mv.to, PieceKind::Queen);
            if piece.kind == PieceKind::Pawn
                && mv.to.rank() == mover.promotion_rank()
                && pseudo_moves(state, false)
                    .iter()
                    .any(|m| m.same_action(&queened))
            {
                return IllegalReason::MalformedPromotion;
            }
        }
    }

    if pseudo_moves(state, false).iter().any(|m| m.same_action(mv)) {
        return IllegalReason::ExposesKing;
    }

    if piece.kind == PieceKind::King && mv.from == king_home(mover) {
        for side in [CastleSide::Kingside, CastleSide::Queenside] {
            if mv.to == castle_target(mover, side) {
                let rook = Piece::new(mover, PieceKind::Rook);
                if !state.castling().has(mover, side)
                    || state.piece_at(rook_home(mover, side)) != Some(rook)
                {
                    return IllegalReason::NoCastlingRights;
                }
                if !castle_path_open(state, mover, side) {
                    return IllegalReason::BlockedPath;
                }
            }
        }
    }

    if moves_like(state, piece.kind, mover, mv.from, mv.to) {
        IllegalReason::BlockedPath
    } else {
        IllegalReason::Unreachable
    }
}

/// Would this piece make the move on a board with nothing in its way?
fn moves_like(
    state: &BoardState,
    kind: PieceKind,
    color: PieceColor,
    from: Square,
    to: Square,
) -> bool {
    let df = to.file() as i8 - from.file() as i8;
    let dr = to.rank() as i8 - from.rank() as i8;
    let diagonal = df != 0 && df.abs() == dr.abs();
    let straight = (df == 0) != (dr == 0);
    match kind {
        PieceKind::Knight | PieceKind::King => false,
        PieceKind::Bishop => diagonal,
        PieceKind::Rook => straight,
        PieceKind::Queen => diagonal || straight,
        PieceKind::Pawn => {
            let dir = color.pawn_direction();
            let start_rank = match color {
                PieceColor::White => 1,
                PieceColor::Black => 6,
            };
            // A blocked push; diagonal steps onto empty squares are never legal.
            df == 0
                && (dr == dir || (dr == 2 * dir && from.rank() == start_rank))
                && (state.piece_at(to).is_some()
                    || from
                        .offset(0, dir)
                        .is_some_and(|sq| state.piece_at(sq).is_some()))
        }
    }
}

/// Classify `state`, given the position keys of the game so far.
///
/// `positions` must include the key of `state` itself as its last element;
/// repetition is a draw once the current key has occurred three times.
pub fn classify(state: &BoardState, positions: &[PositionKey]) -> GameStatus {
    let in_check = state.is_check();
    if !has_legal_move(state) {
        return if in_check {
            GameStatus::Checkmate {
                winner: state.side_to_move().opposite(),
            }
        } else {
            GameStatus::Stalemate
        };
    }
    if is_insufficient_material(state) {
        return GameStatus::DrawInsufficientMaterial;
    }
    if state.halfmove_clock() >= 100 {
        return GameStatus::DrawFiftyMove;
    }
    let key = state.key();
    if positions.iter().filter(|k| **k == key).count() >= 3 {
        return GameStatus::DrawRepetition;
    }
    if in_check {
        GameStatus::Check
    } else {
        GameStatus::Ongoing
    }
}

/// Neither side can possibly deliver mate: bare kings, a single minor piece,
/// or only bishops that all stand on one square color.
pub fn is_insufficient_material(state: &BoardState) -> bool {
    let mut minors = 0;
    let mut knights = 0;
    let mut bishop_colors = (false, false);
    for (sq, pc) in state.pieces() {
        match pc.kind {
            PieceKind::King => {}
            PieceKind::Knight => {
                minors += 1;
                knights += 1;
            }
            PieceKind::Bishop => {
                minors += 1;
                if sq.is_dark() {
                    bishop_colors.0 = true;
                } else {
                    bishop_colors.1 = true;
                }
            }
            PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
        }
    }
    if minors <= 1 {
        return true;
    }
    knights == 0 && !(bishop_colors.0 && bishop_colors.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::CastlingRights;
    use crate::fen::parse_fen;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn reason(fen: &str, from: &str, to: &str, promo: Option<PieceKind>) -> IllegalReason {
        let state = parse_fen(fen).unwrap();
        let mv = match promo {
            Some(kind) => Move::with_promotion(sq(from), sq(to), kind),
            None => Move::new(sq(from), sq(to)),
        };
        validate(&state, &mv).unwrap_err().reason
    }

    const START: &str = crate::fen::STARTING_FEN;

    #[test]
    fn validate_fills_in_flags() {
        let state = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mv = validate(&state, &Move::new(sq("e1"), sq("g1"))).unwrap();
        assert!(mv.flags.castle);
        let mv = validate(&state, &Move::new(sq("a1"), sq("a8"))).unwrap();
        assert!(mv.flags.capture);
    }

    #[test]
    fn rejection_reasons() {
        assert_eq!(reason(START, "e4", "e5", None), IllegalReason::NoPiece);
        assert_eq!(reason(START, "e7", "e5", None), IllegalReason::OutOfTurn);
        assert_eq!(reason(START, "d1", "d2", None), IllegalReason::WrongSidePiece);
        assert_eq!(reason(START, "f1", "c4", None), IllegalReason::BlockedPath);
        assert_eq!(reason(START, "g1", "g3", None), IllegalReason::Unreachable);
        assert_eq!(reason(START, "e2", "d3", None), IllegalReason::Unreachable);
        assert_eq!(
            reason(START, "e2", "e4", Some(PieceKind::Queen)),
            IllegalReason::MalformedPromotion
        );
    }

    #[test]
    fn blocked_pawn_pushes() {
        let fen = "4k3/8/8/8/8/4p3/4P3/4K3 w - - 0 1";
        assert_eq!(reason(fen, "e2", "e3", None), IllegalReason::BlockedPath);
        assert_eq!(reason(fen, "e2", "e4", None), IllegalReason::BlockedPath);
    }

    #[test]
    fn exposing_the_king_is_rejected() {
        let fen = "4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1";
        assert_eq!(reason(fen, "e2", "c3", None), IllegalReason::ExposesKing);
        let fen = "4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1";
        assert_eq!(reason(fen, "e1", "g1", None), IllegalReason::ExposesKing);
    }

    #[test]
    fn castling_reasons() {
        assert_eq!(reason(START, "e1", "g1", None), IllegalReason::BlockedPath);
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1";
        assert_eq!(reason(fen, "e1", "g1", None), IllegalReason::NoCastlingRights);

        // A right listed in the FEN without its rook is dropped on parse.
        let fen = "4k3/p7/8/8/8/8/P7/4K3 w K - 0 1";
        assert_eq!(reason(fen, "e1", "g1", None), IllegalReason::NoCastlingRights);
    }

    #[test]
    fn castling_without_the_rook_at_home() {
        let parsed = parse_fen("4k3/8/8/8/8/8/5R2/4K3 w - - 0 1").unwrap();
        let mut squares = [None; 64];
        for (sq, pc) in parsed.pieces() {
            squares[sq.index()] = Some(pc);
        }
        let mut rights = CastlingRights::NONE;
        rights.white_kingside = true;
        let state = BoardState::from_parts(squares, PieceColor::White, rights, None, 0, 1);

        let err = validate(&state, &Move::new(sq("e1"), sq("g1"))).unwrap_err();
        assert_eq!(err.reason, IllegalReason::NoCastlingRights);
    }

    #[test]
    fn promotion_reasons() {
        let fen = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";
        assert_eq!(reason(fen, "e7", "e8", None), IllegalReason::MalformedPromotion);
        assert_eq!(
            reason(fen, "e7", "e8", Some(PieceKind::King)),
            IllegalReason::MalformedPromotion
        );
        let state = parse_fen(fen).unwrap();
        let mv = Move::with_promotion(sq("e7"), sq("e8"), PieceKind::Knight);
        assert!(validate(&state, &mv).is_ok());
    }

    #[test]
    fn classify_terminal_positions() {
        let mate = parse_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        assert_eq!(
            classify(&mate, &[mate.key()]),
            GameStatus::Checkmate {
                winner: PieceColor::Black
            }
        );

        let stalemate = parse_fen("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(classify(&stalemate, &[stalemate.key()]), GameStatus::Stalemate);

        let fifty = parse_fen("4k3/8/8/8/8/8/R7/4K3 w - - 100 80").unwrap();
        assert_eq!(classify(&fifty, &[fifty.key()]), GameStatus::DrawFiftyMove);

        let bare = parse_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(
            classify(&bare, &[bare.key()]),
            GameStatus::DrawInsufficientMaterial
        );

        let check = parse_fen("4k3/8/8/8/8/8/4R3/4K3 b - - 0 1").unwrap();
        assert_eq!(classify(&check, &[check.key()]), GameStatus::Check);
    }

    #[test]
    fn repetition_needs_three_occurrences() {
        let state = BoardState::initial();
        let key = state.key();
        assert_eq!(classify(&state, &[key.clone(), key.clone()]), GameStatus::Ongoing);
        assert_eq!(
            classify(&state, &[key.clone(), key.clone(), key]),
            GameStatus::DrawRepetition
        );
    }

    #[test]
    fn insufficient_material_cases() {
        let cases = [
            ("4k3/8/8/8/8/8/8/4K3 w - - 0 1", true),
            ("4k3/8/8/8/8/8/8/3BK3 w - - 0 1", true),
            ("4k3/8/8/8/8/8/8/3NK3 w - - 0 1", true),
            ("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1", true),
            ("3bk3/8/8/8/8/8/8/2B1K3 w - - 0 1", false),
            ("4k3/8/8/8/8/8/8/2NNK3 w - - 0 1", false),
            ("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1", false),
        ];
        for (fen, expected) in cases {
            let state = parse_fen(fen).unwrap();
            assert_eq!(is_insufficient_material(&state), expected, "{fen}");
        }
    }
}
