//! Material, mobility and check evaluation.

use chess::{BoardState, PieceColor, PieceKind};

/// Score for the side to move being checkmated.
pub const MATE_SCORE: i32 = 10_000;

const MOBILITY_WEIGHT: i32 = 2;
const CHECK_BONUS: i32 = 15;

/// Evaluates a non-terminal position from the side-to-move's perspective.
///
/// `mobility` is the number of legal moves available to the side to move.
pub fn evaluate(state: &BoardState, mobility: usize) -> i32 {
    let mut material = 0i32;
    for (_, pc) in state.pieces() {
        let v = piece_value(pc.kind);
        material += if pc.color == PieceColor::White { v } else { -v };
    }
    let mut score = match state.side_to_move() {
        PieceColor::White => material,
        PieceColor::Black => -material,
    };
    score += mobility as i32 * MOBILITY_WEIGHT;
    if state.is_check() {
        score -= CHECK_BONUS;
    }
    score
}

#[inline]
pub fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 0,
    }
}
