//! Move-generation node counts.

use crate::board::BoardState;
use crate::movegen::generate_legal_moves;
use crate::moves::Move;

/// Number of leaf nodes of the legal move tree `depth` plies deep.
pub fn perft(state: &BoardState, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generate_legal_moves(state);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .iter()
        .map(|mv| perft(&state.successor(mv), depth - 1))
        .sum()
}

/// Perft split by root move, in generation order.
pub fn perft_divide(state: &BoardState, depth: u32) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    generate_legal_moves(state)
        .into_iter()
        .map(|mv| (mv, perft(&state.successor(&mv), depth - 1)))
        .collect()
}
