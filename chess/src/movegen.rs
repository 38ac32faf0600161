//! Legal move generation.
//!
//! Pseudo-legal moves are generated per piece and then filtered by playing
//! each one and checking whether the mover's king is attacked afterwards.

use crate::board::{
    castle_target, king_home, rook_home, BoardState, DIAGONALS, KING_DELTAS, KNIGHT_DELTAS,
    ORTHOGONALS,
};
use crate::moves::{Move, MoveFlags};
use crate::types::{CastleSide, Piece, PieceColor, PieceKind, Square};

/// Every legal move for the side to move.
pub fn generate_legal_moves(state: &BoardState) -> Vec<Move> {
    let mover = state.side_to_move();
    let mut moves = pseudo_moves(state, true);
    moves.retain(|mv| !state.successor(mv).in_check(mover));
    moves
}

/// Legal moves of the piece standing on `from`.
pub fn legal_moves_from(state: &BoardState, from: Square) -> Vec<Move> {
    generate_legal_moves(state)
        .into_iter()
        .filter(|mv| mv.from == from)
        .collect()
}

pub fn has_legal_move(state: &BoardState) -> bool {
    let mover = state.side_to_move();
    pseudo_moves(state, true)
        .iter()
        .any(|mv| !state.successor(mv).in_check(mover))
}

/// Moves that follow piece movement rules without regard to king safety.
///
/// With `castle_safety` off, castling is generated even when the king starts
/// in, passes through, or lands on an attacked square.
pub(crate) fn pseudo_moves(state: &BoardState, castle_safety: bool) -> Vec<Move> {
    let mover = state.side_to_move();
    let mut out = Vec::with_capacity(64);
    for (sq, pc) in state.pieces() {
        if pc.color != mover {
            continue;
        }
        match pc.kind {
            PieceKind::Pawn => gen_pawn(state, sq, mover, &mut out),
            PieceKind::Knight => gen_steps(state, sq, mover, &KNIGHT_DELTAS, &mut out),
            PieceKind::Bishop => gen_slider(state, sq, mover, &DIAGONALS, &mut out),
            PieceKind::Rook => gen_slider(state, sq, mover, &ORTHOGONALS, &mut out),
            PieceKind::Queen => {
                gen_slider(state, sq, mover, &DIAGONALS, &mut out);
                gen_slider(state, sq, mover, &ORTHOGONALS, &mut out);
            }
            PieceKind::King => {
                gen_steps(state, sq, mover, &KING_DELTAS, &mut out);
                gen_castles(state, sq, mover, castle_safety, &mut out);
            }
        }
    }
    out
}

fn push_pawn_move(from: Square, to: Square, color: PieceColor, flags: MoveFlags, out: &mut Vec<Move>) {
    if to.rank() == color.promotion_rank() {
        for kind in PieceKind::PROMOTIONS {
            let mut mv = Move::with_promotion(from, to, kind);
            mv.flags = flags;
            out.push(mv);
        }
    } else {
        let mut mv = Move::new(from, to);
        mv.flags = flags;
        out.push(mv);
    }
}

fn gen_pawn(state: &BoardState, from: Square, color: PieceColor, out: &mut Vec<Move>) {
    let dir = color.pawn_direction();
    let start_rank = match color {
        PieceColor::White => 1,
        PieceColor::Black => 6,
    };

    if let Some(to) = from.offset(0, dir) {
        if state.piece_at(to).is_none() {
            push_pawn_move(from, to, color, MoveFlags::default(), out);
            if from.rank() == start_rank {
                if let Some(to2) = from.offset(0, 2 * dir) {
                    if state.piece_at(to2).is_none() {
                        out.push(Move::new(from, to2));
                    }
                }
            }
        }
    }

    for df in [-1, 1] {
        let Some(to) = from.offset(df, dir) else {
            continue;
        };
        match state.piece_at(to) {
            Some(target) if target.color != color => {
                let flags = MoveFlags {
                    capture: true,
                    ..MoveFlags::default()
                };
                push_pawn_move(from, to, color, flags, out);
            }
            None if state.en_passant() == Some(to) => {
                let victim = to.offset(0, -dir).and_then(|sq| state.piece_at(sq));
                if victim == Some(Piece::new(color.opposite(), PieceKind::Pawn)) {
                    let mut mv = Move::new(from, to);
                    mv.flags = MoveFlags {
                        capture: true,
                        en_passant: true,
                        castle: false,
                    };
                    out.push(mv);
                }
            }
            _ => {}
        }
    }
}

fn target_move(state: &BoardState, from: Square, to: Square, color: PieceColor) -> Option<Move> {
    match state.piece_at(to) {
        None => Some(Move::new(from, to)),
        Some(pc) if pc.color != color => {
            let mut mv = Move::new(from, to);
            mv.flags.capture = true;
            Some(mv)
        }
        Some(_) => None,
    }
}

fn gen_steps(
    state: &BoardState,
    from: Square,
    color: PieceColor,
    deltas: &[(i8, i8)],
    out: &mut Vec<Move>,
) {
    for &(df, dr) in deltas {
        if let Some(to) = from.offset(df, dr) {
            out.extend(target_move(state, from, to, color));
        }
    }
}

fn gen_slider(
    state: &BoardState,
    from: Square,
    color: PieceColor,
    dirs: &[(i8, i8)],
    out: &mut Vec<Move>,
) {
    for &(df, dr) in dirs {
        let mut cur = from.offset(df, dr);
        while let Some(to) = cur {
            out.extend(target_move(state, from, to, color));
            if state.piece_at(to).is_some() {
                break;
            }
            cur = to.offset(df, dr);
        }
    }
}

fn gen_castles(
    state: &BoardState,
    from: Square,
    color: PieceColor,
    castle_safety: bool,
    out: &mut Vec<Move>,
) {
    if from != king_home(color) {
        return;
    }
    if castle_safety && state.in_check(color) {
        return;
    }
    for side in [CastleSide::Kingside, CastleSide::Queenside] {
        if castle_path_open(state, color, side)
            && (!castle_safety || castle_path_safe(state, color, side))
        {
            let mut mv = Move::new(from, castle_target(color, side));
            mv.flags.castle = true;
            out.push(mv);
        }
    }
}

/// Rights present, rook at home, and no piece between king and rook.
pub(crate) fn castle_path_open(state: &BoardState, color: PieceColor, side: CastleSide) -> bool {
    if !state.castling().has(color, side) {
        return false;
    }
    let rook = rook_home(color, side);
    if state.piece_at(rook) != Some(Piece::new(color, PieceKind::Rook)) {
        return false;
    }
    let king = king_home(color);
    let (lo, hi) = if rook.file() < king.file() {
        (rook.file() + 1, king.file())
    } else {
        (king.file() + 1, rook.file())
    };
    (lo..hi).all(|file| {
        Square::new(file, color.back_rank()).is_some_and(|sq| state.piece_at(sq).is_none())
    })
}

/// The king's transit and landing squares are not attacked.
fn castle_path_safe(state: &BoardState, color: PieceColor, side: CastleSide) -> bool {
    let step: i8 = match side {
        CastleSide::Kingside => 1,
        CastleSide::Queenside => -1,
    };
    let king = king_home(color);
    [1, 2].iter().all(|&n| {
        king.offset(step * n, 0)
            .is_some_and(|sq| !state.is_square_attacked(sq, color.opposite()))
    })
}
