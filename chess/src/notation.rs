//! Coordinate (UCI) and Standard Algebraic Notation.

use crate::board::{castle_target, king_home, rook_home, BoardState};
use crate::movegen::{generate_legal_moves, has_legal_move};
use crate::moves::Move;
use crate::types::{CastleSide, Piece, PieceKind, Square};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid move text: {0}")]
    InvalidFormat(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
    #[error("No legal move matches: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
}

/// Parse coordinate notation (`e2e4`, `e7e8q`) into a candidate move.
///
/// The result carries no flags; it still has to go through `rules::validate`.
pub fn parse_uci(text: &str) -> Result<Move, NotationError> {
    let text = text.trim();
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(NotationError::InvalidFormat(text.to_string()));
    }
    let from: Square = text[0..2].parse()?;
    let to: Square = text[2..4].parse()?;
    match text[4..].chars().next() {
        None => Ok(Move::new(from, to)),
        Some(c) => {
            let kind = PieceKind::from_char(c)
                .ok_or_else(|| NotationError::InvalidPromotion(text.to_string()))?;
            Ok(Move::with_promotion(from, to, kind))
        }
    }
}

/// Rewrite king-takes-own-rook castling (`e1h1`) as the king's two-square step.
pub fn normalize_castling(state: &BoardState, mv: Move) -> Move {
    let mover = state.side_to_move();
    if mv.promotion.is_some()
        || mv.from != king_home(mover)
        || state.piece_at(mv.from) != Some(Piece::new(mover, PieceKind::King))
        || state.piece_at(mv.to) != Some(Piece::new(mover, PieceKind::Rook))
    {
        return mv;
    }
    for side in [CastleSide::Kingside, CastleSide::Queenside] {
        if mv.to == rook_home(mover, side) {
            return Move::new(mv.from, castle_target(mover, side));
        }
    }
    mv
}

/// Attach a queen promotion to a pawn move onto the last rank that has none.
///
/// Used for typed user input only; the legality engine stays strict.
pub fn with_auto_queen(state: &BoardState, mv: Move) -> Move {
    let mover = state.side_to_move();
    let is_own_pawn = state.piece_at(mv.from) == Some(Piece::new(mover, PieceKind::Pawn));
    if mv.promotion.is_none() && is_own_pawn && mv.to.rank() == mover.promotion_rank() {
        Move::with_promotion(mv.from, mv.to, PieceKind::Queen)
    } else {
        mv
    }
}

/// Read a move in either notation: coordinate form first, then SAN.
///
/// A coordinate move comes back as an unvalidated candidate (with castling
/// normalised); a SAN move is already resolved against the legal moves.
pub fn parse_move(state: &BoardState, text: &str) -> Result<Move, NotationError> {
    match parse_uci(text) {
        Ok(mv) => Ok(normalize_castling(state, mv)),
        Err(_) => parse_san(state, text),
    }
}

/// Format a legal move of `state` in SAN, including `+`/`#` suffixes.
pub fn format_san(state: &BoardState, mv: &Move) -> String {
    let mut san = san_body(state, mv, &generate_legal_moves(state));
    let after = state.successor(mv);
    if after.is_check() {
        san.push(if has_legal_move(&after) { '+' } else { '#' });
    }
    san
}

fn san_body(state: &BoardState, mv: &Move, legal: &[Move]) -> String {
    if mv.flags.castle {
        return if mv.to.file() > mv.from.file() {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        };
    }
    let Some(piece) = state.piece_at(mv.from) else {
        return mv.to_string();
    };

    let mut san = String::with_capacity(8);
    if piece.kind == PieceKind::Pawn {
        if mv.flags.capture {
            san.push(mv.from.file_char());
        }
    } else {
        san.push(piece.kind.to_char_upper());
        let rivals: Vec<Square> = legal
            .iter()
            .filter(|other| {
                other.to == mv.to
                    && other.from != mv.from
                    && state.piece_at(other.from) == Some(piece)
            })
            .map(|other| other.from)
            .collect();
        if !rivals.is_empty() {
            let file_unique = rivals.iter().all(|sq| sq.file() != mv.from.file());
            let rank_unique = rivals.iter().all(|sq| sq.rank() != mv.from.rank());
            if file_unique {
                san.push(mv.from.file_char());
            } else if rank_unique {
                san.push(mv.from.rank_char());
            } else {
                san.push(mv.from.file_char());
                san.push(mv.from.rank_char());
            }
        }
    }
    if mv.flags.capture {
        san.push('x');
    }
    san.push_str(&mv.to.to_string());
    if let Some(kind) = mv.promotion {
        san.push('=');
        san.push(kind.to_char_upper());
    }
    san
}

/// Resolve SAN text against the legal moves of `state`.
///
/// Accepts check/annotation suffixes, `0-0` castling, missing `x` or `=`,
/// and redundant disambiguation.
pub fn parse_san(state: &BoardState, text: &str) -> Result<Move, NotationError> {
    let trimmed = text
        .trim()
        .trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'));
    let legal = generate_legal_moves(state);

    let castle = match trimmed {
        "O-O" | "0-0" => Some(CastleSide::Kingside),
        "O-O-O" | "0-0-0" => Some(CastleSide::Queenside),
        _ => None,
    };
    if let Some(side) = castle {
        let mover = state.side_to_move();
        return legal
            .into_iter()
            .find(|mv| mv.flags.castle && mv.to == castle_target(mover, side))
            .ok_or_else(|| NotationError::NoLegalMove(text.to_string()));
    }

    let pattern = SanPattern::parse(trimmed)?;
    let mut matches = legal.into_iter().filter(|mv| pattern.matches(state, mv));
    let first = matches
        .next()
        .ok_or_else(|| NotationError::NoLegalMove(text.to_string()))?;
    if matches.next().is_some() {
        return Err(NotationError::AmbiguousMove(text.to_string()));
    }
    Ok(first)
}

struct SanPattern {
    kind: PieceKind,
    to: Square,
    from_file: Option<u8>,
    from_rank: Option<u8>,
    promotion: Option<PieceKind>,
}

impl SanPattern {
    fn parse(text: &str) -> Result<Self, NotationError> {
        let invalid = || NotationError::InvalidFormat(text.to_string());
        if !text.is_ascii() || text.len() < 2 {
            return Err(invalid());
        }

        let (kind, rest) = match text.chars().next() {
            Some(c @ ('N' | 'B' | 'R' | 'Q' | 'K')) => {
                (PieceKind::from_char(c).ok_or_else(invalid)?, &text[1..])
            }
            _ => (PieceKind::Pawn, text),
        };

        let (rest, promotion) = match rest.split_once('=') {
            Some((body, promo)) => {
                let mut chars = promo.chars();
                let kind = chars
                    .next()
                    .and_then(PieceKind::from_char)
                    .filter(|k| k.is_promotion_target())
                    .ok_or_else(|| NotationError::InvalidPromotion(text.to_string()))?;
                if chars.next().is_some() {
                    return Err(NotationError::InvalidPromotion(text.to_string()));
                }
                (body, Some(kind))
            }
            None => match rest.chars().last() {
                Some(c @ ('N' | 'B' | 'R' | 'Q')) if kind == PieceKind::Pawn => {
                    (&rest[..rest.len() - 1], PieceKind::from_char(c))
                }
                _ => (rest, None),
            },
        };

        let body: String = rest.chars().filter(|c| !matches!(c, 'x' | ':' | '-')).collect();
        if body.len() < 2 || body.len() > 4 {
            return Err(invalid());
        }
        let (disambig, dest) = body.split_at(body.len() - 2);
        let to: Square = dest.parse()?;

        let mut from_file = None;
        let mut from_rank = None;
        for c in disambig.chars() {
            match c {
                'a'..='h' if from_file.is_none() => from_file = Some(c as u8 - b'a'),
                '1'..='8' if from_rank.is_none() => from_rank = Some(c as u8 - b'1'),
                _ => return Err(invalid()),
            }
        }

        Ok(Self {
            kind,
            to,
            from_file,
            from_rank,
            promotion,
        })
    }

    fn matches(&self, state: &BoardState, mv: &Move) -> bool {
        mv.to == self.to
            && mv.promotion == self.promotion
            && !mv.flags.castle
            && state.piece_at(mv.from).map(|pc| pc.kind) == Some(self.kind)
            && self.from_file.map_or(true, |f| mv.from.file() == f)
            && self.from_rank.map_or(true, |r| mv.from.rank() == r)
    }
}
