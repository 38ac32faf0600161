use std::fmt;

use crate::types::{PieceKind, Square};

/// Side effects of a move, filled in by the legality engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MoveFlags {
    pub capture: bool,
    pub en_passant: bool,
    pub castle: bool,
}

/// A move from one square to another.
///
/// Castling is written as the king's two-square step (`e1g1`). A move built
/// from user or network input is only a candidate until `rules::validate`
/// returns the matching legal move with its flags set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub flags: MoveFlags,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
            flags: MoveFlags::default(),
        }
    }

    pub fn with_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        Self {
            promotion: Some(promotion),
            ..Self::new(from, to)
        }
    }

    /// Same from, to and promotion. Flags are derived data and ignored.
    pub fn same_action(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }

    pub fn is_capture(&self) -> bool {
        self.flags.capture
    }

    pub fn is_castle(&self) -> bool {
        self.flags.castle
    }
}

/// Coordinate (UCI) form: `e2e4`, `e7e8q`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "{}", promo.to_char_lower())?;
        }
        Ok(())
    }
}
