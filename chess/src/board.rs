//! Board state: one immutable value per ply.

use crate::moves::Move;
use crate::types::{CastleSide, Piece, PieceColor, PieceKind, Square};

pub(crate) const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (-1, 2),
    (-2, 1),
    (1, -2),
    (2, -1),
    (-1, -2),
    (-2, -1),
];

pub(crate) const KING_DELTAS: [(i8, i8); 8] = [
    (1, 1),
    (1, 0),
    (1, -1),
    (0, 1),
    (0, -1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

pub(crate) const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
pub(crate) const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// Castling availability per color and wing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub const ALL: Self = Self {
        white_kingside: true,
        white_queenside: true,
        black_kingside: true,
        black_queenside: true,
    };

    pub const NONE: Self = Self {
        white_kingside: false,
        white_queenside: false,
        black_kingside: false,
        black_queenside: false,
    };

    pub fn has(&self, color: PieceColor, side: CastleSide) -> bool {
        match (color, side) {
            (PieceColor::White, CastleSide::Kingside) => self.white_kingside,
            (PieceColor::White, CastleSide::Queenside) => self.white_queenside,
            (PieceColor::Black, CastleSide::Kingside) => self.black_kingside,
            (PieceColor::Black, CastleSide::Queenside) => self.black_queenside,
        }
    }

    pub fn set(&mut self, color: PieceColor, side: CastleSide, value: bool) {
        let slot = match (color, side) {
            (PieceColor::White, CastleSide::Kingside) => &mut self.white_kingside,
            (PieceColor::White, CastleSide::Queenside) => &mut self.white_queenside,
            (PieceColor::Black, CastleSide::Kingside) => &mut self.black_kingside,
            (PieceColor::Black, CastleSide::Queenside) => &mut self.black_queenside,
        };
        *slot = value;
    }

    pub fn any(&self) -> bool {
        self.white_kingside || self.white_queenside || self.black_kingside || self.black_queenside
    }

    /// Drop the right tied to a rook corner, if `sq` is one.
    fn revoke_corner(&mut self, sq: Square) {
        for color in [PieceColor::White, PieceColor::Black] {
            for side in [CastleSide::Kingside, CastleSide::Queenside] {
                if sq == rook_home(color, side) {
                    self.set(color, side, false);
                }
            }
        }
    }
}

/// Home square of the castling rook.
pub fn rook_home(color: PieceColor, side: CastleSide) -> Square {
    let file = match side {
        CastleSide::Kingside => 7,
        CastleSide::Queenside => 0,
    };
    square(file, color.back_rank())
}

/// Home square of the king.
pub fn king_home(color: PieceColor) -> Square {
    square(4, color.back_rank())
}

/// Where the king lands after castling.
pub fn castle_target(color: PieceColor, side: CastleSide) -> Square {
    let file = match side {
        CastleSide::Kingside => 6,
        CastleSide::Queenside => 2,
    };
    square(file, color.back_rank())
}

fn square(file: u8, rank: u8) -> Square {
    // file and rank are always < 8 at every call site
    Square::from_index(rank * 8 + file).unwrap_or_else(|| unreachable!("square off board"))
}

/// The identity compared for threefold repetition: placement, side to move,
/// castling rights and en-passant target. Clocks are excluded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionKey {
    squares: [Option<Piece>; 64],
    side_to_move: PieceColor,
    castling: CastlingRights,
    en_passant: Option<Square>,
}

/// A complete chess position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardState {
    squares: [Option<Piece>; 64],
    side_to_move: PieceColor,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::initial()
    }
}

impl BoardState {
    /// The standard starting position.
    pub fn initial() -> Self {
        let mut state = Self::empty();
        for (file, &kind) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            state.put(square(file, 0), Some(Piece::new(PieceColor::White, kind)));
            state.put(square(file, 1), Some(Piece::new(PieceColor::White, PieceKind::Pawn)));
            state.put(square(file, 6), Some(Piece::new(PieceColor::Black, PieceKind::Pawn)));
            state.put(square(file, 7), Some(Piece::new(PieceColor::Black, kind)));
        }
        state.castling = CastlingRights::ALL;
        state
    }

    pub(crate) fn empty() -> Self {
        Self {
            squares: [None; 64],
            side_to_move: PieceColor::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub(crate) fn from_parts(
        squares: [Option<Piece>; 64],
        side_to_move: PieceColor,
        castling: CastlingRights,
        en_passant: Option<Square>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Self {
        Self {
            squares,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        }
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.side_to_move
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// All occupied squares, a1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|pc| (sq, pc)))
    }

    pub fn key(&self) -> PositionKey {
        PositionKey {
            squares: self.squares,
            side_to_move: self.side_to_move,
            castling: self.castling,
            en_passant: self.en_passant,
        }
    }

    pub fn king_square(&self, color: PieceColor) -> Option<Square> {
        self.pieces()
            .find(|(_, pc)| pc.color == color && pc.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    /// Is `color`'s king attacked? A missing king is never in check.
    pub fn in_check(&self, color: PieceColor) -> bool {
        self.king_square(color)
            .is_some_and(|ksq| self.is_square_attacked(ksq, color.opposite()))
    }

    /// Is the side to move in check?
    pub fn is_check(&self) -> bool {
        self.in_check(self.side_to_move)
    }

    /// Does any piece of color `by` attack `target`?
    pub fn is_square_attacked(&self, target: Square, by: PieceColor) -> bool {
        // A pawn of `by` attacks diagonally forward, so look one rank behind the target.
        let back = -by.pawn_direction();
        for df in [-1, 1] {
            if let Some(sq) = target.offset(df, back) {
                if self.piece_at(sq) == Some(Piece::new(by, PieceKind::Pawn)) {
                    return true;
                }
            }
        }

        let hits = |deltas: &[(i8, i8)], kind: PieceKind| {
            deltas.iter().any(|&(df, dr)| {
                target
                    .offset(df, dr)
                    .is_some_and(|sq| self.piece_at(sq) == Some(Piece::new(by, kind)))
            })
        };
        if hits(&KNIGHT_DELTAS, PieceKind::Knight) || hits(&KING_DELTAS, PieceKind::King) {
            return true;
        }

        let ray_hits = |dirs: &[(i8, i8)], kind: PieceKind| {
            dirs.iter().any(|&(df, dr)| {
                let mut cur = target.offset(df, dr);
                while let Some(sq) = cur {
                    if let Some(pc) = self.piece_at(sq) {
                        return pc.color == by && (pc.kind == kind || pc.kind == PieceKind::Queen);
                    }
                    cur = sq.offset(df, dr);
                }
                false
            })
        };
        ray_hits(&DIAGONALS, PieceKind::Bishop) || ray_hits(&ORTHOGONALS, PieceKind::Rook)
    }

    /// Successor state after a move whose flags were set by move generation.
    ///
    /// Does not check legality; callers go through `rules::validate` or the
    /// generator first.
    pub fn successor(&self, mv: &Move) -> BoardState {
        let mut next = self.clone();
        let mover = self.side_to_move;
        let Some(piece) = self.piece_at(mv.from) else {
            return next;
        };

        let captured = if mv.flags.en_passant {
            let victim = Square::new(mv.to.file(), mv.from.rank());
            if let Some(victim) = victim {
                next.put(victim, None);
            }
            true
        } else {
            self.piece_at(mv.to).is_some()
        };

        next.put(mv.from, None);
        let placed = match mv.promotion {
            Some(kind) if piece.kind == PieceKind::Pawn => Piece::new(mover, kind),
            _ => piece,
        };
        next.put(mv.to, Some(placed));

        if mv.flags.castle {
            let side = if mv.to.file() > mv.from.file() {
                CastleSide::Kingside
            } else {
                CastleSide::Queenside
            };
            let rook_from = rook_home(mover, side);
            let rook_file = match side {
                CastleSide::Kingside => 5,
                CastleSide::Queenside => 3,
            };
            next.put(rook_from, None);
            next.put(
                square(rook_file, mover.back_rank()),
                Some(Piece::new(mover, PieceKind::Rook)),
            );
        }

        if piece.kind == PieceKind::King {
            next.castling.set(mover, CastleSide::Kingside, false);
            next.castling.set(mover, CastleSide::Queenside, false);
        }
        next.castling.revoke_corner(mv.from);
        next.castling.revoke_corner(mv.to);

        next.en_passant = None;
        if piece.kind == PieceKind::Pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2 {
            let passed = Square::new(mv.from.file(), (mv.from.rank() + mv.to.rank()) / 2);
            let enemy_pawn = Piece::new(mover.opposite(), PieceKind::Pawn);
            let capturable = [-1, 1].iter().any(|&df| {
                mv.to
                    .offset(df, 0)
                    .is_some_and(|sq| next.piece_at(sq) == Some(enemy_pawn))
            });
            if capturable {
                next.en_passant = passed;
            }
        }

        if piece.kind == PieceKind::Pawn || captured {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if mover == PieceColor::Black {
            next.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        next.side_to_move = mover.opposite();
        next
    }

    fn put(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.index()] = piece;
    }
}
