use crate::board::{king_home, rook_home, BoardState, CastlingRights};
use crate::types::{CastleSide, Piece, PieceColor, PieceKind, Square};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string into a board state.
///
/// The half-move clock and full-move number may be omitted (they default to
/// `0` and `1`). Castling rights whose king or rook is off its home square
/// are dropped. Positions without exactly one king per color, with pawns on
/// a back rank, or where the side not on move is in check are rejected.
pub fn parse_fen(fen: &str) -> Result<BoardState, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() < 4 || parts.len() > 6 {
        return Err(FenError::InvalidFormat);
    }

    let squares = parse_placement(parts[0])?;

    let side_to_move = match parts[1] {
        "w" => PieceColor::White,
        "b" => PieceColor::Black,
        other => return Err(FenError::InvalidSideToMove(other.to_string())),
    };

    let mut castling = CastlingRights::NONE;
    if parts[2] != "-" {
        for c in parts[2].chars() {
            match c {
                'K' => castling.white_kingside = true,
                'Q' => castling.white_queenside = true,
                'k' => castling.black_kingside = true,
                'q' => castling.black_queenside = true,
                _ => return Err(FenError::InvalidCastling(parts[2].to_string())),
            }
        }
    }

    strip_unusable_rights(&squares, &mut castling);

    let en_passant = match parts[3] {
        "-" => None,
        text => {
            let sq: Square = text
                .parse()
                .map_err(|_| FenError::InvalidEnPassant(text.to_string()))?;
            let expected_rank = match side_to_move {
                PieceColor::White => 5,
                PieceColor::Black => 2,
            };
            if sq.rank() != expected_rank {
                return Err(FenError::InvalidEnPassant(text.to_string()));
            }
            Some(sq)
        }
    };

    let halfmove_clock = match parts.get(4) {
        Some(text) => text
            .parse()
            .map_err(|_| FenError::InvalidClock(text.to_string()))?,
        None => 0,
    };
    let fullmove_number = match parts.get(5) {
        Some(text) => text
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| FenError::InvalidClock(text.to_string()))?,
        None => 1,
    };

    let state = BoardState::from_parts(
        squares,
        side_to_move,
        castling,
        en_passant,
        halfmove_clock,
        fullmove_number,
    );
    check_position(&state)?;
    Ok(state)
}

fn parse_placement(placement: &str) -> Result<[Option<Piece>; 64], FenError> {
    let mut squares = [None; 64];
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::InvalidBoardLayout);
    }

    for (rank_idx, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - rank_idx as u8;
        let mut file = 0u8;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                if skip == 0 || skip > 8 {
                    return Err(FenError::InvalidBoardLayout);
                }
                file += skip as u8;
            } else {
                let piece = Piece::from_fen_char(c).ok_or(FenError::InvalidPiece(c))?;
                let sq = Square::new(file, rank).ok_or(FenError::InvalidBoardLayout)?;
                squares[sq.index()] = Some(piece);
                file += 1;
            }
            if file > 8 {
                return Err(FenError::InvalidBoardLayout);
            }
        }
        if file != 8 {
            return Err(FenError::InvalidBoardLayout);
        }
    }
    Ok(squares)
}

fn strip_unusable_rights(squares: &[Option<Piece>; 64], castling: &mut CastlingRights) {
    for color in [PieceColor::White, PieceColor::Black] {
        let king_home_occupied =
            squares[king_home(color).index()] == Some(Piece::new(color, PieceKind::King));
        for side in [CastleSide::Kingside, CastleSide::Queenside] {
            let rook_home_occupied =
                squares[rook_home(color, side).index()] == Some(Piece::new(color, PieceKind::Rook));
            if !(king_home_occupied && rook_home_occupied) {
                castling.set(color, side, false);
            }
        }
    }
}

fn check_position(state: &BoardState) -> Result<(), FenError> {
    for color in [PieceColor::White, PieceColor::Black] {
        let kings = state
            .pieces()
            .filter(|(_, pc)| pc.color == color && pc.kind == PieceKind::King)
            .count();
        if kings != 1 {
            return Err(FenError::InvalidKings(color));
        }
    }
    if state
        .pieces()
        .any(|(sq, pc)| pc.kind == PieceKind::Pawn && (sq.rank() == 0 || sq.rank() == 7))
    {
        return Err(FenError::PawnOnBackRank);
    }
    if state.in_check(state.side_to_move().opposite()) {
        return Err(FenError::OpponentInCheck);
    }
    Ok(())
}

/// Format a board state as a FEN string.
pub fn format_fen(state: &BoardState) -> String {
    let mut out = String::with_capacity(90);
    for rank in (0..8u8).rev() {
        let mut empty = 0;
        for file in 0..8u8 {
            let piece = Square::new(file, rank).and_then(|sq| state.piece_at(sq));
            match piece {
                Some(pc) => {
                    if empty > 0 {
                        out.push_str(&empty.to_string());
                        empty = 0;
                    }
                    out.push(pc.to_fen_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push_str(&empty.to_string());
        }
        if rank > 0 {
            out.push('/');
        }
    }

    out.push(' ');
    out.push(match state.side_to_move() {
        PieceColor::White => 'w',
        PieceColor::Black => 'b',
    });

    out.push(' ');
    let rights = state.castling();
    if rights.any() {
        for (has, c) in [
            (rights.white_kingside, 'K'),
            (rights.white_queenside, 'Q'),
            (rights.black_kingside, 'k'),
            (rights.black_queenside, 'q'),
        ] {
            if has {
                out.push(c);
            }
        }
    } else {
        out.push('-');
    }

    out.push(' ');
    match state.en_passant() {
        Some(sq) => out.push_str(&sq.to_string()),
        None => out.push('-'),
    }

    out.push_str(&format!(
        " {} {}",
        state.halfmove_clock(),
        state.fullmove_number()
    ));
    out
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format")]
    InvalidFormat,
    #[error("Invalid board layout")]
    InvalidBoardLayout,
    #[error("Invalid piece character: {0}")]
    InvalidPiece(char),
    #[error("Invalid side to move: {0}")]
    InvalidSideToMove(String),
    #[error("Invalid castling field: {0}")]
    InvalidCastling(String),
    #[error("Invalid en-passant square: {0}")]
    InvalidEnPassant(String),
    #[error("Invalid move counter: {0}")]
    InvalidClock(String),
    #[error("Position must have exactly one {0} king")]
    InvalidKings(PieceColor),
    #[error("Pawn on first or last rank")]
    PawnOnBackRank,
    #[error("Side not to move is in check")]
    OpponentInCheck,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_fen_matches_initial_state() {
        let state = parse_fen(STARTING_FEN).unwrap();
        assert_eq!(state, BoardState::initial());
        assert_eq!(format_fen(&state), STARTING_FEN);
    }

    #[test]
    fn round_trips_a_middlegame_fen() {
        let fen = "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4";
        assert_eq!(format_fen(&parse_fen(fen).unwrap()), fen);
    }

    #[test]
    fn clocks_are_optional() {
        let state = parse_fen("4k3/8/8/8/8/8/8/4K3 b - -").unwrap();
        assert_eq!(state.halfmove_clock(), 0);
        assert_eq!(state.fullmove_number(), 1);
        assert_eq!(state.side_to_move(), PieceColor::Black);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_fen(""), Err(FenError::InvalidFormat));
        assert_eq!(
            parse_fen("8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::InvalidBoardLayout)
        );
        assert_eq!(
            parse_fen("4k3/8/8/8/8/8/8/4K2X w - - 0 1"),
            Err(FenError::InvalidPiece('X'))
        );
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1"),
            Err(FenError::InvalidSideToMove(_))
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w - e4 0 1"),
            Err(FenError::InvalidEnPassant(_))
        ));
    }

    #[test]
    fn rejects_impossible_positions() {
        assert_eq!(
            parse_fen("8/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::InvalidKings(PieceColor::Black))
        );
        assert_eq!(
            parse_fen("4k3/8/8/8/8/8/8/P3K3 w - - 0 1"),
            Err(FenError::PawnOnBackRank)
        );
        assert_eq!(
            parse_fen("4k3/4Q3/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::OpponentInCheck)
        );
    }

    #[test]
    fn drops_rights_without_king_and_rook_at_home() {
        let state = parse_fen("4k3/p7/8/8/8/8/P7/4K3 w K - 0 1").unwrap();
        assert_eq!(state.castling(), CastlingRights::NONE);
        assert_eq!(format_fen(&state), "4k3/p7/8/8/8/8/P7/4K3 w - - 0 1");

        let state = parse_fen("r3k2r/8/8/8/8/8/8/R4K1R w KQkq - 0 1").unwrap();
        assert!(!state.castling().white_kingside);
        assert!(!state.castling().white_queenside);
        assert!(state.castling().black_kingside);
        assert!(state.castling().black_queenside);

        let state = parse_fen("1r2k2r/8/8/8/8/8/8/4K3 b kq - 0 1").unwrap();
        assert!(state.castling().black_kingside);
        assert!(!state.castling().black_queenside);
    }

    #[test]
    fn accepts_clocks_at_the_integer_limit() {
        let state = parse_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 4294967295").unwrap();
        assert_eq!(state.fullmove_number(), u32::MAX);
    }
}
