pub mod board;
pub mod fen;
pub mod game;
pub mod movegen;
pub mod moves;
pub mod notation;
pub mod perft;
pub mod pgn;
pub mod rules;
pub mod types;

pub use board::{BoardState, CastlingRights, PositionKey};
pub use fen::{format_fen, parse_fen, FenError, STARTING_FEN};
pub use game::{Game, GameError, GamePhase, HistoryEntry, Snapshot};
pub use movegen::{generate_legal_moves, legal_moves_from};
pub use moves::{Move, MoveFlags};
pub use notation::{
    format_san, normalize_castling, parse_move, parse_san, parse_uci, with_auto_queen,
    NotationError,
};
pub use perft::{perft, perft_divide};
pub use pgn::PgnTags;
pub use rules::{classify, validate, GameStatus, IllegalMoveError, IllegalReason};
pub use types::{CastleSide, Piece, PieceColor, PieceKind, Square};
