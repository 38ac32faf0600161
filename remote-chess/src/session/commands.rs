use chess::{
    BoardState, GameError, GameStatus, IllegalMoveError, Move, NotationError, PieceColor,
};
use tokio::sync::{broadcast, oneshot};

use super::events::SessionEvent;
use super::snapshot::SessionSnapshot;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("Illegal move: {0}")]
    IllegalMove(#[from] IllegalMoveError),
    #[error("Cannot read move: {0}")]
    Notation(#[from] NotationError),
    #[error("Game is over ({0})")]
    GameOver(GameStatus),
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("It is not the AI's turn")]
    NotAiTurn,
    #[error("Ply {ply} is out of range (game has {len} plies)")]
    PlyOutOfRange { ply: usize, len: usize },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<GameError> for SessionError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::SessionTerminated(status) => Self::GameOver(status),
            GameError::IllegalMove(e) => Self::IllegalMove(e),
            GameError::Fen(e) => Self::InvalidFen(e.to_string()),
            GameError::NothingToUndo => Self::NothingToUndo,
            GameError::Corrupt(detail) => Self::Internal(detail.to_string()),
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Commands sent to the session actor. Each embeds a oneshot for the reply.
/// AI turns are not commanded: the actor starts them itself whenever the AI
/// side is to move, and `RequestAi` only retries after a failure.
pub enum SessionCommand {
    MakeMove {
        mv: Move,
        reply: Reply<SessionSnapshot>,
    },
    /// A move typed by a person, in coordinate notation or SAN.
    PlayText {
        text: String,
        reply: Reply<SessionSnapshot>,
    },
    Takeback {
        reply: Reply<SessionSnapshot>,
    },
    NewGame {
        fen: Option<String>,
        reply: Reply<SessionSnapshot>,
    },
    /// Restart the live game from ply `ply` of the current one.
    Rewind {
        ply: usize,
        reply: Reply<SessionSnapshot>,
    },
    SetAiSide {
        side: Option<PieceColor>,
        reply: oneshot::Sender<SessionSnapshot>,
    },
    RequestAi {
        reply: Reply<()>,
    },
    CancelAi {
        reply: oneshot::Sender<bool>,
    },
    Resign {
        side: PieceColor,
        reply: Reply<SessionSnapshot>,
    },
    Abort {
        reply: Reply<SessionSnapshot>,
    },
    GetSnapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    ExportPgn {
        reply: oneshot::Sender<String>,
    },
    PositionAt {
        ply: usize,
        reply: Reply<BoardState>,
    },
    Subscribe {
        reply: oneshot::Sender<(SessionSnapshot, broadcast::Receiver<SessionEvent>)>,
    },
    Shutdown,
}
