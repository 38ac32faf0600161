use chess::{normalize_castling, parse_san, parse_uci, validate, Move, NotationError, Snapshot};

use crate::error::AiError;

/// Turn move text from an AI into a legal move of `snapshot`.
///
/// Coordinate notation is tried first (king-takes-rook castling is
/// rewritten), then SAN.
pub fn resolve_move(snapshot: &Snapshot, text: &str) -> Result<Move, AiError> {
    let text = text.trim();
    if let Ok(candidate) = parse_uci(text) {
        let candidate = normalize_castling(&snapshot.state, candidate);
        return validate(&snapshot.state, &candidate).map_err(|e| AiError::IllegalMoveReturned {
            mv: text.to_string(),
            detail: e.reason.to_string(),
        });
    }
    parse_san(&snapshot.state, text).map_err(|e| match e {
        NotationError::NoLegalMove(_) | NotationError::AmbiguousMove(_) => {
            AiError::IllegalMoveReturned {
                mv: text.to_string(),
                detail: e.to_string(),
            }
        }
        other => AiError::MalformedResponse(format!("unreadable move {:?}: {}", text, other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::Game;

    fn snapshot(fen: &str) -> Snapshot {
        Game::from_fen(fen).unwrap().snapshot()
    }

    #[test]
    fn coordinate_move() {
        let snap = Game::new().snapshot();
        let mv = resolve_move(&snap, "e2e4").unwrap();
        assert_eq!(mv.to_string(), "e2e4");
    }

    #[test]
    fn san_move() {
        let snap = Game::new().snapshot();
        assert_eq!(resolve_move(&snap, "Nf3").unwrap().to_string(), "g1f3");
    }

    #[test]
    fn king_takes_rook_castling() {
        let snap = snapshot("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let mv = resolve_move(&snap, "e1h1").unwrap();
        assert!(mv.is_castle());
        assert_eq!(mv.to_string(), "e1g1");
    }

    #[test]
    fn illegal_and_garbage() {
        let snap = Game::new().snapshot();
        assert!(matches!(
            resolve_move(&snap, "e2e5"),
            Err(AiError::IllegalMoveReturned { .. })
        ));
        assert!(matches!(
            resolve_move(&snap, "Qh5"),
            Err(AiError::IllegalMoveReturned { .. })
        ));
        assert!(matches!(
            resolve_move(&snap, "hello world"),
            Err(AiError::MalformedResponse(_))
        ));
    }
}
