//! Move oracles available to the session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ai_client::{AiError, AiMove, Evaluation, MoveOracle, RemoteAiClient, Score};
use async_trait::async_trait;
use chess::{parse_uci, Game, PositionKey, Snapshot};
use engine::{SimpleEngine, MATE_SCORE};

use crate::config::AppConfig;

/// Plays moves from the built-in engine on a blocking thread.
#[derive(Debug, Clone, Default)]
pub struct LocalOracle {
    engine: SimpleEngine,
}

impl LocalOracle {
    pub fn new(engine: SimpleEngine) -> Self {
        Self { engine }
    }
}

/// Raises the search's stop flag when the request future is dropped.
struct StopOnDrop(Arc<AtomicBool>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

#[async_trait]
impl MoveOracle for LocalOracle {
    async fn request_move(
        &self,
        snapshot: &Snapshot,
        think: Duration,
    ) -> Result<AiMove, AiError> {
        let keys = position_keys(snapshot);
        let state = snapshot.state.clone();
        let engine = self.engine.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let _guard = StopOnDrop(stop.clone());
        let deadline = Instant::now() + think;

        let result = tokio::task::spawn_blocking(move || {
            engine.search(&state, &keys, Some(deadline), Some(&stop))
        })
        .await
        .map_err(|e| AiError::Unreachable(format!("local engine task failed: {}", e)))?;

        let mv = result.best_move.ok_or(AiError::NoMoveAvailable)?;
        tracing::info!(mv = %mv, score = result.score, nodes = result.nodes, "local engine move");
        Ok(AiMove {
            mv,
            evaluation: Evaluation {
                score: Some(engine_score(result.score)),
                depth: Some(u32::from(result.depth)),
                nodes: Some(result.nodes),
                ..Evaluation::default()
            },
            generation: snapshot.generation,
        })
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Keys of every position in the snapshot's game, oldest first.
fn position_keys(snapshot: &Snapshot) -> Vec<PositionKey> {
    let replayed = Game::from_fen(&snapshot.start_fen).and_then(|mut game| {
        for text in &snapshot.history_uci {
            let mv = parse_uci(text).map_err(|_| chess::GameError::Corrupt("bad history move"))?;
            game.apply_move(&mv)?;
        }
        Ok(game)
    });
    match replayed {
        Ok(game) => (0..=game.history().len())
            .filter_map(|ply| game.position_at(ply).map(|state| state.key()))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "cannot replay snapshot history, repetition unknown");
            vec![snapshot.state.key()]
        }
    }
}

fn engine_score(score: i32) -> Score {
    let distance = MATE_SCORE - score.abs();
    if distance < 100 {
        let moves = (distance + 1) / 2;
        Score::Mate(if score > 0 { moves } else { -moves })
    } else {
        Score::Centipawns(score)
    }
}

/// The oracle for AI turns: the remote service when `AI_URL` is set,
/// otherwise `local` itself.
pub fn build_oracle(
    config: &AppConfig,
    local: Arc<dyn MoveOracle>,
) -> anyhow::Result<Arc<dyn MoveOracle>> {
    match config.remote_ai_config() {
        Some(remote) => {
            tracing::info!(url = %remote.base_url, "using remote AI service");
            Ok(Arc::new(RemoteAiClient::new(remote)?))
        }
        None => {
            tracing::info!("AI_URL not set, using the local engine");
            Ok(local)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_oracle_finds_mate_in_one() {
        // Back-rank mate: Ra8#.
        let snapshot = Game::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1")
            .unwrap()
            .snapshot();
        let reply = LocalOracle::default()
            .request_move(&snapshot, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(reply.mv.to_string(), "a1a8");
        assert_eq!(reply.evaluation.score, Some(Score::Mate(1)));
    }

    #[tokio::test]
    async fn local_oracle_reports_no_move_when_mated() {
        let snapshot =
            Game::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap()
                .snapshot();
        let err = LocalOracle::default()
            .request_move(&snapshot, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert_eq!(err, AiError::NoMoveAvailable);
    }

    #[test]
    fn keys_cover_the_whole_game() {
        let mut game = Game::new();
        for text in ["g1f3", "g8f6", "f3g1"] {
            game.apply_move(&parse_uci(text).unwrap()).unwrap();
        }
        let keys = position_keys(&game.snapshot());
        assert_eq!(keys.len(), 4);
        assert_eq!(keys.last(), Some(&game.state().key()));
    }

    #[test]
    fn mate_scores_convert_to_moves() {
        assert_eq!(engine_score(MATE_SCORE - 1), Score::Mate(1));
        assert_eq!(engine_score(-(MATE_SCORE - 2)), Score::Mate(-1));
        assert_eq!(engine_score(35), Score::Centipawns(35));
    }

    #[test]
    fn without_url_the_local_engine_plays() {
        let local: Arc<dyn MoveOracle> = Arc::new(LocalOracle::default());
        let oracle = build_oracle(&AppConfig::default(), local.clone()).unwrap();
        assert_eq!(oracle.name(), "local");
        assert!(Arc::ptr_eq(&oracle, &local));
    }
}
