use std::sync::Arc;

use ai_client::{AiError, MoveOracle};
use chess::{parse_move, with_auto_queen, Move};
use tokio::sync::{broadcast, mpsc};
use tracing::Instrument;

use crate::config::FallbackPolicy;

use super::commands::{SessionCommand, SessionError};
use super::events::SessionEvent;
use super::snapshot::SessionSnapshot;
use super::state::{AiOutcome, PendingAi, SessionState};

/// The main session actor loop.
/// Owns all mutable state. Processes commands and AI outcomes sequentially.
pub(crate) async fn run_session_actor(
    state: SessionState,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
) {
    let session_id = state.session_id.clone();
    run_session_actor_inner(state, cmd_rx, event_tx)
        .instrument(tracing::info_span!("session", id = %session_id))
        .await;
}

async fn run_session_actor_inner(
    mut state: SessionState,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
) {
    tracing::info!(oracle = state.oracle.name(), "Session actor started");

    // The actor keeps a sender, so `recv` never yields `None` here.
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<AiOutcome>(8);

    // The AI may own the first move.
    maybe_start_ai(&mut state, &outcome_tx, &event_tx);

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Shutdown) | None => {
                        tracing::info!("Session actor shutting down");
                        state.cancel_pending();
                        break;
                    }
                    Some(cmd) => handle_command(&mut state, cmd, &outcome_tx, &event_tx),
                }
            }

            Some(outcome) = outcome_rx.recv() => {
                handle_ai_outcome(&mut state, outcome, &outcome_tx, &event_tx);
            }
        }
    }

    tracing::info!("Session actor exited");
}

fn handle_command(
    state: &mut SessionState,
    cmd: SessionCommand,
    outcome_tx: &mpsc::Sender<AiOutcome>,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    match cmd {
        SessionCommand::MakeMove { mv, reply } => {
            let result = apply_user_move(state, mv, event_tx);
            let _ = reply.send(result);
            maybe_start_ai(state, outcome_tx, event_tx);
        }
        SessionCommand::PlayText { text, reply } => {
            let status = state.game.status();
            let result = if status.is_terminal() {
                Err(SessionError::GameOver(status))
            } else {
                match parse_move(state.game.state(), &text) {
                    Ok(mv) => {
                        let mv = with_auto_queen(state.game.state(), mv);
                        apply_user_move(state, mv, event_tx)
                    }
                    Err(e) => Err(SessionError::from(e)),
                }
            };
            let _ = reply.send(result);
            maybe_start_ai(state, outcome_tx, event_tx);
        }
        SessionCommand::Takeback { reply } => {
            let result = mutate(state, event_tx, SessionState::apply_takeback);
            let _ = reply.send(result);
            maybe_start_ai(state, outcome_tx, event_tx);
        }
        SessionCommand::NewGame { fen, reply } => {
            let result = mutate(state, event_tx, |s| s.apply_new_game(fen.as_deref()));
            let _ = reply.send(result);
            maybe_start_ai(state, outcome_tx, event_tx);
        }
        SessionCommand::Rewind { ply, reply } => {
            let result = mutate(state, event_tx, |s| s.apply_rewind(ply));
            let _ = reply.send(result);
            maybe_start_ai(state, outcome_tx, event_tx);
        }
        SessionCommand::SetAiSide { side, reply } => {
            if state.ai_side != side {
                cancel_ai(state, event_tx);
                state.ai_side = side;
                tracing::info!(ai_side = ?side, "AI side changed");
            }
            state.ai_paused = false;
            let snapshot = state.snapshot();
            let _ = event_tx.send(SessionEvent::StateChanged(snapshot.clone()));
            let _ = reply.send(snapshot);
            maybe_start_ai(state, outcome_tx, event_tx);
        }
        SessionCommand::RequestAi { reply } => {
            let result = request_ai(state);
            let _ = reply.send(result);
            maybe_start_ai(state, outcome_tx, event_tx);
        }
        SessionCommand::CancelAi { reply } => {
            let cancelled = cancel_ai(state, event_tx);
            if cancelled {
                state.ai_paused = true;
                let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
            }
            let _ = reply.send(cancelled);
        }
        SessionCommand::Resign { side, reply } => {
            let result = mutate(state, event_tx, |s| {
                s.game.resign(side)?;
                tracing::info!(side = %side, "Side resigned");
                Ok(s.snapshot())
            });
            let _ = reply.send(result);
        }
        SessionCommand::Abort { reply } => {
            let result = mutate(state, event_tx, |s| {
                s.game.abort()?;
                tracing::info!("Game aborted");
                Ok(s.snapshot())
            });
            let _ = reply.send(result);
        }
        SessionCommand::GetSnapshot { reply } => {
            let _ = reply.send(state.snapshot());
        }
        SessionCommand::ExportPgn { reply } => {
            let _ = reply.send(state.game.to_pgn(&state.pgn_tags()));
        }
        SessionCommand::PositionAt { ply, reply } => {
            let len = state.game.history().len();
            let result = state
                .game
                .position_at(ply)
                .cloned()
                .ok_or(SessionError::PlyOutOfRange { ply, len });
            let _ = reply.send(result);
        }
        SessionCommand::Subscribe { reply } => {
            let snapshot = state.snapshot();
            let rx = event_tx.subscribe();
            let _ = reply.send((snapshot, rx));
        }
        // Handled by the loop before dispatch.
        SessionCommand::Shutdown => {}
    }
}

/// Run a state change that supersedes any in-flight AI request.
///
/// The request is cancelled only if the change succeeds; a rejected command
/// leaves the AI thinking.
fn mutate<F>(
    state: &mut SessionState,
    event_tx: &broadcast::Sender<SessionEvent>,
    change: F,
) -> Result<SessionSnapshot, SessionError>
where
    F: FnOnce(&mut SessionState) -> Result<SessionSnapshot, SessionError>,
{
    let before = state.game.generation();
    let snap = change(state)?;
    if state.game.generation() != before {
        cancel_ai(state, event_tx);
    }
    // The snapshot was taken before the cancel.
    let snap = SessionSnapshot {
        ai_thinking: state.pending.is_some(),
        ..snap
    };
    let _ = event_tx.send(SessionEvent::StateChanged(snap.clone()));
    Ok(snap)
}

fn apply_user_move(
    state: &mut SessionState,
    mv: Move,
    event_tx: &broadcast::Sender<SessionEvent>,
) -> Result<SessionSnapshot, SessionError> {
    mutate(state, event_tx, |s| {
        let entry = s.game.apply_move(&mv)?;
        tracing::info!(mv = %entry.uci(), san = %entry.san, "Move played");
        s.ai_paused = false;
        s.last_ai_error = None;
        Ok(s.snapshot())
    })
}

fn cancel_ai(state: &mut SessionState, event_tx: &broadcast::Sender<SessionEvent>) -> bool {
    match state.cancel_pending() {
        Some(request_id) => {
            let _ = event_tx.send(SessionEvent::AiCancelled { request_id });
            true
        }
        None => false,
    }
}

fn request_ai(state: &mut SessionState) -> Result<(), SessionError> {
    let status = state.game.status();
    if status.is_terminal() {
        return Err(SessionError::GameOver(status));
    }
    if state.ai_side.is_none() || state.game.phase().to_move() != state.ai_side {
        return Err(SessionError::NotAiTurn);
    }
    state.ai_paused = false;
    state.last_ai_error = None;
    Ok(())
}

/// Start an AI request if it is the AI's turn and none is running.
fn maybe_start_ai(
    state: &mut SessionState,
    outcome_tx: &mpsc::Sender<AiOutcome>,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    if state.should_start_ai() {
        let oracle = state.oracle.clone();
        start_request(state, oracle, false, outcome_tx, event_tx);
    }
}

fn start_request(
    state: &mut SessionState,
    oracle: Arc<dyn MoveOracle>,
    fallback: bool,
    outcome_tx: &mpsc::Sender<AiOutcome>,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    let request_id = state.allocate_request_id();
    let snapshot = state.game.snapshot();
    let generation = snapshot.generation;
    let think = state.think;
    let tx = outcome_tx.clone();
    let name = oracle.name().to_string();

    tracing::info!(request_id, generation, oracle = %name, fallback, "Starting AI request");

    let oracle_name = name.clone();
    let task = tokio::spawn(
        async move {
            let result = oracle.request_move(&snapshot, think).await;
            let _ = tx
                .send(AiOutcome {
                    request_id,
                    generation,
                    oracle: oracle_name,
                    fallback,
                    result,
                })
                .await;
        }
        .in_current_span(),
    );

    state.pending = Some(PendingAi {
        request_id,
        generation,
        fallback,
        task,
    });
    let _ = event_tx.send(SessionEvent::AiThinking {
        request_id,
        generation,
        oracle: name,
    });
}

pub(crate) fn handle_ai_outcome(
    state: &mut SessionState,
    outcome: AiOutcome,
    outcome_tx: &mpsc::Sender<AiOutcome>,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    let current = state
        .pending
        .as_ref()
        .is_some_and(|p| p.request_id == outcome.request_id && p.generation == outcome.generation)
        && outcome.generation == state.game.generation();
    if !current {
        tracing::debug!(
            request_id = outcome.request_id,
            generation = outcome.generation,
            current_generation = state.game.generation(),
            "Discarding stale AI response"
        );
        let _ = event_tx.send(SessionEvent::StaleAiResponse {
            request_id: outcome.request_id,
            generation: outcome.generation,
        });
        return;
    }
    state.pending = None;

    let failure = match outcome.result {
        Ok(ai_move) => match state.game.apply_move(&ai_move.mv) {
            Ok(entry) => {
                tracing::info!(mv = %entry.uci(), san = %entry.san, oracle = %outcome.oracle, "AI move applied");
                state.last_ai_error = None;
                let _ = event_tx.send(SessionEvent::AiMoved {
                    uci: entry.uci(),
                    san: entry.san.clone(),
                    oracle: outcome.oracle,
                    evaluation: ai_move.evaluation,
                });
                let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
                maybe_start_ai(state, outcome_tx, event_tx);
                return;
            }
            Err(e) => AiError::IllegalMoveReturned {
                mv: ai_move.mv.to_string(),
                detail: e.to_string(),
            },
        },
        Err(e) => e,
    };

    handle_ai_failure(state, failure, outcome.fallback, outcome_tx, event_tx);
}

fn handle_ai_failure(
    state: &mut SessionState,
    error: AiError,
    from_fallback: bool,
    outcome_tx: &mpsc::Sender<AiOutcome>,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    // The local engine failing, or failing over to itself, ends in a report.
    let local_is_primary = Arc::ptr_eq(&state.oracle, &state.local_oracle);
    let policy = match state.fallback {
        FallbackPolicy::Local if from_fallback || local_is_primary => FallbackPolicy::Report,
        policy => policy,
    };

    tracing::warn!(error = %error, ?policy, "AI turn failed");
    state.last_ai_error = Some(error.clone());
    let _ = event_tx.send(SessionEvent::AiFailed {
        error,
        fallback: policy,
    });

    match policy {
        FallbackPolicy::Report => {
            state.ai_paused = true;
            let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
        }
        FallbackPolicy::Local => {
            let local = state.local_oracle.clone();
            start_request(state, local, true, outcome_tx, event_tx);
            let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
        }
        FallbackPolicy::Forfeit => {
            if let Some(side) = state.ai_side {
                match state.game.resign(side) {
                    Ok(()) => tracing::info!(side = %side, "AI side forfeits"),
                    Err(e) => {
                        let _ = event_tx.send(SessionEvent::Error(e.to_string()));
                    }
                }
            }
            let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_client::{AiMove, Evaluation, MockOracle};
    use chess::{parse_uci, Game, PieceColor};

    fn test_state(oracle: MockOracle) -> SessionState {
        let oracle: Arc<dyn MoveOracle> = Arc::new(oracle);
        let mut state = SessionState::new("test".to_string(), Game::new(), oracle.clone(), oracle);
        state.ai_side = Some(PieceColor::Black);
        state
    }

    fn outcome(request_id: u64, generation: u64, uci: &str) -> AiOutcome {
        AiOutcome {
            request_id,
            generation,
            oracle: "mock".to_string(),
            fallback: false,
            result: Ok(AiMove {
                mv: parse_uci(uci).unwrap(),
                evaluation: Evaluation::default(),
                generation,
            }),
        }
    }

    fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn outcome_for_an_older_generation_is_discarded() {
        let mut state = test_state(MockOracle::new().with_delay(std::time::Duration::from_secs(60)));
        let (outcome_tx, _outcome_rx) = mpsc::channel(8);
        let (event_tx, mut events) = broadcast::channel(32);

        state.game.apply_move(&parse_uci("e2e4").unwrap()).unwrap();
        maybe_start_ai(&mut state, &outcome_tx, &event_tx);
        let pending_id = state.pending.as_ref().unwrap().request_id;

        // A reply computed against the start position arrives late.
        handle_ai_outcome(&mut state, outcome(pending_id, 0, "e7e5"), &outcome_tx, &event_tx);

        assert_eq!(state.game.history().len(), 1);
        assert!(state.pending.is_some());
        let events = drain(&mut events);
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::StaleAiResponse { generation: 0, .. })));
        state.cancel_pending();
    }

    #[tokio::test]
    async fn outcome_for_an_unknown_request_is_discarded() {
        let mut state = test_state(MockOracle::new());
        let (outcome_tx, _outcome_rx) = mpsc::channel(8);
        let (event_tx, mut events) = broadcast::channel(32);
        state.game.apply_move(&parse_uci("e2e4").unwrap()).unwrap();

        // Nothing pending: e.g. the request was cancelled after it replied.
        handle_ai_outcome(&mut state, outcome(7, 1, "e7e5"), &outcome_tx, &event_tx);

        assert_eq!(state.game.history().len(), 1);
        assert!(matches!(
            drain(&mut events).as_slice(),
            [SessionEvent::StaleAiResponse { request_id: 7, .. }]
        ));
    }

    #[tokio::test]
    async fn current_outcome_is_applied() {
        let mut state = test_state(MockOracle::new().with_delay(std::time::Duration::from_secs(60)));
        let (outcome_tx, _outcome_rx) = mpsc::channel(8);
        let (event_tx, mut events) = broadcast::channel(32);

        state.game.apply_move(&parse_uci("e2e4").unwrap()).unwrap();
        maybe_start_ai(&mut state, &outcome_tx, &event_tx);
        let pending_id = state.pending.as_ref().unwrap().request_id;
        state.cancel_pending();
        // Re-arm as if the task were still running.
        state.pending = Some(PendingAi {
            request_id: pending_id,
            generation: 1,
            fallback: false,
            task: tokio::spawn(async {}),
        });

        handle_ai_outcome(&mut state, outcome(pending_id, 1, "e7e5"), &outcome_tx, &event_tx);

        assert_eq!(state.game.history().len(), 2);
        assert!(state.pending.is_none());
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, SessionEvent::AiMoved { uci, .. } if uci == "e7e5")));
    }

    #[test]
    fn request_ai_needs_the_ai_to_move() {
        let mut state = test_state(MockOracle::new());
        assert!(matches!(request_ai(&mut state), Err(SessionError::NotAiTurn)));
        state.game.abort().unwrap();
        assert!(matches!(request_ai(&mut state), Err(SessionError::GameOver(_))));
    }
}
