//! The game session actor.
//!
//! One tokio task owns the [`Game`] and is its only mutator. Callers talk to
//! it through a [`SessionHandle`] (commands with oneshot replies) and watch
//! it through a broadcast channel of [`SessionEvent`]s. AI requests run on
//! their own tasks and report back to the actor, which applies an answer
//! only if it still belongs to the current request and game generation.

pub mod actor;
pub mod commands;
pub mod events;
pub mod handle;
pub mod snapshot;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use ai_client::MoveOracle;
use chess::{Game, PieceColor};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::config::{AppConfig, FallbackPolicy};
use crate::oracle::LocalOracle;
use actor::run_session_actor;
pub use commands::SessionError;
pub use events::SessionEvent;
pub use handle::SessionHandle;
pub use snapshot::{MoveRecord, SessionSnapshot};
use state::SessionState;

pub(crate) const DEFAULT_THINK: Duration = Duration::from_millis(2000);

/// How a session runs its AI turns.
#[derive(Clone)]
pub struct SessionOptions {
    pub ai_side: Option<PieceColor>,
    pub think: Duration,
    pub fallback: FallbackPolicy,
    /// Plays the move when the fallback policy is `local`.
    pub local_oracle: Arc<dyn MoveOracle>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            ai_side: None,
            think: DEFAULT_THINK,
            fallback: FallbackPolicy::default(),
            local_oracle: Arc::new(LocalOracle::default()),
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &AppConfig, ai_side: Option<PieceColor>) -> Self {
        Self {
            ai_side,
            think: config.think,
            fallback: config.fallback,
            ..Self::default()
        }
    }
}

/// Spawn a session actor for `game` and return its handle.
pub fn spawn_session(
    game: Game,
    oracle: Arc<dyn MoveOracle>,
    options: SessionOptions,
) -> SessionHandle {
    let session_id = Uuid::new_v4().to_string();
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (event_tx, _) = broadcast::channel(100);

    let mut state = SessionState::new(session_id.clone(), game, oracle, options.local_oracle);
    state.ai_side = options.ai_side;
    state.think = options.think;
    state.fallback = options.fallback;

    tokio::spawn(run_session_actor(state, cmd_rx, event_tx));
    SessionHandle::new(session_id, cmd_tx)
}
