//! Mock MoveOracle implementation for testing

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chess::Snapshot;

use crate::error::AiError;
use crate::resolve::resolve_move;
use crate::traits::{AiMove, MoveOracle};
use crate::wire::Evaluation;

type Responder = Box<dyn Fn(&Snapshot) -> Result<String, AiError> + Send>;

/// Scripted oracle. Each request pops the next queued reply; once the queue
/// is empty the fallback responder (if any) answers. Replies are move text
/// and go through the same resolution as a real service's answers.
#[derive(Clone, Default)]
pub struct MockOracle {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    queued: VecDeque<Result<String, AiError>>,
    fallback: Option<Responder>,
    delay: Duration,
    calls: Vec<MockCall>,
}

/// One recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub generation: u64,
    pub fen: String,
    pub history_uci: Vec<String>,
    pub think: Duration,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a move reply.
    pub fn with_move(self, text: &str) -> Self {
        self.state().queued.push_back(Ok(text.to_string()));
        self
    }

    /// Queue a failure reply.
    pub fn with_error(self, err: AiError) -> Self {
        self.state().queued.push_back(Err(err));
        self
    }

    /// Answer with `f` whenever the queue is empty.
    pub fn with_responder<F>(self, f: F) -> Self
    where
        F: Fn(&Snapshot) -> Result<String, AiError> + Send + 'static,
    {
        self.state().fallback = Some(Box::new(f));
        self
    }

    /// Answer with the first legal move of the position.
    pub fn with_first_legal_move(self) -> Self {
        self.with_responder(|snapshot| {
            chess::generate_legal_moves(&snapshot.state)
                .first()
                .map(|mv| mv.to_string())
                .ok_or(AiError::NoMoveAvailable)
        })
    }

    /// Sleep this long before answering.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state().delay = delay;
        self
    }

    pub fn push_move(&self, text: &str) {
        self.state().queued.push_back(Ok(text.to_string()));
    }

    pub fn push_error(&self, err: AiError) {
        self.state().queued.push_back(Err(err));
    }

    /// Get recorded calls for verification
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear()
    }
}

#[async_trait]
impl MoveOracle for MockOracle {
    async fn request_move(
        &self,
        snapshot: &Snapshot,
        think: Duration,
    ) -> Result<AiMove, AiError> {
        let (reply, delay) = {
            let mut state = self.state();
            state.calls.push(MockCall {
                generation: snapshot.generation,
                fen: snapshot.fen(),
                history_uci: snapshot.history_uci.clone(),
                think,
            });
            let reply = match state.queued.pop_front() {
                Some(reply) => reply,
                None => match &state.fallback {
                    Some(f) => f(snapshot),
                    None => Err(AiError::Unreachable("mock has no reply queued".to_string())),
                },
            };
            (reply, state.delay)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let text = reply?;
        let mv = resolve_move(snapshot, &text)?;
        Ok(AiMove {
            mv,
            evaluation: Evaluation::default(),
            generation: snapshot.generation,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
