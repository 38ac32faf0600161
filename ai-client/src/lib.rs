//! Remote AI move client
//!
//! Asks an HTTP best-move service for a move in a game snapshot and checks
//! the answer against the legality engine before handing it back.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use ai_client::{MoveOracle, RemoteAiClient, RemoteAiConfig};
//! use chess::Game;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RemoteAiClient::new(RemoteAiConfig::new("http://localhost:8000"))?;
//!     let game = Game::new();
//!     let reply = client
//!         .request_move(&game.snapshot(), Duration::from_millis(2000))
//!         .await?;
//!     println!("AI plays {}", reply.mv);
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod resolve;
mod retry;
mod traits;
mod wire;

#[cfg(any(test, feature = "mock"))]
mod mock;

pub use client::{RemoteAiClient, RemoteAiConfig, DEFAULT_TIMEOUT};
pub use error::{AiError, ClientError, ClientResult};
pub use resolve::resolve_move;
pub use retry::{RetryPolicy, DEFAULT_ATTEMPTS, DEFAULT_BACKOFF};
pub use traits::{AiMove, MoveOracle};
pub use wire::{BestMoveRequest, BestMoveResponse, Evaluation, Score, WireScore};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCall, MockOracle};
