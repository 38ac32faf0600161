//! Terminal chess against a remote AI service.
//!
//! The `session` actor owns the game and runs AI turns through a
//! [`ai_client::MoveOracle`]: the HTTP client when `AI_URL` is configured,
//! the built-in engine otherwise. `terminal` is the text front end.

pub mod config;
pub mod oracle;
pub mod session;
pub mod terminal;

pub use config::{AppConfig, ConfigError, FallbackPolicy};
pub use oracle::{build_oracle, LocalOracle};
pub use session::{
    spawn_session, SessionError, SessionEvent, SessionHandle, SessionOptions, SessionSnapshot,
};
