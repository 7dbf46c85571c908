//! Engine-wide error type shared by the game contract layer.

use thiserror::Error;

/// Errors raised by the abstract game layer and by configuration
/// validation shared across crates.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("illegal move: {0:?} is not legal in this position")]
    IllegalMove(crate::game::PlayerMove),

    #[error("illegal player value: {0}")]
    IllegalPlayer(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}
