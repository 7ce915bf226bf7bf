//! Game error types
//!
//! Setup errors (`Config`, `InsufficientInput`) abort the whole run.
//! `Generation` and `Input` abort only the game in progress; the runner
//! logs them and moves on to the next game.

use thiserror::Error;

use crate::state::IllegalTransition;

/// Result type alias for game operations
pub type VillageResult<T> = Result<T, GameError>;

/// Errors raised by the text-generation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("request to model endpoint failed: {0}")]
    RequestFailed(String),

    #[error("model endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model '{model}' returned empty content")]
    Empty { model: String },

    #[error("malformed completion payload: {0}")]
    Malformed(String),
}

/// Top-level error for setting up and playing games.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("not enough candidate names: {available} available, {required} required")]
    InsufficientInput { available: usize, required: usize },

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("prompt template '{name}' unavailable: {reason}")]
    Template { name: String, reason: String },

    #[error("interactive input failed: {0}")]
    Input(String),

    #[error("failed to persist game {game}: {reason}")]
    Persistence { game: usize, reason: String },

    #[error("agent '{name}': {reason}")]
    Agent { name: String, reason: String },

    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),
}

impl GameError {
    /// Whether this error only invalidates the game in progress.
    ///
    /// Everything else is a setup or programming error that stops the run.
    pub fn is_game_scoped(&self) -> bool {
        matches!(self, Self::Generation(_) | Self::Input(_))
    }
}
