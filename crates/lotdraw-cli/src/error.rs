//! Error types for the lotdraw CLI

use lotdraw_engine::{BroadcastError, EngineError, QuotaError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid quota configuration: {0}")]
    Quota(#[from] QuotaError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("broadcast error: {0}")]
    Broadcast(#[from] BroadcastError),

    #[error("cannot read fixture {path}: {reason}")]
    Fixture { path: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("simulation stalled: {0}")]
    Stalled(String),

    #[error("background task failed: {0}")]
    Task(String),
}

pub type CliResult<T> = Result<T, CliError>;
