// Error types module

use crate::config::ConfigError;
use crate::storage::StorageError;
use thiserror::Error;

/// Why a single pipeline run produced no visible effect.
///
/// Runs never return this to their trigger; it is logged at the orchestrator
/// boundary and the run is discarded.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration could not be loaded (invalid YAML, missing env vars, etc.)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Watermark directory or file could not be written
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Background task panicked or was cancelled
    #[error("Background run aborted: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::Join(err.to_string())
    }
}
