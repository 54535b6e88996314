//! Error types for the decision core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("Invalid game action: {0}")]
    InvalidAction(String),

    #[error("Stale action reference: {0}")]
    StaleAction(String),

    #[error("Policy inference failed: {0}")]
    Inference(String),

    #[error("Game-copy identity mismatch: {0}")]
    IdentityMismatch(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
