//! Error types for the nonlinear FEA solver

use thiserror::Error;

use crate::analysis::DivergenceReason;

/// Main error type for FEA operations
#[derive(Error, Debug)]
pub enum FEAError {
    #[error("Grip {0} not found in model")]
    GripNotFound(usize),

    #[error("Element {0} not found in model")]
    ElementNotFound(usize),

    #[error("Duplicate number {0} already exists")]
    DuplicateNumber(usize),

    #[error("Duplicate degree of freedom assignment at grip {0}")]
    DuplicateDof(usize),

    #[error("Invalid analysis parameters: {0}")]
    InvalidParameters(String),

    #[error("Load step {step} diverged: {reason}")]
    Diverged { step: usize, reason: DivergenceReason },

    #[error("Model not analyzed - run analyze() first")]
    NotAnalyzed,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for FEA operations
pub type FEAResult<T> = Result<T, FEAError>;
