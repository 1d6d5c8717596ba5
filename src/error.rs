//! Error types for the regression comparison framework

use thiserror::Error;

use crate::training::LifecycleState;

/// Result type alias for framework operations
pub type Result<T> = std::result::Result<T, RegressionError>;

/// Main error type for the framework
#[derive(Error, Debug)]
pub enum RegressionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Length mismatch: {predicted} predicted values, {actual} actual values")]
    LengthMismatch { predicted: usize, actual: usize },

    #[error("Convergence not reached after {epochs} epochs (last cost change {last_change})")]
    ConvergenceNotReached { epochs: usize, last_change: f64 },

    #[error("Gradient descent diverged at epoch {epoch} with learning rate {learning_rate}")]
    Diverged { epoch: usize, learning_rate: f64 },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Cannot {operation} while the model is {state}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for RegressionError {
    fn from(err: serde_json::Error) -> Self {
        RegressionError::SerializationError(err.to_string())
    }
}
