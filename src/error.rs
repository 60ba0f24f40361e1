//! Error types for the tuner

use thiserror::Error;

/// Result type alias for tuner operations
pub type Result<T> = std::result::Result<T, TunerError>;

/// Main error type for the tuner
#[derive(Error, Debug)]
pub enum TunerError {
    /// A search-space dimension is malformed (empty choices, inverted range, ...)
    #[error("Invalid bound '{name}': {reason}")]
    InvalidBound { name: String, reason: String },

    /// Optimizer or problem configuration rejected before any evaluation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A candidate could not be scored. Recovered inside the objective.
    #[error("Objective evaluation failed: {0}")]
    ObjectiveEvaluation(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TunerError {
    pub(crate) fn invalid_bound(name: impl Into<String>, reason: impl Into<String>) -> Self {
        TunerError::InvalidBound {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors raised while building a search space or optimizer.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            TunerError::InvalidBound { .. } | TunerError::InvalidConfig(_)
        )
    }
}

impl From<polars::error::PolarsError> for TunerError {
    fn from(err: polars::error::PolarsError) -> Self {
        TunerError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TunerError {
    fn from(err: serde_json::Error) -> Self {
        TunerError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TunerError {
    fn from(err: ndarray::ShapeError) -> Self {
        TunerError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TunerError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");

        let err = TunerError::invalid_bound("alpha", "lower must be < upper");
        assert_eq!(err.to_string(), "Invalid bound 'alpha': lower must be < upper");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TunerError = io_err.into();
        assert!(matches!(err, TunerError::IoError(_)));
    }

    #[test]
    fn test_config_error_category() {
        assert!(TunerError::InvalidConfig("pop_size".into()).is_config_error());
        assert!(TunerError::invalid_bound("x", "empty").is_config_error());
        assert!(!TunerError::ObjectiveEvaluation("nan".into()).is_config_error());
    }
}
