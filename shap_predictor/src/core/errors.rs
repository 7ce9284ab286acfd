// src/core/errors.rs
use thiserror::Error;

/// Boxed error returned by external collaborators (preprocessing, model).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PredictorError {
    /// Malformed construction arguments, invalid mask parameters, or a
    /// preprocessing step that does not fit the supplied dataset.
    #[error("Configuration Error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// An operation was invoked before its required predecessor.
    #[error("Call Order Error: {0}")]
    Order(String),

    #[error("Shape Mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Type Mismatch: {0}")]
    TypeMismatch(String),

    #[error("Reconciliation Error: {0}")]
    Reconciliation(String),

    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    #[error("Model Prediction Error: {0}")]
    Model(String),

    #[error("Ndarray Error: {0}")]
    Ndarray(#[from] ndarray::ShapeError),
}

impl PredictorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Config error that keeps the collaborator's failure as its cause.
    pub fn config_caused_by(msg: impl Into<String>, source: BoxError) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(source),
        }
    }

    pub fn order(msg: impl Into<String>) -> Self {
        Self::Order(msg.into())
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    pub fn reconciliation(msg: impl Into<String>) -> Self {
        Self::Reconciliation(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

// Convenience type alias for Result
pub type Result<T> = std::result::Result<T, PredictorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn config_error_keeps_its_cause() {
        let cause: BoxError = "unknown category 'Z'".into();
        let err = PredictorError::config_caused_by("preprocessing failed", cause);
        assert!(err.to_string().contains("preprocessing failed"));
        let source = err.source().expect("chained cause");
        assert_eq!(source.to_string(), "unknown category 'Z'");
    }

    #[test]
    fn ndarray_shape_error_converts() {
        let res: Result<ndarray::Array2<f64>> =
            ndarray::Array2::from_shape_vec((2, 2), vec![1.0]).map_err(Into::into);
        assert!(matches!(res, Err(PredictorError::Ndarray(_))));
    }
}
