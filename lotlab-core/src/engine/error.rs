use thiserror::Error;

/// Errors raised before any bar is processed. Both are fatal to the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("configuration error: {field} must be a positive number (got {value})")]
    Configuration { field: &'static str, value: f64 },

    #[error("data shape error: {0}")]
    DataShape(String),
}

/// Reject a parameter that is not a finite, strictly positive number.
pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::Configuration { field, value })
    }
}
