//! Error types for Jacobian estimation.

use nx_core::CoreError;
use thiserror::Error;

/// Errors that can occur while estimating a Jacobian.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiffError {
    #[error("No function bound to the estimator")]
    UnboundFunction,

    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid step size at index {index}: {value} (must be positive and finite)")]
    InvalidStepSize { index: usize, value: String },

    #[error("Function evaluation failed: {what}")]
    Evaluation { what: String },

    #[error("Non-finite function output at row {row} ({probe})")]
    NonFiniteOutput { row: usize, probe: String },

    #[error("Unknown differentiation method: {name}")]
    InvalidMethod { name: String },

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

pub type DiffResult<T> = Result<T, DiffError>;

impl DiffError {
    /// Convenience for user functions reporting their own failures.
    pub fn evaluation(what: impl Into<String>) -> Self {
        DiffError::Evaluation { what: what.into() }
    }
}

impl From<DiffError> for CoreError {
    fn from(e: DiffError) -> Self {
        match e {
            DiffError::UnboundFunction => CoreError::InvalidArg {
                what: "unbound function",
            },
            DiffError::DimensionMismatch { what, .. } => CoreError::InvalidArg { what },
            DiffError::InvalidStepSize { .. } => CoreError::InvalidArg { what: "step size" },
            DiffError::Evaluation { .. } => CoreError::InvalidArg {
                what: "function evaluation",
            },
            DiffError::NonFiniteOutput { .. } => CoreError::InvalidArg {
                what: "non-finite function output",
            },
            DiffError::InvalidMethod { .. } => CoreError::InvalidArg {
                what: "differentiation method",
            },
            DiffError::Core(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DiffError::DimensionMismatch {
            what: "evaluation point",
            expected: 3,
            actual: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("evaluation point"));
        assert!(msg.contains("expected 3"));
    }

    #[test]
    fn error_conversion() {
        let core: CoreError = DiffError::UnboundFunction.into();
        assert!(matches!(core, CoreError::InvalidArg { .. }));

        let oob = CoreError::IndexOob {
            what: "step sizes",
            index: 4,
            len: 2,
        };
        let back: CoreError = DiffError::from(oob.clone()).into();
        assert_eq!(back, oob);
    }
}
