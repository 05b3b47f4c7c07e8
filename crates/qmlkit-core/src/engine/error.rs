use crate::core::error::ErrorKind;
use crate::core::matrix::ShapeError;
use crate::core::representations::{RepresentationError, RepresentationKind};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },

    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Representation {index} is {actual:?} but the kernel mode expects {expected:?}")]
    RepresentationKindMismatch {
        index: usize,
        expected: RepresentationKind,
        actual: RepresentationKind,
    },

    #[error("Matrix is not positive definite: pivot {pivot} at row {row}")]
    SingularMatrix { row: usize, pivot: f64 },

    #[error("Encoding failed: {source}")]
    Representation {
        #[from]
        source: RepresentationError,
    },

    #[error("Malformed matrix: {source}")]
    Shape {
        #[from]
        source: ShapeError,
    },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. }
            | Self::DimensionMismatch { .. }
            | Self::RepresentationKindMismatch { .. }
            | Self::Shape { .. } => ErrorKind::InvalidParameter,
            Self::SingularMatrix { .. } => ErrorKind::SingularMatrix,
            Self::Representation { source } => source.kind(),
        }
    }

    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }

    pub(crate) fn check_dimension(
        what: &'static str,
        expected: usize,
        actual: usize,
    ) -> Result<(), Self> {
        if expected != actual {
            return Err(Self::DimensionMismatch {
                what,
                expected,
                actual,
            });
        }
        Ok(())
    }
}
