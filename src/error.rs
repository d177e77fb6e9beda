//! Error types shared by every module of the crate.

use thiserror::Error;

/// Input-contract violations raised by the simulation and indexing routines.
///
/// All checks run before any random draw is consumed, so an error never
/// leaves a partially simulated dataset behind.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GirthError {
    /// Parameters have an invalid value or ordering.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A model (or variational method) name is not recognised.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// Array shapes do not agree with each other.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Cholesky factorisation failed.
    #[error("Correlation matrix is not positive definite")]
    NotPositiveDefinite,
}

pub type Result<T> = std::result::Result<T, GirthError>;
