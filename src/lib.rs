//! Synthetic data generation for Item Response Theory (IRT) models.
//!
//! This crate provides:
//! - Dichotomous logistic kernels (1PL/2PL/3PL, compensatory multidimensional 2PL)
//! - Polytomous category probabilities (graded response, generalized partial
//!   credit, generalized graded unfolding)
//! - Response simulation with a reusable scratch buffer and an explicitly
//!   passed, seedable random generator
//! - Identifiability indices for multidimensional discrimination matrices
//! - Correlated ability synthesis, missing-data tagging and sampler options
//!
//! Parameter estimation is left to an external sampler; the response matrices
//! produced here (items × persons) are its input.

pub mod utils;

pub mod abilities;
pub mod dichotomous;
pub mod error;
pub mod identifiability;
pub mod missing;
pub mod options;
pub mod polytomous;
pub mod rng;
pub mod simulation;

#[cfg(feature = "python")]
pub mod python;

pub use abilities::create_correlated_abilities;
pub use dichotomous::{
    create_synthetic_irt_dichotomous, create_synthetic_mirt_dichotomous, irt_evaluation,
    mirt_evaluation, ItemParameter,
};
pub use error::{GirthError, Result};
pub use identifiability::{get_discrimination_indices, DiscriminationIndices, IndexPairs};
pub use missing::{tag_missing_data, MaskedResponses};
pub use options::{SamplerOptions, VariationalModel};
pub use polytomous::{check_difficulty_parameters, PolytomousModel};
pub use rng::Mt19937;
pub use simulation::{
    create_synthetic_irt_polytomous, digitize, synthesize, synthesize_with_rng, AbilityMatrix,
    Discrimination, ItemParameters, ScratchBuffer, SyntheticModel,
};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module for girth_synth
#[cfg(feature = "python")]
#[pymodule]
fn girth_synth(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register(m)?;
    Ok(())
}
