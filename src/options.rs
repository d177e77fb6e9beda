//! Options record handed to the external fitting backend.
//!
//! Estimation itself happens outside this crate; the record is defined here
//! so simulated data and its fitting configuration can be validated together.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{GirthError, Result};

/// Variational inference method used when `variational_inference` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationalModel {
    /// Automatic differentiation variational inference (mean field).
    #[default]
    Advi,
    /// Stein variational gradient descent.
    Svgd,
    /// Full-rank ADVI.
    FullrankAdvi,
}

impl fmt::Display for VariationalModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariationalModel::Advi => write!(f, "advi"),
            VariationalModel::Svgd => write!(f, "svgd"),
            VariationalModel::FullrankAdvi => write!(f, "fullrank_advi"),
        }
    }
}

impl FromStr for VariationalModel {
    type Err = GirthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "advi" => Ok(VariationalModel::Advi),
            "svgd" => Ok(VariationalModel::Svgd),
            "fullrank_advi" => Ok(VariationalModel::FullrankAdvi),
            _ => Err(GirthError::UnknownModel(s.to_string())),
        }
    }
}

/// Sampler configuration.
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerOptions {
    /// Number of chains run in parallel.
    ///
    /// Default: half the available threads, capped to [1, 2]
    pub n_processors: usize,

    /// Total burn-in samples across all chains.
    ///
    /// Default: 2500
    pub n_tune: usize,

    /// Total retained samples across all chains.
    ///
    /// Default: 10000
    pub n_samples: usize,

    /// Fit with variational inference instead of MCMC.
    ///
    /// Default: false
    pub variational_inference: bool,

    /// Default: advi
    pub variational_model: VariationalModel,

    /// Optimisation steps for variational fitting.
    ///
    /// Default: 15000
    pub variational_samples: usize,

    /// Start multidimensional samplers from a closed-form initial estimate.
    ///
    /// Default: true
    pub initial_guess: bool,
}

/// Lower bound (exclusive) for every sample count.
const MIN_SAMPLE_COUNT: usize = 100;

fn default_processors() -> usize {
    (rayon::current_num_threads() / 2).clamp(1, 2)
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            n_processors: default_processors(),
            n_tune: 2500,
            n_samples: 10000,
            variational_inference: false,
            variational_model: VariationalModel::default(),
            variational_samples: 15000,
            initial_guess: true,
        }
    }
}

impl SamplerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_processors(mut self, n_processors: usize) -> Self {
        self.n_processors = n_processors;
        self
    }

    pub fn with_samples(mut self, n_tune: usize, n_samples: usize) -> Self {
        self.n_tune = n_tune;
        self.n_samples = n_samples;
        self
    }

    pub fn with_variational(mut self, model: VariationalModel, n_steps: usize) -> Self {
        self.variational_inference = true;
        self.variational_model = model;
        self.variational_samples = n_steps;
        self
    }

    pub fn with_initial_guess(mut self, initial_guess: bool) -> Self {
        self.initial_guess = initial_guess;
        self
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if self.n_processors == 0 {
            return Err(invalid("n_processors", self.n_processors, "must be > 0"));
        }
        for (name, value) in [
            ("n_tune", self.n_tune),
            ("n_samples", self.n_samples),
            ("variational_samples", self.variational_samples),
        ] {
            if value <= MIN_SAMPLE_COUNT {
                return Err(invalid(name, value, "must be > 100"));
            }
        }
        Ok(())
    }

    /// Burn-in and retained samples per chain.
    pub fn per_chain_counts(&self) -> (usize, usize) {
        let chains = self.n_processors.max(1);
        (self.n_tune / chains, self.n_samples / chains)
    }
}

fn invalid(name: &str, value: usize, reason: &str) -> GirthError {
    warn!(option = name, value, "rejected sampler option");
    GirthError::Validation(format!("{}: {} {}", name, value, reason))
}
