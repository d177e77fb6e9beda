//! Identifiability indexing for multidimensional discrimination matrices.
//!
//! A loading matrix of shape (n_items, n_factors) has rotational
//! indeterminacy. Fixing a triangular block of zeros removes it: only the
//! `diagonal` and `lower` entries are free, everything else is held at zero.
//! The anchor block sits on the *last* items (rows are reflected) so the
//! first items keep fully free loadings.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{GirthError, Result};

/// Coordinates into a 2-D matrix, stored as parallel row/column sequences.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexPairs {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

impl IndexPairs {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().copied().zip(self.cols.iter().copied())
    }

    fn push(&mut self, row: usize, col: usize) {
        self.rows.push(row);
        self.cols.push(col);
    }
}

/// Free-parameter positions of an identifiable (n_items, n_factors) loading
/// matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscriminationIndices {
    n_items: usize,
    n_factors: usize,
    diagonal: IndexPairs,
    lower: IndexPairs,
}

impl DiscriminationIndices {
    /// Build the index sets for `n_items` items loading on `n_factors` factors.
    ///
    /// Requires `1 <= n_factors <= n_items`.
    pub fn new(n_items: usize, n_factors: usize) -> Result<Self> {
        if n_factors == 0 || n_factors > n_items {
            return Err(GirthError::DimensionMismatch(format!(
                "need 1 <= n_factors <= n_items, got {} factors for {} items",
                n_factors, n_items
            )));
        }

        let reflect = |row: usize| n_items - 1 - row;

        let mut diagonal = IndexPairs::default();
        for factor in 0..n_factors {
            diagonal.push(reflect(factor), factor);
        }

        let mut lower = IndexPairs::default();
        for row in 0..n_items {
            for col in 0..row.min(n_factors) {
                lower.push(reflect(row), col);
            }
        }

        Ok(Self {
            n_items,
            n_factors,
            diagonal,
            lower,
        })
    }

    /// Same as [`DiscriminationIndices::new`], for model builders that need
    /// at least two factors.
    pub fn for_multidimensional_model(n_items: usize, n_factors: usize) -> Result<Self> {
        if n_factors < 2 {
            return Err(GirthError::Validation(format!(
                "multidimensional models require two or more factors, got {}",
                n_factors
            )));
        }
        Self::new(n_items, n_factors)
    }

    pub fn n_items(&self) -> usize {
        self.n_items
    }

    pub fn n_factors(&self) -> usize {
        self.n_factors
    }

    pub fn diagonal(&self) -> &IndexPairs {
        &self.diagonal
    }

    pub fn lower(&self) -> &IndexPairs {
        &self.lower
    }

    /// Number of free loadings: `n_factors + len(lower)`.
    pub fn parameter_count(&self) -> usize {
        self.diagonal.len() + self.lower.len()
    }

    /// Place `diagonal` and `lower` values into a zero matrix.
    pub fn scatter(&self, diagonal: ArrayView1<f64>, lower: ArrayView1<f64>) -> Result<Array2<f64>> {
        if diagonal.len() != self.diagonal.len() || lower.len() != self.lower.len() {
            return Err(GirthError::DimensionMismatch(format!(
                "expected {} diagonal and {} lower values, got {} and {}",
                self.diagonal.len(),
                self.lower.len(),
                diagonal.len(),
                lower.len()
            )));
        }

        let mut loadings = Array2::zeros((self.n_items, self.n_factors));
        for ((row, col), &value) in self.diagonal.iter().zip(diagonal.iter()) {
            loadings[[row, col]] = value;
        }
        for ((row, col), &value) in self.lower.iter().zip(lower.iter()) {
            loadings[[row, col]] = value;
        }
        Ok(loadings)
    }

    /// Scatter a flat parameter vector laid out as `[diagonal..., lower...]`.
    pub fn scatter_flat(&self, parameters: ArrayView1<f64>) -> Result<Array2<f64>> {
        if parameters.len() != self.parameter_count() {
            return Err(GirthError::DimensionMismatch(format!(
                "expected {} parameters, got {}",
                self.parameter_count(),
                parameters.len()
            )));
        }
        let split = self.diagonal.len();
        self.scatter(
            parameters.slice(ndarray::s![..split]),
            parameters.slice(ndarray::s![split..]),
        )
    }

    /// Read the free entries back out of a loading matrix.
    pub fn gather(&self, loadings: ArrayView2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
        if loadings.dim() != (self.n_items, self.n_factors) {
            return Err(GirthError::DimensionMismatch(format!(
                "expected a ({}, {}) matrix, got {:?}",
                self.n_items,
                self.n_factors,
                loadings.dim()
            )));
        }

        let diagonal = self.diagonal.iter().map(|(r, c)| loadings[[r, c]]).collect();
        let lower = self.lower.iter().map(|(r, c)| loadings[[r, c]]).collect();
        Ok((diagonal, lower))
    }

    /// Inverse of [`DiscriminationIndices::scatter_flat`].
    pub fn gather_flat(&self, loadings: ArrayView2<f64>) -> Result<Array1<f64>> {
        let (diagonal, lower) = self.gather(loadings)?;
        Ok(diagonal.iter().chain(lower.iter()).copied().collect())
    }
}

/// Convenience wrapper returning `(diagonal, lower)` index pairs.
pub fn get_discrimination_indices(n_items: usize, n_factors: usize) -> Result<(IndexPairs, IndexPairs)> {
    let indices = DiscriminationIndices::new(n_items, n_factors)?;
    Ok((indices.diagonal, indices.lower))
}
