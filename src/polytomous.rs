//! Polytomous IRT category probabilities (GRM, GPCM, GGUM).
//!
//! Each model fills a `(n_categories, n_persons)` buffer in place for a
//! single item so the simulation loop can reuse one allocation across items.

use std::fmt;
use std::str::FromStr;

use ndarray::{ArrayView1, ArrayView2, ArrayViewMut2, Axis};

use crate::error::{GirthError, Result};
use crate::utils::{sigmoid, SYMMETRY_TOLERANCE};

/// The polytomous response theories supported by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolytomousModel {
    /// Graded Response Model: differences of cumulative logistic curves.
    Graded,
    /// Generalized Partial Credit Model: softmax over cumulative logits.
    PartialCredit,
    /// Generalized Graded Unfolding Model: partial credit folded about the
    /// middle category.
    Unfolding,
}

impl PolytomousModel {
    /// Fill `output` (n_thresholds + 1, n_persons) with category probabilities
    /// for one item.
    ///
    /// Fails with `DimensionMismatch` when `difficulty` is empty or `output`
    /// has the wrong shape.
    pub fn level_probabilities(
        &self,
        difficulty: ArrayView1<f64>,
        discrimination: f64,
        thetas: ArrayView1<f64>,
        output: ArrayViewMut2<f64>,
    ) -> Result<()> {
        match self {
            PolytomousModel::Graded => {
                graded_probabilities(difficulty, discrimination, thetas, output)
            }
            PolytomousModel::PartialCredit => {
                credit_probabilities(difficulty, discrimination, thetas, output)
            }
            PolytomousModel::Unfolding => {
                unfolding_probabilities(difficulty, discrimination, thetas, output, 0.0)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PolytomousModel::Graded => "grm",
            PolytomousModel::PartialCredit => "pcm",
            PolytomousModel::Unfolding => "gum",
        }
    }
}

impl fmt::Display for PolytomousModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolytomousModel {
    type Err = GirthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "grm" => Ok(PolytomousModel::Graded),
            "pcm" => Ok(PolytomousModel::PartialCredit),
            "gum" => Ok(PolytomousModel::Unfolding),
            _ => Err(GirthError::UnknownModel(s.to_string())),
        }
    }
}

fn check_output_shape(
    difficulty: &ArrayView1<f64>,
    thetas: &ArrayView1<f64>,
    output: &ArrayViewMut2<f64>,
) -> Result<()> {
    if difficulty.is_empty() {
        return Err(GirthError::DimensionMismatch(
            "an item needs at least one threshold".to_string(),
        ));
    }
    let expected = (difficulty.len() + 1, thetas.len());
    if output.dim() != expected {
        return Err(GirthError::DimensionMismatch(format!(
            "output buffer is {:?}, expected {:?}",
            output.dim(),
            expected
        )));
    }
    Ok(())
}

/// Graded response model probabilities.
///
/// Row `0` is `1 - P(d_0)`, interior rows are `P(d_{k-1}) - P(d_k)` and the
/// last row is `P(d_last)`, where `P(d) = sigmoid(a * (theta - d))`.
pub fn graded_probabilities(
    difficulty: ArrayView1<f64>,
    discrimination: f64,
    thetas: ArrayView1<f64>,
    mut output: ArrayViewMut2<f64>,
) -> Result<()> {
    check_output_shape(&difficulty, &thetas, &output)?;
    let last = difficulty.len();

    for (mut column, &theta) in output.axis_iter_mut(Axis(1)).zip(thetas.iter()) {
        let survival = |d: f64| sigmoid((theta - d) * discrimination);

        column[0] = 1.0 - survival(difficulty[0]);
        for level in 1..last {
            let right = survival(difficulty[level]);
            let left = survival(difficulty[level - 1]);
            column[level] = left - right;
        }
        column[last] = survival(difficulty[last - 1]);
    }
    Ok(())
}

/// Generalized partial credit model probabilities.
///
/// Category `k` is proportional to `exp(sum_{j<k} a * (theta - d_j))`; each
/// column is normalized to sum to one.
pub fn credit_probabilities(
    difficulty: ArrayView1<f64>,
    discrimination: f64,
    thetas: ArrayView1<f64>,
    mut output: ArrayViewMut2<f64>,
) -> Result<()> {
    check_output_shape(&difficulty, &thetas, &output)?;

    for (mut column, &theta) in output.axis_iter_mut(Axis(1)).zip(thetas.iter()) {
        let mut cumulative: f64 = 0.0;
        column[0] = cumulative.exp();
        for (level, &d) in difficulty.iter().enumerate() {
            cumulative += (theta - d) * discrimination;
            column[level + 1] = cumulative.exp();
        }

        let normalizing_term = 1.0 / column.iter().fold(0.0, |acc, &v| acc + v);
        column.mapv_inplace(|v| v * normalizing_term);
    }
    Ok(())
}

/// Generalized graded unfolding model probabilities.
///
/// Runs the partial credit model and folds category `k` onto category
/// `K - 1 - k`. `mix` keeps that fraction of the mirrored mass in place:
/// `0` is a pure unfolding model, `1` leaves the partial credit result as is.
pub fn unfolding_probabilities(
    difficulty: ArrayView1<f64>,
    discrimination: f64,
    thetas: ArrayView1<f64>,
    mut output: ArrayViewMut2<f64>,
    mix: f64,
) -> Result<()> {
    credit_probabilities(difficulty, discrimination, thetas, output.view_mut())?;

    let n_levels = output.nrows();
    for level in 0..n_levels / 2 {
        let mirror = n_levels - 1 - level;
        for person in 0..output.ncols() {
            let folded = output[[mirror, person]];
            output[[level, person]] += folded * (1.0 - mix);
            output[[mirror, person]] = folded * mix;
        }
    }
    Ok(())
}

/// Validate difficulty parameters (n_items, n_thresholds) for `model`.
///
/// # Returns
/// The highest valid category label: `n_thresholds + 1`, or the folded
/// ceiling `(n_thresholds - 1) / 2 + 1` for the unfolding model.
pub fn check_difficulty_parameters(
    difficulty: ArrayView2<f64>,
    model: PolytomousModel,
) -> Result<usize> {
    let n_thresholds = difficulty.ncols();
    if n_thresholds < 2 {
        return Err(GirthError::Validation(
            "Polytomous items must have more than 1 threshold".to_string(),
        ));
    }

    match model {
        PolytomousModel::Graded => {
            for (item, row) in difficulty.rows().into_iter().enumerate() {
                if !(1..row.len()).all(|k| row[k - 1] < row[k]) {
                    return Err(GirthError::Validation(format!(
                        "Difficulty parameters must be in ascending order (item {})",
                        item
                    )));
                }
            }
            Ok(n_thresholds + 1)
        }
        PolytomousModel::PartialCredit => Ok(n_thresholds + 1),
        PolytomousModel::Unfolding => {
            if n_thresholds % 2 == 0 {
                return Err(GirthError::Validation(
                    "There must be an odd number of difficulty parameters".to_string(),
                ));
            }

            let middle = (n_thresholds - 1) / 2;
            for (item, row) in difficulty.rows().into_iter().enumerate() {
                let offset = row[middle];
                let skew: f64 = row.iter().map(|&d| d - offset).sum();
                if skew.is_nan() || skew.abs() >= SYMMETRY_TOLERANCE {
                    return Err(GirthError::Validation(format!(
                        "Difficulty parameters must be symmetric about offset (item {})",
                        item
                    )));
                }
            }
            Ok(middle + 1)
        }
    }
}
