//! Synthetic response generation.
//!
//! Polytomous data is produced item by item: the model fills a reusable
//! scratch buffer with category probabilities, the buffer is turned into a
//! cumulative distribution and each person's category is picked by
//! inverse-CDF lookup against one uniform draw.

use std::fmt;
use std::str::FromStr;

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis};
use rand::RngCore;
use tracing::{debug, trace};

use crate::dichotomous::{
    create_synthetic_irt_dichotomous, create_synthetic_mirt_dichotomous, ItemParameter,
};
use crate::error::{GirthError, Result};
use crate::polytomous::{check_difficulty_parameters, PolytomousModel};
use crate::rng::generator_from_seed;
use crate::utils::fill_uniform;

/// Index of the first cumulative boundary strictly above `draw`.
///
/// Draws at or beyond the last boundary map to the last index.
pub fn digitize(cumulative: ArrayView1<f64>, draw: f64) -> usize {
    let index = cumulative.iter().take_while(|&&boundary| boundary <= draw).count();
    index.min(cumulative.len().saturating_sub(1))
}

/// Working memory for polytomous simulation: `(n_categories + 1, n_persons)`.
///
/// Row 0 holds the per-person uniform draws, rows `1..` the item's category
/// probabilities (later their running sum). Contents are overwritten for
/// every item.
#[derive(Debug, Clone)]
pub struct ScratchBuffer {
    buffer: Array2<f64>,
}

impl ScratchBuffer {
    pub fn new(n_categories: usize, n_persons: usize) -> Self {
        Self {
            buffer: Array2::zeros((n_categories + 1, n_persons)),
        }
    }

    pub fn n_categories(&self) -> usize {
        self.buffer.nrows() - 1
    }

    pub fn n_persons(&self) -> usize {
        self.buffer.ncols()
    }

    /// Category probability rows, shape `(n_categories, n_persons)`.
    pub fn levels_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.buffer.slice_mut(s![1.., ..])
    }

    /// Running sum down the category axis, in place.
    fn accumulate(&mut self) {
        let mut levels = self.levels_mut();
        for level in 1..levels.nrows() {
            let (previous, mut current) = levels.multi_slice_mut((s![level - 1, ..], s![level, ..]));
            current += &previous;
        }
    }

    fn draw<R: RngCore + ?Sized>(&mut self, rng: &mut R) {
        fill_uniform(rng, self.buffer.row_mut(0));
    }

    fn digitize_into(&self, mut output: ArrayViewMut1<i32>) {
        for (value, column) in output.iter_mut().zip(self.buffer.axis_iter(Axis(1))) {
            *value = digitize(column.slice(s![1..]), column[0]) as i32;
        }
    }
}

/// Create polytomous unidimensional responses.
///
/// # Arguments
/// * `difficulty` - Thresholds (n_items, n_thresholds)
/// * `discrimination` - Common or per-item discrimination
/// * `thetas` - Person abilities (n_persons,)
/// * `model` - Which polytomous theory generates the categories
///
/// # Returns
/// Responses (n_items, n_persons) with values in `[1, ceiling]`, where the
/// ceiling is `n_thresholds + 1` (folded to `(n_thresholds - 1) / 2 + 1` for
/// the unfolding model).
pub fn create_synthetic_irt_polytomous<R: RngCore + ?Sized>(
    difficulty: ArrayView2<f64>,
    discrimination: &ItemParameter,
    thetas: ArrayView1<f64>,
    model: PolytomousModel,
    rng: &mut R,
) -> Result<Array2<i32>> {
    let (n_items, n_thresholds) = difficulty.dim();
    let clip_high = check_difficulty_parameters(difficulty, model)? as i32;
    let discrimination = discrimination.broadcast(n_items, "discrimination")?;

    debug!(
        %model,
        n_items,
        n_persons = thetas.len(),
        n_categories = n_thresholds + 1,
        "synthesizing polytomous responses"
    );

    let mut scratch = ScratchBuffer::new(n_thresholds + 1, thetas.len());
    let mut output = Array2::zeros((n_items, thetas.len()));

    for (item, mut responses) in output.axis_iter_mut(Axis(0)).enumerate() {
        model.level_probabilities(
            difficulty.row(item),
            discrimination[item],
            thetas,
            scratch.levels_mut(),
        )?;
        scratch.accumulate();
        scratch.draw(rng);
        scratch.digitize_into(responses.view_mut());
        trace!(item, "item simulated");
    }

    output.mapv_inplace(|category| (category + 1).clamp(1, clip_high));
    Ok(output)
}

/// Model selector accepted by [`synthesize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntheticModel {
    Dichotomous,
    MirtDichotomous,
    Polytomous(PolytomousModel),
}

impl fmt::Display for SyntheticModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntheticModel::Dichotomous => f.write_str("dichotomous"),
            SyntheticModel::MirtDichotomous => f.write_str("mirt-dichotomous"),
            SyntheticModel::Polytomous(model) => fmt::Display::fmt(model, f),
        }
    }
}

impl FromStr for SyntheticModel {
    type Err = GirthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dichotomous" => Ok(SyntheticModel::Dichotomous),
            "mirt-dichotomous" => Ok(SyntheticModel::MirtDichotomous),
            _ => s.parse().map(SyntheticModel::Polytomous),
        }
    }
}

/// Discrimination in any of the accepted shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Discrimination {
    Scalar(f64),
    /// One value per item. Multidimensional models read it as a
    /// single-factor loading column.
    PerItem(Array1<f64>),
    /// One loading per factor, shared by every item.
    SharedRow(Array1<f64>),
    /// (n_items, n_factors), or a single row shared by all items.
    Loadings(Array2<f64>),
}

impl Discrimination {
    fn to_item_parameter(&self) -> Result<ItemParameter> {
        match self {
            Discrimination::Scalar(value) => Ok(ItemParameter::Scalar(*value)),
            Discrimination::PerItem(values) => Ok(ItemParameter::PerItem(values.clone())),
            Discrimination::SharedRow(row) if row.len() == 1 => Ok(ItemParameter::Scalar(row[0])),
            Discrimination::SharedRow(row) => Err(GirthError::DimensionMismatch(format!(
                "unidimensional models take one discrimination per item, got a row of {} factors",
                row.len()
            ))),
            Discrimination::Loadings(loadings) if loadings.ncols() == 1 => {
                Ok(ItemParameter::PerItem(loadings.column(0).to_owned()))
            }
            Discrimination::Loadings(loadings) => Err(GirthError::DimensionMismatch(format!(
                "unidimensional models take one discrimination per item, got {} factors",
                loadings.ncols()
            ))),
        }
    }

    fn to_loadings(&self) -> Result<Array2<f64>> {
        match self {
            Discrimination::Scalar(_) => Err(GirthError::DimensionMismatch(
                "multidimensional models need a discrimination row or matrix".to_string(),
            )),
            Discrimination::PerItem(values) => Ok(values.clone().insert_axis(Axis(1))),
            Discrimination::SharedRow(row) => Ok(row.clone().insert_axis(Axis(0))),
            Discrimination::Loadings(loadings) => Ok(loadings.clone()),
        }
    }
}

impl From<f64> for Discrimination {
    fn from(value: f64) -> Self {
        Discrimination::Scalar(value)
    }
}

impl From<Array1<f64>> for Discrimination {
    fn from(values: Array1<f64>) -> Self {
        Discrimination::PerItem(values)
    }
}

impl From<Array2<f64>> for Discrimination {
    fn from(loadings: Array2<f64>) -> Self {
        Discrimination::Loadings(loadings)
    }
}

/// Item parameters for one simulation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemParameters {
    /// (n_items, 1) for dichotomous models, (n_items, n_thresholds) otherwise.
    pub difficulty: Array2<f64>,
    pub discrimination: Discrimination,
    /// Dichotomous unidimensional model only.
    pub guessing: ItemParameter,
}

impl ItemParameters {
    pub fn dichotomous(difficulty: Array1<f64>, discrimination: impl Into<Discrimination>) -> Self {
        Self {
            difficulty: difficulty.insert_axis(Axis(1)),
            discrimination: discrimination.into(),
            guessing: ItemParameter::default(),
        }
    }

    pub fn polytomous(thresholds: Array2<f64>, discrimination: impl Into<Discrimination>) -> Self {
        Self {
            difficulty: thresholds,
            discrimination: discrimination.into(),
            guessing: ItemParameter::default(),
        }
    }

    pub fn with_guessing(mut self, guessing: impl Into<ItemParameter>) -> Self {
        self.guessing = guessing.into();
        self
    }

    pub fn n_items(&self) -> usize {
        self.difficulty.nrows()
    }

    fn single_difficulty(&self) -> Result<ArrayView1<'_, f64>> {
        if self.difficulty.ncols() != 1 {
            return Err(GirthError::DimensionMismatch(format!(
                "dichotomous models take one difficulty per item, got {}",
                self.difficulty.ncols()
            )));
        }
        Ok(self.difficulty.column(0))
    }
}

/// Person abilities: one trait, or (n_factors, n_persons).
#[derive(Debug, Clone, PartialEq)]
pub enum AbilityMatrix {
    Unidimensional(Array1<f64>),
    Multidimensional(Array2<f64>),
}

impl AbilityMatrix {
    pub fn n_persons(&self) -> usize {
        match self {
            AbilityMatrix::Unidimensional(thetas) => thetas.len(),
            AbilityMatrix::Multidimensional(thetas) => thetas.ncols(),
        }
    }

    fn unidimensional(&self) -> Result<ArrayView1<'_, f64>> {
        match self {
            AbilityMatrix::Unidimensional(thetas) => Ok(thetas.view()),
            AbilityMatrix::Multidimensional(thetas) if thetas.nrows() == 1 => Ok(thetas.row(0)),
            AbilityMatrix::Multidimensional(thetas) => Err(GirthError::DimensionMismatch(format!(
                "unidimensional models need a single ability row, got {}",
                thetas.nrows()
            ))),
        }
    }

    fn multidimensional(&self) -> ArrayView2<'_, f64> {
        match self {
            AbilityMatrix::Unidimensional(thetas) => thetas.view().insert_axis(Axis(0)),
            AbilityMatrix::Multidimensional(thetas) => thetas.view(),
        }
    }
}

impl From<Array1<f64>> for AbilityMatrix {
    fn from(thetas: Array1<f64>) -> Self {
        AbilityMatrix::Unidimensional(thetas)
    }
}

impl From<Array2<f64>> for AbilityMatrix {
    fn from(thetas: Array2<f64>) -> Self {
        AbilityMatrix::Multidimensional(thetas)
    }
}

/// Simulate a response matrix with an explicitly supplied generator.
pub fn synthesize_with_rng<R: RngCore + ?Sized>(
    model: SyntheticModel,
    parameters: &ItemParameters,
    abilities: &AbilityMatrix,
    rng: &mut R,
) -> Result<Array2<i32>> {
    match model {
        SyntheticModel::Dichotomous => create_synthetic_irt_dichotomous(
            parameters.single_difficulty()?,
            &parameters.discrimination.to_item_parameter()?,
            abilities.unidimensional()?,
            &parameters.guessing,
            rng,
        ),
        SyntheticModel::MirtDichotomous => create_synthetic_mirt_dichotomous(
            parameters.single_difficulty()?,
            parameters.discrimination.to_loadings()?.view(),
            abilities.multidimensional(),
            rng,
        ),
        SyntheticModel::Polytomous(polytomous) => create_synthetic_irt_polytomous(
            parameters.difficulty.view(),
            &parameters.discrimination.to_item_parameter()?,
            abilities.unidimensional()?,
            polytomous,
            rng,
        ),
    }
}

/// Simulate a response matrix from a model token.
///
/// A `seed` of `None` or `Some(0)` draws from fresh entropy.
pub fn synthesize(
    model: &str,
    parameters: &ItemParameters,
    abilities: &AbilityMatrix,
    seed: Option<u64>,
) -> Result<Array2<i32>> {
    let model: SyntheticModel = model.parse()?;
    let mut rng = generator_from_seed(seed);
    synthesize_with_rng(model, parameters, abilities, &mut rng)
}
