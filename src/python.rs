//! Python bindings for the simulation routines.

use ndarray::Array1;
use numpy::{PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray2, ToPyArray};
use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::abilities;
use crate::dichotomous::{self, ItemParameter};
use crate::error::GirthError;
use crate::identifiability::DiscriminationIndices;
use crate::missing;
use crate::options::SamplerOptions;
use crate::polytomous::PolytomousModel;
use crate::rng::generator_from_seed;
use crate::simulation;

impl From<GirthError> for PyErr {
    fn from(err: GirthError) -> PyErr {
        match err {
            GirthError::UnknownModel(_) => PyKeyError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

/// A number or a one-dimensional array of per-item values.
#[derive(FromPyObject)]
pub enum PyItemParameter<'py> {
    Scalar(f64),
    Vector(PyReadonlyArray1<'py, f64>),
}

impl PyItemParameter<'_> {
    fn to_item_parameter(&self) -> ItemParameter {
        match self {
            PyItemParameter::Scalar(value) => ItemParameter::Scalar(*value),
            PyItemParameter::Vector(values) => ItemParameter::PerItem(values.as_array().to_owned()),
        }
    }
}

/// Evaluate the unidimensional logistic model.
#[pyfunction]
#[pyo3(signature = (difficulty, discrimination, thetas))]
pub fn irt_evaluation<'py>(
    py: Python<'py>,
    difficulty: PyReadonlyArray1<f64>,
    discrimination: PyItemParameter,
    thetas: PyReadonlyArray1<f64>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let difficulty = difficulty.as_array().to_owned();
    let thetas = thetas.as_array().to_owned();
    let discrimination = discrimination.to_item_parameter();

    let probabilities = py.detach(|| {
        dichotomous::irt_evaluation(difficulty.view(), &discrimination, thetas.view())
    })?;
    Ok(probabilities.to_pyarray(py))
}

/// Create dichotomous unidimensional synthetic data.
#[pyfunction]
#[pyo3(signature = (difficulty, discrimination, thetas, guessing=None, seed=None))]
pub fn create_synthetic_irt_dichotomous<'py>(
    py: Python<'py>,
    difficulty: PyReadonlyArray1<f64>,
    discrimination: PyItemParameter,
    thetas: PyReadonlyArray1<f64>,
    guessing: Option<PyItemParameter>,
    seed: Option<u64>,
) -> PyResult<Bound<'py, PyArray2<i32>>> {
    let guessing = guessing
        .map(|g| g.to_item_parameter())
        .unwrap_or_default();
    let mut rng = generator_from_seed(seed);
    let responses = dichotomous::create_synthetic_irt_dichotomous(
        difficulty.as_array(),
        &discrimination.to_item_parameter(),
        thetas.as_array(),
        &guessing,
        &mut rng,
    )?;
    Ok(responses.to_pyarray(py))
}

/// Create dichotomous multidimensional synthetic data.
#[pyfunction]
#[pyo3(signature = (difficulty, discrimination, thetas, seed=None))]
pub fn create_synthetic_mirt_dichotomous<'py>(
    py: Python<'py>,
    difficulty: PyReadonlyArray1<f64>,
    discrimination: PyReadonlyArray2<f64>,
    thetas: PyReadonlyArray2<f64>,
    seed: Option<u64>,
) -> PyResult<Bound<'py, PyArray2<i32>>> {
    let mut rng = generator_from_seed(seed);
    let responses = dichotomous::create_synthetic_mirt_dichotomous(
        difficulty.as_array(),
        discrimination.as_array(),
        thetas.as_array(),
        &mut rng,
    )?;
    Ok(responses.to_pyarray(py))
}

/// Create polytomous unidimensional synthetic data.
///
/// `model` is one of "grm", "pcm" or "gum".
#[pyfunction]
#[pyo3(signature = (difficulty, discrimination, thetas, model="grm", seed=None))]
pub fn create_synthetic_irt_polytomous<'py>(
    py: Python<'py>,
    difficulty: PyReadonlyArray2<f64>,
    discrimination: PyItemParameter,
    thetas: PyReadonlyArray1<f64>,
    model: &str,
    seed: Option<u64>,
) -> PyResult<Bound<'py, PyArray2<i32>>> {
    let model: PolytomousModel = model.parse()?;
    let mut rng = generator_from_seed(seed);
    let responses = simulation::create_synthetic_irt_polytomous(
        difficulty.as_array(),
        &discrimination.to_item_parameter(),
        thetas.as_array(),
        model,
        &mut rng,
    )?;
    Ok(responses.to_pyarray(py))
}

/// Create correlated abilities (n_factors, n_participants).
#[pyfunction]
#[pyo3(signature = (correlation_matrix, n_participants, seed=None))]
pub fn create_correlated_abilities<'py>(
    py: Python<'py>,
    correlation_matrix: PyReadonlyArray2<f64>,
    n_participants: usize,
    seed: Option<u64>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let mut rng = generator_from_seed(seed);
    let abilities =
        abilities::create_correlated_abilities(correlation_matrix.as_array(), n_participants, &mut rng)?;
    Ok(abilities.to_pyarray(py))
}

type IndexTuple<'py> = (Bound<'py, PyArray1<usize>>, Bound<'py, PyArray1<usize>>);

/// Return `((diag_rows, diag_cols), (lower_rows, lower_cols))`.
#[pyfunction]
pub fn get_discrimination_indices<'py>(
    py: Python<'py>,
    n_items: usize,
    n_factors: usize,
) -> PyResult<(IndexTuple<'py>, IndexTuple<'py>)> {
    let indices = DiscriminationIndices::new(n_items, n_factors)?;
    let to_tuple = |rows: &[usize], cols: &[usize]| -> IndexTuple<'py> {
        (
            Array1::from(rows.to_vec()).to_pyarray(py),
            Array1::from(cols.to_vec()).to_pyarray(py),
        )
    };
    Ok((
        to_tuple(&indices.diagonal().rows, &indices.diagonal().cols),
        to_tuple(&indices.lower().rows, &indices.lower().cols),
    ))
}

/// Return `(data, mask)` where the mask flags responses not in `valid_responses`.
#[pyfunction]
pub fn tag_missing_data<'py>(
    py: Python<'py>,
    dataset: PyReadonlyArray2<i32>,
    valid_responses: Vec<i32>,
) -> (Bound<'py, PyArray2<i32>>, Bound<'py, PyArray2<bool>>) {
    let (data, mask) = missing::tag_missing_data(dataset.as_array(), &valid_responses).into_parts();
    (data.to_pyarray(py), mask.to_pyarray(py))
}

/// Validate sampler options, returning the completed dictionary.
#[pyfunction]
#[pyo3(signature = (**options))]
pub fn validate_sampler_options<'py>(
    py: Python<'py>,
    options: Option<&Bound<'py, PyDict>>,
) -> PyResult<Bound<'py, PyDict>> {
    let mut full = SamplerOptions::default();

    if let Some(options) = options {
        for (key, value) in options.iter() {
            let key: String = key.extract()?;
            match key.as_str() {
                "n_processors" => full.n_processors = value.extract()?,
                "n_tune" => full.n_tune = value.extract()?,
                "n_samples" => full.n_samples = value.extract()?,
                "variational_inference" => full.variational_inference = value.extract()?,
                "variational_model" => {
                    full.variational_model = value.extract::<String>()?.parse()?
                }
                "variational_samples" => full.variational_samples = value.extract()?,
                "initial_guess" => full.initial_guess = value.extract()?,
                _ => {
                    return Err(PyValueError::new_err(format!(
                        "Unexpected option: {}",
                        key
                    )))
                }
            }
        }
    }
    full.validate()?;

    let result = PyDict::new(py);
    result.set_item("n_processors", full.n_processors)?;
    result.set_item("n_tune", full.n_tune)?;
    result.set_item("n_samples", full.n_samples)?;
    result.set_item("variational_inference", full.variational_inference)?;
    result.set_item("variational_model", full.variational_model.to_string())?;
    result.set_item("variational_samples", full.variational_samples)?;
    result.set_item("initial_guess", full.initial_guess)?;
    Ok(result)
}

/// Register simulation functions with the Python module
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(irt_evaluation, m)?)?;
    m.add_function(wrap_pyfunction!(create_synthetic_irt_dichotomous, m)?)?;
    m.add_function(wrap_pyfunction!(create_synthetic_mirt_dichotomous, m)?)?;
    m.add_function(wrap_pyfunction!(create_synthetic_irt_polytomous, m)?)?;
    m.add_function(wrap_pyfunction!(create_correlated_abilities, m)?)?;
    m.add_function(wrap_pyfunction!(get_discrimination_indices, m)?)?;
    m.add_function(wrap_pyfunction!(tag_missing_data, m)?)?;
    m.add_function(wrap_pyfunction!(validate_sampler_options, m)?)?;
    Ok(())
}
