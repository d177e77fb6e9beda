//! Dichotomous logistic IRT kernels and binary response synthesis.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use rand::RngCore;
use tracing::debug;

use crate::error::{GirthError, Result};
use crate::utils::{sigmoid, uniform};

/// An item parameter given either once for all items or per item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemParameter {
    Scalar(f64),
    PerItem(Array1<f64>),
}

impl ItemParameter {
    /// Expand to one value per item. A length-1 vector counts as a scalar.
    pub fn broadcast(&self, n_items: usize, name: &str) -> Result<Array1<f64>> {
        match self {
            ItemParameter::Scalar(value) => Ok(Array1::from_elem(n_items, *value)),
            ItemParameter::PerItem(values) if values.len() == 1 => {
                Ok(Array1::from_elem(n_items, values[0]))
            }
            ItemParameter::PerItem(values) if values.len() == n_items => Ok(values.clone()),
            ItemParameter::PerItem(values) => Err(GirthError::DimensionMismatch(format!(
                "{} has {} values but there are {} items",
                name,
                values.len(),
                n_items
            ))),
        }
    }
}

impl Default for ItemParameter {
    fn default() -> Self {
        ItemParameter::Scalar(0.0)
    }
}

impl From<f64> for ItemParameter {
    fn from(value: f64) -> Self {
        ItemParameter::Scalar(value)
    }
}

impl From<Array1<f64>> for ItemParameter {
    fn from(values: Array1<f64>) -> Self {
        ItemParameter::PerItem(values)
    }
}

impl From<Vec<f64>> for ItemParameter {
    fn from(values: Vec<f64>) -> Self {
        ItemParameter::PerItem(Array1::from(values))
    }
}

/// Evaluate the unidimensional model `sigmoid(a_m * (theta_p - b_m))`.
///
/// # Arguments
/// * `difficulty` - Item difficulties (n_items,)
/// * `discrimination` - Common or per-item discrimination
/// * `thetas` - Person abilities (n_persons,)
///
/// # Returns
/// Probabilities (n_items, n_persons)
pub fn irt_evaluation(
    difficulty: ArrayView1<f64>,
    discrimination: &ItemParameter,
    thetas: ArrayView1<f64>,
) -> Result<Array2<f64>> {
    let n_items = difficulty.len();
    let discrimination = discrimination.broadcast(n_items, "discrimination")?;

    let mut probabilities = Array2::zeros((n_items, thetas.len()));
    Zip::from(probabilities.rows_mut())
        .and(&difficulty)
        .and(&discrimination)
        .par_for_each(|mut row, &b, &a| {
            for (p, &theta) in row.iter_mut().zip(thetas.iter()) {
                *p = sigmoid((theta - b) * a);
            }
        });

    Ok(probabilities)
}

/// Evaluate the compensatory multidimensional model
/// `sigmoid(A @ Theta + d)`.
///
/// # Arguments
/// * `difficulty` - Item intercepts (n_items,)
/// * `discrimination` - Loadings (n_items, n_factors), or a single row shared by all items
/// * `thetas` - Abilities (n_factors, n_persons)
///
/// # Returns
/// Probabilities (n_items, n_persons)
pub fn mirt_evaluation(
    difficulty: ArrayView1<f64>,
    discrimination: ArrayView2<f64>,
    thetas: ArrayView2<f64>,
) -> Result<Array2<f64>> {
    let n_items = difficulty.len();
    let (disc_rows, n_factors) = discrimination.dim();

    if disc_rows != n_items && disc_rows != 1 {
        return Err(GirthError::DimensionMismatch(format!(
            "discrimination has {} rows but there are {} items",
            disc_rows, n_items
        )));
    }
    if n_factors != thetas.nrows() {
        return Err(GirthError::DimensionMismatch(format!(
            "discrimination has {} factors but abilities have {}",
            n_factors,
            thetas.nrows()
        )));
    }

    let loadings = discrimination
        .broadcast((n_items, n_factors))
        .ok_or_else(|| {
            GirthError::DimensionMismatch("discrimination cannot be broadcast".to_string())
        })?;

    let mut probabilities = Array2::zeros((n_items, thetas.ncols()));
    Zip::from(probabilities.rows_mut())
        .and(loadings.rows())
        .and(&difficulty)
        .par_for_each(|mut row, a, &d| {
            for (p, theta) in row.iter_mut().zip(thetas.axis_iter(Axis(1))) {
                let mut kernel = 0.0;
                for (&a_f, &theta_f) in a.iter().zip(theta.iter()) {
                    kernel += a_f * theta_f;
                }
                *p = sigmoid(kernel + d);
            }
        });

    Ok(probabilities)
}

/// Lift probabilities by a guessing floor: `g + (1 - g) * p`.
pub fn apply_guessing(probabilities: &mut Array2<f64>, guessing: &ItemParameter) -> Result<()> {
    let guessing = guessing.broadcast(probabilities.nrows(), "guessing")?;
    Zip::from(probabilities.rows_mut())
        .and(&guessing)
        .for_each(|mut row, &g| {
            row.mapv_inplace(|p| p * (1.0 - g) + g);
        });
    Ok(())
}

/// Draw one uniform per cell in row-major order and return `1` where the
/// draw is at or below the probability.
pub fn binarize<R: RngCore + ?Sized>(probabilities: &Array2<f64>, rng: &mut R) -> Array2<i32> {
    Array2::from_shape_fn(probabilities.dim(), |(m, p)| {
        (uniform(rng) <= probabilities[[m, p]]) as i32
    })
}

/// Create dichotomous unidimensional responses (1PL/2PL/3PL).
///
/// # Returns
/// Responses (n_items, n_persons) with values in {0, 1}
pub fn create_synthetic_irt_dichotomous<R: RngCore + ?Sized>(
    difficulty: ArrayView1<f64>,
    discrimination: &ItemParameter,
    thetas: ArrayView1<f64>,
    guessing: &ItemParameter,
    rng: &mut R,
) -> Result<Array2<i32>> {
    debug!(
        n_items = difficulty.len(),
        n_persons = thetas.len(),
        "synthesizing dichotomous responses"
    );
    let mut probabilities = irt_evaluation(difficulty, discrimination, thetas)?;
    apply_guessing(&mut probabilities, guessing)?;
    Ok(binarize(&probabilities, rng))
}

/// Create dichotomous multidimensional responses.
///
/// # Returns
/// Responses (n_items, n_persons) with values in {0, 1}
pub fn create_synthetic_mirt_dichotomous<R: RngCore + ?Sized>(
    difficulty: ArrayView1<f64>,
    discrimination: ArrayView2<f64>,
    thetas: ArrayView2<f64>,
    rng: &mut R,
) -> Result<Array2<i32>> {
    debug!(
        n_items = difficulty.len(),
        n_factors = thetas.nrows(),
        n_persons = thetas.ncols(),
        "synthesizing multidimensional dichotomous responses"
    );
    let probabilities = mirt_evaluation(difficulty, discrimination, thetas)?;
    Ok(binarize(&probabilities, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Mt19937;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn test_irt_evaluation_closed_form() {
        let difficulty = array![-1.0, 0.0, 2.0];
        let thetas = Array1::linspace(-3.0, 3.0, 7);
        let probs = irt_evaluation(difficulty.view(), &1.7.into(), thetas.view()).unwrap();

        assert_eq!(probs.dim(), (3, 7));
        for ((m, p), &value) in probs.indexed_iter() {
            let expected = 1.0 / (1.0 + (-1.7 * (thetas[p] - difficulty[m])).exp());
            assert_abs_diff_eq!(value, expected, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_scalar_and_vector_discrimination_agree() {
        let difficulty = array![0.3, -0.4];
        let thetas = array![-1.0, 0.5, 1.5];
        let scalar = irt_evaluation(difficulty.view(), &1.2.into(), thetas.view()).unwrap();
        let vector =
            irt_evaluation(difficulty.view(), &vec![1.2, 1.2].into(), thetas.view()).unwrap();
        let single = irt_evaluation(difficulty.view(), &vec![1.2].into(), thetas.view()).unwrap();
        assert_eq!(scalar, vector);
        assert_eq!(scalar, single);
    }

    #[test]
    fn test_discrimination_length_mismatch() {
        let difficulty = array![0.3, -0.4, 0.1];
        let thetas = array![0.0];
        let result = irt_evaluation(difficulty.view(), &vec![1.0, 2.0].into(), thetas.view());
        assert!(matches!(result, Err(GirthError::DimensionMismatch(_))));
    }

    #[test]
    fn test_mirt_evaluation_shapes() {
        let difficulty = array![0.0, 1.0];
        let thetas = Array2::<f64>::zeros((3, 4));

        let bad_factors = Array2::<f64>::ones((2, 2));
        assert!(matches!(
            mirt_evaluation(difficulty.view(), bad_factors.view(), thetas.view()),
            Err(GirthError::DimensionMismatch(_))
        ));

        let bad_items = Array2::<f64>::ones((3, 3));
        assert!(mirt_evaluation(difficulty.view(), bad_items.view(), thetas.view()).is_err());

        let probs =
            mirt_evaluation(difficulty.view(), Array2::<f64>::ones((2, 3)).view(), thetas.view())
                .unwrap();
        assert_abs_diff_eq!(probs[[0, 0]], 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(probs[[1, 3]], 1.0 / (1.0 + (-1.0f64).exp()), epsilon = 1e-15);
    }

    #[test]
    fn test_mirt_single_row_broadcast() {
        let difficulty = array![-0.5, 0.0, 0.5];
        let row = array![[0.4, -1.1]];
        let full = array![[0.4, -1.1], [0.4, -1.1], [0.4, -1.1]];
        let thetas = array![[0.2, -0.7, 1.4], [1.0, 0.3, -0.2]];

        let a = mirt_evaluation(difficulty.view(), row.view(), thetas.view()).unwrap();
        let b = mirt_evaluation(difficulty.view(), full.view(), thetas.view()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_guessing_floor() {
        let difficulty = array![50.0, 50.0];
        let thetas = array![-5.0, 0.0, 5.0];
        let mut rng = Pcg64::seed_from_u64(9);

        let all_floor = create_synthetic_irt_dichotomous(
            difficulty.view(),
            &1.0.into(),
            thetas.view(),
            &1.0.into(),
            &mut rng,
        )
        .unwrap();
        assert!(all_floor.iter().all(|&r| r == 1));

        let mut probs = irt_evaluation(difficulty.view(), &1.0.into(), thetas.view()).unwrap();
        apply_guessing(&mut probs, &vec![0.25, 0.0].into()).unwrap();
        assert!(probs.row(0).iter().all(|&p| (p - 0.25).abs() < 1e-12));
        assert!(probs.row(1).iter().all(|&p| p < 1e-12));
    }

    #[test]
    fn test_dichotomous_regression() {
        let expected = array![[0, 0, 0, 0, 1, 1], [0, 0, 1, 1, 1, 1], [0, 0, 0, 1, 1, 1]];
        let mut rng = Mt19937::seed_from_u64(31);
        let value = create_synthetic_irt_dichotomous(
            array![1.2, -0.2, 1.3].view(),
            &1.31.into(),
            Array1::linspace(-6.0, 6.0, 6).view(),
            &ItemParameter::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(value, expected);
    }

    #[test]
    fn test_mirt_regression() {
        let discrimination = array![
            [-0.26672228588224606, 1.9452030882646705, -1.7891870033386976],
            [-0.4465594461969176, 0.3792348319593083, 1.442691140154262],
            [-0.1901813941390807, -1.2367020899097683, -1.200704599932651],
            [-0.7142897777826845, 0.4026081775230769, 0.495805534612111],
            [0.4597942318196293, 0.23934780492795943, -0.27937019973921545]
        ];
        let thetas = array![
            [0.3315542963728707, 0.05610152690703898, -1.001585721279488,
             -1.432651220918679, 0.2950323996136697, -0.846170437456876],
            [-0.13986682366062428, 0.5972309629817074, 0.14638907743459867,
             -0.9919775247752182, 0.9039495486473352, 0.24482046766531798],
            [1.027510490757865, -0.3900119846463598, 0.9426685188146665,
             1.8480958637567593, 0.12586729120571113, 0.9887932327618355]
        ];
        let expected = array![
            [0, 0, 0, 0, 0, 0],
            [1, 0, 0, 1, 0, 1],
            [1, 1, 0, 0, 0, 0],
            [1, 1, 1, 1, 0, 1],
            [1, 1, 1, 1, 1, 1]
        ];

        let mut rng = Mt19937::seed_from_u64(164);
        let value = create_synthetic_mirt_dichotomous(
            Array1::linspace(-5.0, 5.0, 5).view(),
            discrimination.view(),
            thetas.view(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(value, expected);
    }

    #[test]
    fn test_mirt_regression_common_discrimination() {
        let discrimination = array![[-1.3042046821348623, -0.3681330727628987, -0.7587895796855875]];
        let thetas = array![
            [1.2919342628153563, 0.3153489623156702, 0.6743486356082387,
             0.9112727234685316, 0.4913298076163095, -0.5194133291031185],
            [2.9508967181463426, -0.10489656766928741, 0.535981011632307,
             -0.44224599134140247, -0.5737682787285107, 0.7147257103701996],
            [0.836128891322959, 1.1533470188543278, 0.6446317704239282,
             -0.3674295905553838, 0.9245096810299511, -0.03427210683524702]
        ];
        let expected = array![
            [0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0],
            [0, 0, 0, 1, 1, 1],
            [0, 1, 1, 1, 1, 1],
            [1, 1, 1, 1, 1, 1]
        ];

        let mut rng = Mt19937::seed_from_u64(546);
        let value = create_synthetic_mirt_dichotomous(
            Array1::linspace(-5.0, 5.0, 5).view(),
            discrimination.view(),
            thetas.view(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(value, expected);
    }
}
