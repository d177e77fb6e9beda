//! Correlated multidimensional ability synthesis.

use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView2};
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};

use crate::error::{GirthError, Result};

/// Draw abilities (n_factors, n_participants) from a multivariate normal with
/// unit variances and the given correlation matrix.
///
/// Computes `L @ Z` where `L` is the lower Cholesky factor of `correlation`
/// and `Z` is standard normal, drawn row by row. Only the lower triangle of
/// `correlation` is read.
pub fn create_correlated_abilities<R: RngCore + ?Sized>(
    correlation: ArrayView2<f64>,
    n_participants: usize,
    rng: &mut R,
) -> Result<Array2<f64>> {
    let (n_factors, n_cols) = correlation.dim();
    if n_factors != n_cols {
        return Err(GirthError::DimensionMismatch(format!(
            "correlation matrix must be square, got ({}, {})",
            n_factors, n_cols
        )));
    }

    let matrix = DMatrix::from_fn(n_factors, n_factors, |i, j| correlation[[i, j]]);
    let lower = matrix
        .cholesky()
        .ok_or(GirthError::NotPositiveDefinite)?
        .l();

    let normals: Array2<f64> =
        Array2::from_shape_fn((n_factors, n_participants), |_| StandardNormal.sample(&mut *rng));

    let abilities = Array2::from_shape_fn((n_factors, n_participants), |(i, p)| {
        (0..=i).map(|k| lower[(i, k)] * normals[[k, p]]).sum::<f64>()
    });
    Ok(abilities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Mt19937;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Axis};
    use rand::SeedableRng;

    fn correlation_coefficient(x: ndarray::ArrayView1<f64>, y: ndarray::ArrayView1<f64>) -> f64 {
        let mx = x.mean().unwrap();
        let my = y.mean().unwrap();
        let cov: f64 = x.iter().zip(y.iter()).map(|(a, b)| (a - mx) * (b - my)).sum();
        let vx: f64 = x.iter().map(|a| (a - mx).powi(2)).sum();
        let vy: f64 = y.iter().map(|b| (b - my).powi(2)).sum();
        cov / (vx * vy).sqrt()
    }

    #[test]
    fn test_correlated_abilities() {
        let mut rng = Mt19937::seed_from_u64(120);
        let rho = 0.73;
        let correlation = array![[1.0, rho], [rho, 1.0]];

        let output = create_correlated_abilities(correlation.view(), 1000, &mut rng).unwrap();
        assert_eq!(output.dim(), (2, 1000));

        let estimated = correlation_coefficient(output.row(0), output.row(1));
        assert_abs_diff_eq!(estimated, rho, epsilon = 0.1);

        for variance in output.var_axis(Axis(1), 1.0).iter() {
            assert_abs_diff_eq!(*variance, 1.0, epsilon = 0.15);
        }
    }

    #[test]
    fn test_identity_correlation_passes_normals_through() {
        let correlation = Array2::<f64>::eye(3);
        let mut a = Mt19937::seed_from_u64(8);
        let mut b = Mt19937::seed_from_u64(8);

        let output = create_correlated_abilities(correlation.view(), 4, &mut a).unwrap();
        for value in output.iter() {
            let expected: f64 = StandardNormal.sample(&mut b);
            assert_abs_diff_eq!(*value, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_invalid_correlation() {
        let mut rng = Mt19937::seed_from_u64(1);
        let not_square = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            create_correlated_abilities(not_square.view(), 10, &mut rng),
            Err(GirthError::DimensionMismatch(_))
        ));

        let indefinite = array![[1.0, 2.0], [2.0, 1.0]];
        assert_eq!(
            create_correlated_abilities(indefinite.view(), 10, &mut rng),
            Err(GirthError::NotPositiveDefinite)
        );
    }
}
