//! Shared numeric kernels used across the simulation modules.

use ndarray::ArrayViewMut1;
use rand::RngCore;

/// Tolerance used when checking that unfolding thresholds are skew-symmetric.
pub const SYMMETRY_TOLERANCE: f64 = 1e-7;

/// Logistic function `1 / (1 + exp(-x))`.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Uniform draw in `[0, 1)` with 53 bits of resolution.
///
/// Two 32-bit words are consumed per draw: the top 27 bits of the first and
/// the top 26 bits of the second.
#[inline]
pub fn uniform<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    let a = (rng.next_u32() >> 5) as f64;
    let b = (rng.next_u32() >> 6) as f64;
    (a * 67_108_864.0 + b) / 9_007_199_254_740_992.0
}

/// Fill `out` with uniform draws in iteration order.
pub fn fill_uniform<R: RngCore + ?Sized>(rng: &mut R, mut out: ArrayViewMut1<f64>) {
    for value in out.iter_mut() {
        *value = uniform(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn test_sigmoid_midpoint_and_tails() {
        assert_abs_diff_eq!(sigmoid(0.0), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(sigmoid(40.0), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(sigmoid(-800.0), 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(sigmoid(1.3) + sigmoid(-1.3), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_uniform_range() {
        let mut rng = Pcg64::seed_from_u64(42);
        let mut buffer = Array1::<f64>::zeros(10_000);
        fill_uniform(&mut rng, buffer.view_mut());

        assert!(buffer.iter().all(|&u| (0.0..1.0).contains(&u)));
        let mean = buffer.mean().unwrap();
        assert_abs_diff_eq!(mean, 0.5, epsilon = 0.02);
    }
}
