//! Discrete Gaussian weights for the separable blur.
//!
//! `sigma` is derived from the radius (`radius / 3`) so the kernel covers
//! roughly three standard deviations on each side. Only the one-sided half
//! (`0..=radius`) is stored; the shader generator mirrors it.

use std::f64::consts::PI;

use crate::types::KernelNormalization;

#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernel {
    radius: u32,
    sigma: f64,
    normalization: KernelNormalization,
    weights: Vec<f32>,
}

impl GaussianKernel {
    /// Builds the normalized one-sided weights for `radius`.
    ///
    /// A radius of zero yields the identity kernel `[1.0]` regardless of the
    /// normalization mode.
    pub fn new(radius: u32, normalization: KernelNormalization) -> Self {
        let sigma = f64::from(radius) / 3.0;
        if radius == 0 {
            return Self {
                radius,
                sigma,
                normalization,
                weights: vec![1.0],
            };
        }

        let raw: Vec<f64> = (0..=radius)
            .map(|offset| gaussian(f64::from(offset), sigma))
            .collect();
        let one_sided: f64 = raw.iter().sum();
        let total = match normalization {
            KernelNormalization::Exact => 2.0 * one_sided - raw[0],
            KernelNormalization::Legacy => 2.0 * one_sided,
        };
        let weights = raw.iter().map(|weight| (weight / total) as f32).collect();

        Self {
            radius,
            sigma,
            normalization,
            weights,
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn normalization(&self) -> KernelNormalization {
        self.normalization
    }

    /// One-sided weights indexed by offset magnitude; length is `radius + 1`.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Every tap of the mirrored kernel as `(offset, weight)`, from `-radius`
    /// to `radius`.
    pub fn taps(&self) -> impl Iterator<Item = (i64, f32)> + '_ {
        let radius = i64::from(self.radius);
        (-radius..=radius).map(move |offset| (offset, self.weights[offset.unsigned_abs() as usize]))
    }

    /// Sum of the full two-sided kernel.
    pub fn two_sided_sum(&self) -> f32 {
        self.taps().map(|(_, weight)| weight).sum()
    }
}

/// Normal density at `offset` for standard deviation `sigma`.
pub fn gaussian(offset: f64, sigma: f64) -> f64 {
    (1.0 / ((2.0 * PI).sqrt() * sigma)) * (-(offset * offset) / (2.0 * sigma * sigma)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_kernel_sums_to_one() {
        for radius in 1..=40 {
            let kernel = GaussianKernel::new(radius, KernelNormalization::Exact);
            let sum = kernel.two_sided_sum();
            assert!(
                (sum - 1.0).abs() < 1e-4,
                "radius {radius} summed to {sum}"
            );
        }
    }

    #[test]
    fn weights_do_not_increase_with_offset() {
        for radius in 1..=40 {
            let kernel = GaussianKernel::new(radius, KernelNormalization::Exact);
            assert_eq!(kernel.weights().len(), radius as usize + 1);
            for pair in kernel.weights().windows(2) {
                assert!(pair[1] <= pair[0], "radius {radius}: {pair:?}");
            }
        }
    }

    #[test]
    fn legacy_kernel_loses_half_the_centre_tap() {
        for radius in [1, 3, 8, 20] {
            let kernel = GaussianKernel::new(radius, KernelNormalization::Legacy);
            let expected = 1.0 - kernel.weights()[0];
            let sum = kernel.two_sided_sum();
            assert!(sum < 1.0);
            assert!(
                (sum - expected).abs() < 1e-4,
                "radius {radius}: sum {sum}, expected {expected}"
            );
        }
    }

    #[test]
    fn zero_radius_is_identity() {
        for normalization in [KernelNormalization::Exact, KernelNormalization::Legacy] {
            let kernel = GaussianKernel::new(0, normalization);
            assert_eq!(kernel.weights(), &[1.0]);
            assert_eq!(kernel.taps().collect::<Vec<_>>(), vec![(0, 1.0)]);
        }
    }

    #[test]
    fn taps_mirror_the_weights() {
        let kernel = GaussianKernel::new(3, KernelNormalization::Exact);
        let taps: Vec<_> = kernel.taps().collect();
        assert_eq!(taps.len(), 7);
        assert_eq!(taps.first().map(|tap| tap.0), Some(-3));
        assert_eq!(taps.last().map(|tap| tap.0), Some(3));
        assert_eq!(taps[0].1, taps[6].1);
        assert_eq!(taps[3].1, kernel.weights()[0]);
        assert!((kernel.sigma() - 1.0).abs() < f64::EPSILON);
    }
}
