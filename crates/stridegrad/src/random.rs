//! Random tensor construction.
//!
//! This module provides functions for creating leaf tensors with random values.

use rand::Rng;
use rand::distr::{StandardUniform, Uniform};
use rand_distr::StandardNormal;

use crate::error::TensorError;
use crate::strides::numel;
use crate::tensor::Tensor;

impl Tensor {
    /// Create a tensor with uniform random values in [0, 1).
    ///
    /// # Example
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let t = Tensor::random(&[2, 3]);
    /// assert_eq!(t.shape(), &[2, 3]);
    ///
    /// // All values are in [0, 1)
    /// assert!(t.to_vec().iter().all(|&v| (0.0..1.0).contains(&v)));
    /// ```
    pub fn random(shape: &[usize]) -> Self {
        Self::random_with_rng(shape, &mut rand::rng())
    }

    /// Create a tensor with uniform random values using a specific RNG.
    ///
    /// This is useful for reproducible results with a seeded RNG.
    ///
    /// # Example
    ///
    /// ```
    /// use stridegrad::Tensor;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let t1 = Tensor::random_with_rng(&[2, 3], &mut rng);
    ///
    /// // Reset RNG with same seed for reproducible results
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let t2 = Tensor::random_with_rng(&[2, 3], &mut rng);
    ///
    /// assert_eq!(t1.to_vec(), t2.to_vec());
    /// ```
    pub fn random_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        let data = (0..numel(shape)).map(|_| rng.sample(StandardUniform)).collect();
        Self::from_parts(data, shape.to_vec())
    }

    /// Create a tensor with standard normal random values.
    pub fn randn(shape: &[usize]) -> Self {
        Self::randn_with_rng(shape, &mut rand::rng())
    }

    /// Create a tensor with standard normal random values using a specific RNG.
    pub fn randn_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        let data = (0..numel(shape)).map(|_| rng.sample(StandardNormal)).collect();
        Self::from_parts(data, shape.to_vec())
    }

    /// Uniform random values in `[low, high)`.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::InvalidOperation` unless `low < high` and both are finite.
    pub fn uniform_with_rng<R: Rng>(
        shape: &[usize],
        low: f64,
        high: f64,
        rng: &mut R,
    ) -> Result<Self, TensorError> {
        let dist = Uniform::new(low, high).map_err(|e| {
            TensorError::InvalidOperation(format!("uniform range [{low}, {high}): {e}"))
        })?;
        let data = (0..numel(shape)).map(|_| rng.sample(&dist)).collect();
        Ok(Self::from_parts(data, shape.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_is_leaf() {
        let t = Tensor::random(&[4, 5]);
        assert_eq!(t.len(), 20);
        assert!(t.is_leaf());
        assert!(t.is_contiguous());
    }

    #[test]
    fn test_randn_statistics() {
        let mut rng = StdRng::seed_from_u64(7);
        let t = Tensor::randn_with_rng(&[10_000], &mut rng);
        let v = t.to_vec();
        let mean = v.iter().sum::<f64>() / v.len() as f64;
        let var = v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / v.len() as f64;

        assert!(mean.abs() < 0.05, "mean = {mean}");
        assert!((var - 1.0).abs() < 0.1, "var = {var}");
    }

    #[test]
    fn test_uniform_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let t = Tensor::uniform_with_rng(&[100], -0.5, 0.5, &mut rng).unwrap();
        assert!(t.to_vec().iter().all(|&v| (-0.5..0.5).contains(&v)));

        assert!(Tensor::uniform_with_rng(&[1], 1.0, 1.0, &mut rng).is_err());
    }
}
