//! Fully connected layer.

use super::Module;
use crate::error::TensorError;
use crate::tensor::Tensor;
use rand::Rng;

/// `y = x W + b` for a batch `x` of shape `(batch, in_features)`.
///
/// The weight is stored as `(in_features, out_features)` so the forward pass
/// is a plain matmul; the bias `(1, out_features)` broadcasts over the batch.
#[derive(Debug, Clone)]
pub struct Linear {
    weight: Tensor,
    bias: Option<Tensor>,
}

impl Linear {
    /// New layer with weights drawn uniformly from `±1/sqrt(in_features)`
    /// and a zero bias.
    pub fn new(in_features: usize, out_features: usize, bias: bool) -> Self {
        Self::with_rng(in_features, out_features, bias, &mut rand::rng())
    }

    /// Like [`new`](Linear::new) with a caller-provided RNG.
    pub fn with_rng<R: Rng>(in_features: usize, out_features: usize, bias: bool, rng: &mut R) -> Self {
        let bound = 1.0 / (in_features.max(1) as f64).sqrt();
        // random in [0, 1) mapped to [-bound, bound)
        let weight = Tensor::random_with_rng(&[in_features, out_features], rng)
            .map(|u| (2.0 * u - 1.0) * bound);
        Self {
            weight,
            bias: bias.then(|| Tensor::zeros(&[1, out_features])),
        }
    }

    /// Build a layer from explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if `weight` is not rank 2 or `bias` is not `(1, out_features)`.
    pub fn from_parameters(weight: Tensor, bias: Option<Tensor>) -> Result<Self, TensorError> {
        if weight.ndim() != 2 {
            return Err(TensorError::RankMismatch {
                expected: 2,
                actual: weight.ndim(),
            });
        }
        if let Some(b) = &bias {
            let expected = [1, weight.shape()[1]];
            if b.shape() != expected {
                return Err(TensorError::BroadcastMismatch {
                    lhs: b.shape().to_vec(),
                    rhs: expected.to_vec(),
                });
            }
        }
        Ok(Self { weight, bias })
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Tensor> {
        self.bias.as_ref()
    }
}

impl Module for Linear {
    fn forward(&self, x: &Tensor) -> Result<Tensor, TensorError> {
        let y = x.matmul(&self.weight)?;
        match &self.bias {
            Some(b) => y.add(b),
            None => Ok(y),
        }
    }

    fn parameters(&self) -> Vec<Tensor> {
        std::iter::once(self.weight.clone())
            .chain(self.bias.clone())
            .collect()
    }
}
