//! Parameter-free activation layers.

use super::Module;
use crate::error::TensorError;
use crate::tensor::Tensor;

/// Activation applied as a layer of a [`Sequential`](super::Sequential).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    Identity,
}

impl Activation {
    /// Apply the activation to `x`.
    pub fn apply(self, x: &Tensor) -> Tensor {
        match self {
            Activation::Relu => x.relu(),
            Activation::Sigmoid => x.sigmoid(),
            Activation::Tanh => x.tanh(),
            Activation::Identity => x.clone(),
        }
    }
}

impl Module for Activation {
    fn forward(&self, x: &Tensor) -> Result<Tensor, TensorError> {
        Ok(self.apply(x))
    }

    fn parameters(&self) -> Vec<Tensor> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch() {
        let x = Tensor::from_slice(&[-1.0, 1.0]);
        assert_eq!(Activation::Relu.apply(&x).to_vec(), vec![0.0, 1.0]);
        assert_eq!(Activation::Identity.apply(&x).to_vec(), x.to_vec());
        assert!(Activation::Identity.apply(&x).shares_storage_with(&x));
        assert!(Activation::Sigmoid.parameters().is_empty());
        assert_eq!(Activation::Tanh.apply(&x).to_vec(), vec![(-1.0f64).tanh(), 1.0f64.tanh()]);
    }
}
