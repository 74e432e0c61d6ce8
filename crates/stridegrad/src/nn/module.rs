//! The `Module` trait.

use crate::error::TensorError;
use crate::tensor::Tensor;

/// A computation unit with (possibly zero) trainable parameters.
pub trait Module {
    /// Apply the module to a batch `x`, recording the computation.
    fn forward(&self, x: &Tensor) -> Result<Tensor, TensorError>;

    /// Trainable parameters. The returned tensors share storage with the
    /// module, so updating them updates the module.
    fn parameters(&self) -> Vec<Tensor>;

    /// Reset the gradient of every parameter.
    fn zero_grad(&self) {
        for p in self.parameters() {
            p.zero_grad();
        }
    }
}
