//! Loss functions.

use crate::error::TensorError;
use crate::tensor::Tensor;

/// Mean squared error, `sum((pred - target)^2) / n`, as a tracked `[1]` tensor.
///
/// # Errors
///
/// Returns `TensorError::ShapeMismatch` if the shapes differ.
///
/// ```
/// use stridegrad::Tensor;
/// use stridegrad::nn::loss::mse;
///
/// let pred = Tensor::from_slice(&[1.0, 2.0]);
/// let target = Tensor::from_slice(&[0.0, 4.0]);
/// assert_eq!(mse(&pred, &target).unwrap().item().unwrap(), 2.5);
/// ```
pub fn mse(pred: &Tensor, target: &Tensor) -> Result<Tensor, TensorError> {
    if pred.shape() != target.shape() {
        return Err(TensorError::ShapeMismatch {
            expected: target.len(),
            actual: pred.len(),
        });
    }
    let diff = pred.sub(target)?;
    let n = pred.len().max(1) as f64;
    diff.mul(&diff)?.sum().mul(&Tensor::scalar(1.0 / n))
}
