//! Activation functions recorded in the graph.

use crate::autodiff::{Op, record};
use crate::tensor::Tensor;
use smallvec::smallvec;

/// Logistic function `1 / (1 + e^-x)`.
#[inline]
pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Tensor {
    /// Element-wise `max(0, x)`.
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let t = Tensor::from_slice(&[-1.0, 0.0, 2.0]);
    /// assert_eq!(t.relu().to_vec(), vec![0.0, 0.0, 2.0]);
    /// ```
    pub fn relu(&self) -> Tensor {
        let out = self.map(|x| x.max(0.0));
        record(Op::Relu, out, smallvec![self.clone()])
    }

    /// Element-wise logistic sigmoid.
    pub fn sigmoid(&self) -> Tensor {
        let out = self.map(sigmoid);
        record(Op::Sigmoid, out, smallvec![self.clone()])
    }

    /// Element-wise hyperbolic tangent.
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let t = Tensor::from_slice(&[0.0, 1.0]).tanh();
    /// assert_eq!(t.to_vec()[0], 0.0);
    /// assert!((t.to_vec()[1] - 1.0_f64.tanh()).abs() < 1e-15);
    /// ```
    pub fn tanh(&self) -> Tensor {
        let out = self.map(f64::tanh);
        record(Op::Tanh, out, smallvec![self.clone()])
    }
}
