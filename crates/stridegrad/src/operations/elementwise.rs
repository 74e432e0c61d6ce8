//! Broadcasting element-wise operations.

use crate::autodiff::{Op, record};
use crate::error::TensorError;
use crate::strides::{StridedIndices, broadcast_shapes, broadcast_strides};
use crate::tensor::Tensor;
use smallvec::smallvec;
use std::ops;

/// Apply `f` pairwise over the broadcast of `lhs` and `rhs`.
///
/// Operands are read in place through stride-0 broadcast strides; only the
/// output is allocated.
pub(crate) fn broadcast_binary(
    lhs: &Tensor,
    rhs: &Tensor,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Tensor, TensorError> {
    let out_shape = broadcast_shapes(lhs.shape(), rhs.shape())?;
    let lhs_strides = broadcast_strides(lhs.shape(), lhs.strides(), &out_shape);
    let rhs_strides = broadcast_strides(rhs.shape(), rhs.strides(), &out_shape);

    let data = {
        let l = lhs.storage().data();
        let r = rhs.storage().data();
        StridedIndices::new(&out_shape, &lhs_strides, lhs.offset())
            .zip(StridedIndices::new(&out_shape, &rhs_strides, rhs.offset()))
            .map(|(i, j)| f(l[i], r[j]))
            .collect()
    };

    Ok(Tensor::from_parts(data, out_shape))
}

impl Tensor {
    /// Broadcasting element-wise sum.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::BroadcastMismatch` if the shapes are incompatible.
    ///
    /// # Example
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// let b = Tensor::from_vec(vec![10.0, 20.0, 30.0], &[1, 3]).unwrap();
    /// let c = a.add(&b).unwrap();
    /// assert_eq!(c.to_vec(), vec![11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
    /// ```
    pub fn add(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        let out = broadcast_binary(self, other, |a, b| a + b)?;
        Ok(record(Op::Add, out, smallvec![self.clone(), other.clone()]))
    }

    /// Broadcasting element-wise difference.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::BroadcastMismatch` if the shapes are incompatible.
    pub fn sub(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        let out = broadcast_binary(self, other, |a, b| a - b)?;
        Ok(record(Op::Sub, out, smallvec![self.clone(), other.clone()]))
    }

    /// Broadcasting element-wise product.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::BroadcastMismatch` if the shapes are incompatible.
    pub fn mul(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        let out = broadcast_binary(self, other, |a, b| a * b)?;
        Ok(record(Op::Mul, out, smallvec![self.clone(), other.clone()]))
    }

    /// Tracked negation, recorded as `0 - self`.
    pub fn neg(&self) -> Tensor {
        let out = self.map(|x| -x);
        let zeros = Tensor::zeros(self.shape());
        record(Op::Sub, out, smallvec![zeros, self.clone()])
    }

    /// Apply `f` to every element. Not tracked.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Tensor {
        let data = self.to_vec().into_iter().map(f).collect();
        Tensor::from_parts(data, self.shape().to_vec())
    }

    /// Multiply every element by `alpha`. Not tracked.
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let t = Tensor::from_slice(&[1.0, 2.0, 3.0]);
    /// assert_eq!(t.scale(2.0).to_vec(), vec![2.0, 4.0, 6.0]);
    /// ```
    pub fn scale(&self, alpha: f64) -> Tensor {
        self.map(|x| x * alpha)
    }

    /// Divide every element by `divisor`. Not tracked.
    pub fn div_scalar(&self, divisor: f64) -> Tensor {
        self.map(|x| x / divisor)
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident) => {
        impl ops::$trait<&Tensor> for &Tensor {
            type Output = Result<Tensor, TensorError>;

            fn $method(self, rhs: &Tensor) -> Self::Output {
                Tensor::$method(self, rhs)
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);

impl ops::Neg for &Tensor {
    type Output = Tensor;

    fn neg(self) -> Tensor {
        Tensor::neg(self)
    }
}
