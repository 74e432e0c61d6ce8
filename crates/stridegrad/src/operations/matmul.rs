//! Rank-2 matrix multiplication.

use crate::autodiff::{Op, record};
use crate::error::TensorError;
use crate::tensor::Tensor;
use smallvec::smallvec;

/// Untracked `(M,K) @ (K,N) -> (M,N)`.
///
/// Non-contiguous operands are gathered first. The loop order is m, k, n so
/// the innermost loop walks both `b` and the output row-wise.
pub(crate) fn matmul_forward(a: &Tensor, b: &Tensor) -> Result<Tensor, TensorError> {
    for t in [a, b] {
        if t.ndim() != 2 {
            return Err(TensorError::RankMismatch {
                expected: 2,
                actual: t.ndim(),
            });
        }
    }

    let (m, k) = (a.shape()[0], a.shape()[1]);
    let n = b.shape()[1];
    if b.shape()[0] != k {
        return Err(TensorError::MatmulMismatch {
            lhs: a.shape().to_vec(),
            rhs: b.shape().to_vec(),
        });
    }

    let mut out = vec![0.0; m * n];
    a.with_contiguous_values(|av| {
        b.with_contiguous_values(|bv| {
            for i in 0..m {
                let row = &mut out[i * n..(i + 1) * n];
                for p in 0..k {
                    let aik = av[i * k + p];
                    for (o, &bkj) in row.iter_mut().zip(&bv[p * n..(p + 1) * n]) {
                        *o += aik * bkj;
                    }
                }
            }
        })
    });

    Ok(Tensor::from_parts(out, vec![m, n]))
}

impl Tensor {
    /// Matrix product of two rank-2 tensors.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::RankMismatch` if either operand is not rank 2,
    /// or `TensorError::MatmulMismatch` if the inner dimensions differ.
    ///
    /// # Example
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// let b = Tensor::from_vec(vec![7.0, 8.0, 9.0, 1.0, 2.0, 3.0], &[3, 2]).unwrap();
    /// let c = a.matmul(&b).unwrap();
    /// assert_eq!(c.to_vec(), vec![31.0, 19.0, 85.0, 55.0]);
    /// ```
    pub fn matmul(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        let out = matmul_forward(self, other)?;
        Ok(record(Op::MatMul, out, smallvec![self.clone(), other.clone()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let a = Tensor::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let eye = Tensor::from_rows(&[[1.0, 0.0], [0.0, 1.0]]).unwrap();
        assert_eq!(a.matmul(&eye).unwrap().to_vec(), a.to_vec());
    }

    #[test]
    fn test_transposed_operand() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        // a @ a^T
        let c = a.matmul(&a.transpose(0, 1).unwrap()).unwrap();
        assert_eq!(c.shape(), &[2, 2]);
        assert_eq!(c.to_vec(), vec![14.0, 32.0, 32.0, 77.0]);
    }

    #[test]
    fn test_inner_dimension_mismatch() {
        let a = Tensor::ones(&[2, 3]);
        let b = Tensor::ones(&[2, 3]);
        assert_eq!(
            a.matmul(&b).unwrap_err(),
            TensorError::MatmulMismatch {
                lhs: vec![2, 3],
                rhs: vec![2, 3]
            }
        );
    }

    #[test]
    fn test_rank_mismatch() {
        let a = Tensor::ones(&[3]);
        let b = Tensor::ones(&[3, 2]);
        assert_eq!(
            a.matmul(&b).unwrap_err(),
            TensorError::RankMismatch {
                expected: 2,
                actual: 1
            }
        );
        assert!(b.matmul(&Tensor::ones(&[2, 1, 1])).is_err());
    }
}
