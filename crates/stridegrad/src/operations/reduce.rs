//! Sum reductions and the broadcast/unbroadcast pair used by backward rules.

use crate::autodiff::{Op, record};
use crate::error::TensorError;
use crate::strides::{StridedIndices, broadcast_shapes, broadcast_strides, compute_strides};
use crate::tensor::Tensor;
use smallvec::smallvec;

/// Untracked sum along `axis`.
///
/// The output shape is the input shape with `axis` removed, or `[1]` when
/// the input is 1-D. Each input position is projected onto the output by
/// giving the summed axis stride 0, then scatter-added.
pub(crate) fn sum_axis_forward(t: &Tensor, axis: usize) -> Result<Tensor, TensorError> {
    if axis >= t.ndim() {
        return Err(TensorError::AxisOutOfRange {
            axis,
            ndim: t.ndim(),
        });
    }

    let mut out_shape = t.shape().to_vec();
    out_shape.remove(axis);
    let mut projection = compute_strides(&out_shape);
    projection.insert(axis, 0);
    if out_shape.is_empty() {
        out_shape.push(1);
    }

    let mut out = vec![0.0; out_shape.iter().product()];
    {
        let data = t.storage().data();
        for (src, dst) in t.positions().zip(StridedIndices::new(t.shape(), &projection, 0)) {
            out[dst] += data[src];
        }
    }

    Ok(Tensor::from_parts(out, out_shape))
}

/// Reduce a broadcast-shaped gradient back to `target` by summation.
///
/// Extra leading axes are summed away first; then every axis where the
/// target has size 1 but the gradient does not is summed and kept as 1.
/// A size-1 axis broadcast against a 0-length axis reduces to zeros.
pub(crate) fn unbroadcast(grad: Tensor, target: &[usize]) -> Result<Tensor, TensorError> {
    let mut out = grad;

    while out.ndim() > target.len().max(1) {
        out = sum_axis_forward(&out, 0)?;
    }

    if target.is_empty() {
        let total = out.with_contiguous_values(|v| v.iter().sum());
        return Ok(Tensor::from_parts(vec![total], Vec::new()));
    }

    for (i, &dim) in target.iter().enumerate() {
        if dim == 1 && out.shape()[i] != 1 {
            let mut kept = out.shape().to_vec();
            kept[i] = 1;
            out = sum_axis_forward(&out, i)?.reshape(&kept)?;
        }
    }

    Ok(out)
}

impl Tensor {
    /// Sum of all elements as a single-element tensor of shape `[1]`.
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let t = Tensor::from_slice(&[1.0, 2.0, 3.5]);
    /// assert_eq!(t.sum().item().unwrap(), 6.5);
    /// ```
    pub fn sum(&self) -> Tensor {
        let total = self.with_contiguous_values(|v| v.iter().sum());
        let out = Tensor::from_parts(vec![total], vec![1]);
        record(Op::SumAll, out, smallvec![self.clone()])
    }

    /// Sum along `axis`, removing it.
    ///
    /// A 1-D input reduces to shape `[1]`.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::AxisOutOfRange` if `axis >= ndim`.
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// assert_eq!(t.sum_axis(0).unwrap().to_vec(), vec![5.0, 7.0, 9.0]);
    /// assert_eq!(t.sum_axis(1).unwrap().to_vec(), vec![6.0, 15.0]);
    /// assert!(t.sum_axis(2).is_err());
    /// ```
    pub fn sum_axis(&self, axis: usize) -> Result<Tensor, TensorError> {
        let out = sum_axis_forward(self, axis)?;
        Ok(record(Op::SumAxis { axis }, out, smallvec![self.clone()]))
    }

    /// Sum along `axis`, keeping it with size 1.
    ///
    /// The result broadcasts back against `self`.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::AxisOutOfRange` if `axis >= ndim`.
    pub fn sum_axis_keepdim(&self, axis: usize) -> Result<Tensor, TensorError> {
        let summed = self.sum_axis(axis)?;
        let mut kept = self.shape().to_vec();
        kept[axis] = 1;
        summed.reshape(&kept)
    }

    /// Materialize this tensor broadcast to `shape`. Not tracked.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::BroadcastMismatch` if `self` does not broadcast to `shape`.
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Tensor, TensorError> {
        let mismatch = || TensorError::BroadcastMismatch {
            lhs: self.shape().to_vec(),
            rhs: shape.to_vec(),
        };
        if broadcast_shapes(self.shape(), shape).map_err(|_| mismatch())? != shape {
            return Err(mismatch());
        }

        let strides = broadcast_strides(self.shape(), self.strides(), shape);
        let data = {
            let values = self.storage().data();
            StridedIndices::new(shape, &strides, self.offset())
                .map(|i| values[i])
                .collect()
        };
        Ok(Tensor::from_parts(data, shape.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tensor {
        Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap()
    }

    #[test]
    fn test_unbroadcast_empty_axis() {
        let g = unbroadcast(Tensor::zeros(&[2, 0]), &[2, 1]).unwrap();
        assert_eq!(g.shape(), &[2, 1]);
        assert_eq!(g.to_vec(), vec![0.0, 0.0]);

        let g = unbroadcast(Tensor::zeros(&[3, 0]), &[1]).unwrap();
        assert_eq!(g.shape(), &[1]);
        assert_eq!(g.to_vec(), vec![0.0]);
    }

    #[test]
    fn test_sum_all_transposed() {
        let t = sample().transpose(0, 1).unwrap();
        assert_eq!(t.sum().item().unwrap(), 21.0);
        assert_eq!(t.sum().shape(), &[1]);
    }

    #[test]
    fn test_sum_axis_shapes() {
        let t = sample();
        assert_eq!(t.sum_axis(0).unwrap().shape(), &[3]);
        assert_eq!(t.sum_axis(1).unwrap().shape(), &[2]);

        let v = Tensor::from_slice(&[1.0, 2.0, 3.0]);
        let s = v.sum_axis(0).unwrap();
        assert_eq!(s.shape(), &[1]);
        assert_eq!(s.item().unwrap(), 6.0);
    }

    #[test]
    fn test_sum_axis_3d_middle() {
        let t = Tensor::from_vec((0..24).map(f64::from).collect(), &[2, 3, 4]).unwrap();
        let s = t.sum_axis(1).unwrap();
        assert_eq!(s.shape(), &[2, 4]);
        // s[0, 0] = 0 + 4 + 8
        assert_eq!(s.get(&[0, 0]).unwrap(), 12.0);
        // s[1, 3] = 15 + 19 + 23
        assert_eq!(s.get(&[1, 3]).unwrap(), 57.0);
    }

    #[test]
    fn test_sum_axis_out_of_range() {
        assert_eq!(
            sample().sum_axis(2).unwrap_err(),
            TensorError::AxisOutOfRange { axis: 2, ndim: 2 }
        );
    }

    #[test]
    fn test_keepdim() {
        let t = sample();
        let rows = t.sum_axis_keepdim(0).unwrap();
        let cols = t.sum_axis_keepdim(1).unwrap();
        assert_eq!(rows.shape(), &[1, 3]);
        assert_eq!(cols.shape(), &[2, 1]);
        assert_eq!(
            rows.sum_axis_keepdim(1).unwrap().item().unwrap(),
            t.sum().item().unwrap()
        );
    }

    #[test]
    fn test_unbroadcast_leading_and_unit_axes() {
        let g = Tensor::ones(&[4, 2, 3]);

        let row = unbroadcast(g.clone(), &[1, 3]).unwrap();
        assert_eq!(row.shape(), &[1, 3]);
        assert_eq!(row.to_vec(), vec![8.0, 8.0, 8.0]);

        let vec3 = unbroadcast(g.clone(), &[3]).unwrap();
        assert_eq!(vec3.shape(), &[3]);
        assert_eq!(vec3.to_vec(), vec![8.0, 8.0, 8.0]);

        let scalar = unbroadcast(g.clone(), &[]).unwrap();
        assert_eq!(scalar.ndim(), 0);
        assert_eq!(scalar.item().unwrap(), 24.0);

        let same = unbroadcast(g, &[4, 2, 3]).unwrap();
        assert_eq!(same.shape(), &[4, 2, 3]);
    }

    #[test]
    fn test_unbroadcast_to_single_element() {
        let g = Tensor::ones(&[2, 3]);
        let out = unbroadcast(g, &[1]).unwrap();
        assert_eq!(out.shape(), &[1]);
        assert_eq!(out.item().unwrap(), 6.0);
    }

    #[test]
    fn test_broadcast_to() {
        let row = Tensor::from_vec(vec![1.0, 2.0], &[1, 2]).unwrap();
        let b = row.broadcast_to(&[3, 2]).unwrap();
        assert_eq!(b.to_vec(), vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
        assert!(row.broadcast_to(&[3, 3]).is_err());
        // broadcasting would need to grow the target
        assert!(Tensor::ones(&[2, 3]).broadcast_to(&[3]).is_err());
    }
}
