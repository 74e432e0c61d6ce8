//! Stride computation and shape utilities.
//!
//! Uses row-major (C) order: the rightmost dimension varies fastest.

use crate::error::TensorError;

/// Number of elements described by a shape.
///
/// The empty shape describes a single scalar element.
#[inline]
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Compute row-major strides from shape.
///
/// For shape [d0, d1, d2], returns strides [d1*d2, d2, 1].
///
/// # Examples
///
/// ```
/// use stridegrad::strides::compute_strides;
///
/// assert_eq!(compute_strides(&[3, 4, 5]), vec![20, 5, 1]);
/// assert_eq!(compute_strides(&[2, 3]), vec![3, 1]);
/// assert_eq!(compute_strides(&[5]), vec![1]);
/// assert_eq!(compute_strides(&[]), Vec::<usize>::new());
/// ```
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![0; shape.len()];
    let mut stride = 1;

    for (slot, &dim) in strides.iter_mut().zip(shape.iter()).rev() {
        *slot = stride;
        stride *= dim;
    }

    strides
}

/// Check whether `strides` are the canonical row-major strides for `shape`.
///
/// Scans right to left, verifying the running product.
///
/// ```
/// use stridegrad::strides::is_contiguous;
///
/// assert!(is_contiguous(&[2, 3], &[3, 1]));
/// assert!(!is_contiguous(&[3, 2], &[1, 3]));
/// ```
pub fn is_contiguous(shape: &[usize], strides: &[usize]) -> bool {
    if shape.len() != strides.len() {
        return false;
    }

    let mut expected = 1;
    for (&dim, &stride) in shape.iter().zip(strides.iter()).rev() {
        if stride != expected {
            return false;
        }
        expected *= dim;
    }
    true
}

/// Convert cartesian indices to a linear offset using the given strides.
#[inline]
pub fn cartesian_to_linear(indices: &[usize], strides: &[usize]) -> usize {
    indices
        .iter()
        .zip(strides.iter())
        .map(|(&idx, &stride)| idx * stride)
        .sum()
}

/// Broadcast two shapes into the shape of their element-wise result.
///
/// Shapes are right-aligned. For each aligned pair the result is the common
/// size, or the non-1 size when one side is 1. Unaligned leading dimensions
/// are copied through.
///
/// # Errors
///
/// Returns `TensorError::BroadcastMismatch` if an aligned pair differs and
/// neither side is 1.
///
/// # Examples
///
/// ```
/// use stridegrad::strides::broadcast_shapes;
///
/// assert_eq!(broadcast_shapes(&[2, 3], &[1, 3]).unwrap(), vec![2, 3]);
/// assert_eq!(broadcast_shapes(&[4], &[2, 3, 4]).unwrap(), vec![2, 3, 4]);
/// assert!(broadcast_shapes(&[2, 3], &[2, 4]).is_err());
/// ```
pub fn broadcast_shapes(lhs: &[usize], rhs: &[usize]) -> Result<Vec<usize>, TensorError> {
    let ndim = lhs.len().max(rhs.len());
    let mut out = vec![0; ndim];

    for i in 0..ndim {
        let d1 = if i < lhs.len() { lhs[lhs.len() - 1 - i] } else { 1 };
        let d2 = if i < rhs.len() { rhs[rhs.len() - 1 - i] } else { 1 };

        out[ndim - 1 - i] = if d1 == d2 || d2 == 1 {
            d1
        } else if d1 == 1 {
            d2
        } else {
            return Err(TensorError::BroadcastMismatch {
                lhs: lhs.to_vec(),
                rhs: rhs.to_vec(),
            });
        };
    }

    Ok(out)
}

/// Strides that read an operand of `shape`/`strides` as if it had `out_shape`.
///
/// Missing leading dimensions and size-1 dimensions get stride 0, so every
/// output coordinate maps to coordinate 0 along those axes.
pub fn broadcast_strides(shape: &[usize], strides: &[usize], out_shape: &[usize]) -> Vec<usize> {
    debug_assert!(out_shape.len() >= shape.len());
    let lead = out_shape.len() - shape.len();
    let mut out = vec![0; out_shape.len()];

    for (i, (&dim, &stride)) in shape.iter().zip(strides.iter()).enumerate() {
        out[lead + i] = if dim == 1 { 0 } else { stride };
    }

    out
}

/// Iterator over the storage positions of a strided view in row-major order.
///
/// Yields `offset + Σ coord[i] * strides[i]` for every coordinate of `shape`,
/// rightmost coordinate varying fastest.
#[derive(Debug, Clone)]
pub struct StridedIndices<'a> {
    shape: &'a [usize],
    strides: &'a [usize],
    coord: Vec<usize>,
    position: usize,
    remaining: usize,
}

impl<'a> StridedIndices<'a> {
    /// Walk `shape` with `strides`, starting at storage position `offset`.
    pub fn new(shape: &'a [usize], strides: &'a [usize], offset: usize) -> Self {
        debug_assert_eq!(shape.len(), strides.len());
        Self {
            shape,
            strides,
            coord: vec![0; shape.len()],
            position: offset,
            remaining: numel(shape),
        }
    }
}

impl Iterator for StridedIndices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.position;
        self.remaining -= 1;

        if self.remaining > 0 {
            for d in (0..self.shape.len()).rev() {
                self.coord[d] += 1;
                self.position += self.strides[d];
                if self.coord[d] < self.shape[d] {
                    break;
                }
                self.position -= self.strides[d] * self.shape[d];
                self.coord[d] = 0;
            }
        }

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for StridedIndices<'_> {}
