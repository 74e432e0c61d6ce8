//! Strided tensor view over shared storage.
//!
//! ```text
//! Tensor
//! ├── storage: Storage   (Rc<Dense>, shared by every view)
//! ├── shape / strides / offset
//! └── node: Option<NodeId>   (None for leaves)
//! ```

use crate::autodiff::{NodeId, Op, record, with_graph};
use crate::error::TensorError;
use crate::storage::Storage;
use crate::strides::{StridedIndices, cartesian_to_linear, compute_strides, is_contiguous, numel};
use smallvec::smallvec;
use std::fmt;

/// A view of an n-dimensional `f64` array with gradient tracking.
///
/// Cloning a tensor clones the view, never the elements. Views created by
/// [`reshape`](Tensor::reshape), [`permute`](Tensor::permute) and
/// [`transpose`](Tensor::transpose) share storage with their source: writes
/// to values or gradients through one are visible through all of them.
#[derive(Debug, Clone)]
pub struct Tensor {
    storage: Storage,
    shape: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
    node: Option<NodeId>,
}

impl Tensor {
    /// Contiguous leaf over fresh storage. Caller guarantees the length.
    pub(crate) fn from_parts(data: Vec<f64>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(data.len(), numel(&shape));
        Self {
            strides: compute_strides(&shape),
            storage: Storage::from_vec(data),
            shape,
            offset: 0,
            node: None,
        }
    }

    /// New view over the same storage and graph node.
    fn view(&self, shape: Vec<usize>, strides: Vec<usize>, offset: usize) -> Self {
        debug_assert!(offset + numel(&shape) <= self.storage.len() || numel(&shape) == 0);
        Self {
            storage: self.storage.clone(),
            shape,
            strides,
            offset,
            node: self.node,
        }
    }

    pub(crate) fn with_node(mut self, id: NodeId) -> Self {
        self.node = Some(id);
        self
    }

    pub(crate) fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Storage positions of this view in row-major order.
    pub(crate) fn positions(&self) -> StridedIndices<'_> {
        StridedIndices::new(&self.shape, &self.strides, self.offset)
    }

    /// Create a new tensor with the given shape, zero-initialized.
    ///
    /// # Examples
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let t = Tensor::zeros(&[2, 3, 4]);
    /// assert_eq!(t.shape(), &[2, 3, 4]);
    /// assert_eq!(t.len(), 24);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, 0.0)
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, 1.0)
    }

    /// Create a tensor filled with `value`.
    pub fn full(shape: &[usize], value: f64) -> Self {
        Self::from_parts(vec![value; numel(shape)], shape.to_vec())
    }

    /// Single-element tensor of shape `[1]`.
    pub fn scalar(value: f64) -> Self {
        Self::from_parts(vec![value], vec![1])
    }

    /// Create tensor from row-major data and shape.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if data length doesn't match shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// assert_eq!(t.get(&[0, 1]).unwrap(), 2.0);
    /// assert_eq!(t.get(&[1, 0]).unwrap(), 4.0); // row-major: [1,0] is fourth element
    /// ```
    pub fn from_vec(data: Vec<f64>, shape: &[usize]) -> Result<Self, TensorError> {
        let expected = numel(shape);
        if data.len() != expected {
            return Err(TensorError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self::from_parts(data, shape.to_vec()))
    }

    /// 1-D tensor from a flat literal.
    pub fn from_slice(data: &[f64]) -> Self {
        Self::from_parts(data.to_vec(), vec![data.len()])
    }

    /// 2-D tensor from a list of equally long rows.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if a row's length differs from the first.
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let t = Tensor::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
    /// assert_eq!(t.shape(), &[2, 2]);
    /// ```
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, TensorError> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(TensorError::ShapeMismatch {
                    expected: cols,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self::from_parts(data, vec![rows.len(), cols]))
    }

    /// Get the shape of the tensor.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get strides.
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Position of the first viewed element in storage.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Get the rank (number of dimensions).
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get total number of elements in the view.
    #[inline]
    pub fn len(&self) -> usize {
        numel(&self.shape)
    }

    /// Check if tensor is empty (has zero elements).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the strides are the canonical row-major strides.
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        is_contiguous(&self.shape, &self.strides)
    }

    /// Leaf tensors were created by the user, not recorded by an operation.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.node.is_none()
    }

    /// Graph node that produced this tensor (shared by its views).
    #[inline]
    pub fn node_id(&self) -> Option<NodeId> {
        self.node
    }

    /// Pointer to the first viewed element. For identity comparisons only.
    pub fn data_ptr(&self) -> *const f64 {
        self.storage.as_ptr().wrapping_add(self.offset)
    }

    /// Check if this tensor shares storage with another tensor.
    pub fn shares_storage_with(&self, other: &Tensor) -> bool {
        self.storage.shares_storage_with(&other.storage)
    }

    /// Check if this tensor's storage is shared with other tensors or graph nodes.
    pub fn is_view(&self) -> bool {
        self.storage.is_shared()
    }

    fn linear_index(&self, indices: &[usize]) -> Result<usize, TensorError> {
        if indices.len() != self.ndim() {
            return Err(TensorError::WrongNumberOfIndices {
                expected: self.ndim(),
                actual: indices.len(),
            });
        }
        for (&idx, &dim) in indices.iter().zip(self.shape.iter()) {
            if idx >= dim {
                return Err(TensorError::IndexOutOfBounds {
                    index: idx,
                    dim_size: dim,
                });
            }
        }
        Ok(self.offset + cartesian_to_linear(indices, &self.strides))
    }

    /// Get element by cartesian indices.
    ///
    /// # Errors
    ///
    /// Returns error if indices are out of bounds or wrong number of indices.
    pub fn get(&self, indices: &[usize]) -> Result<f64, TensorError> {
        let linear = self.linear_index(indices)?;
        Ok(self.storage.data()[linear])
    }

    /// Set element by cartesian indices.
    ///
    /// The write goes to shared storage and is seen by every view.
    ///
    /// # Errors
    ///
    /// Returns error if indices are out of bounds or wrong number of indices.
    pub fn set(&self, indices: &[usize], value: f64) -> Result<(), TensorError> {
        let linear = self.linear_index(indices)?;
        self.storage.data_mut()[linear] = value;
        Ok(())
    }

    /// Gradient element by cartesian indices.
    pub fn grad_at(&self, indices: &[usize]) -> Result<f64, TensorError> {
        let linear = self.linear_index(indices)?;
        Ok(self.storage.grad()[linear])
    }

    /// Value of a single-element tensor.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::InvalidOperation` unless the tensor has exactly one element.
    pub fn item(&self) -> Result<f64, TensorError> {
        if self.len() != 1 {
            return Err(TensorError::InvalidOperation(format!(
                "item() requires a single-element tensor, got shape {:?}",
                self.shape
            )));
        }
        Ok(self.storage.data()[self.offset])
    }

    /// Values in row-major order of this view.
    pub fn to_vec(&self) -> Vec<f64> {
        let data = self.storage.data();
        self.positions().map(|i| data[i]).collect()
    }

    /// Gradient values in row-major order of this view.
    pub fn grad_to_vec(&self) -> Vec<f64> {
        let grad = self.storage.grad();
        self.positions().map(|i| grad[i]).collect()
    }

    /// Detached contiguous copy of this view's gradient.
    pub fn grad(&self) -> Tensor {
        Self::from_parts(self.grad_to_vec(), self.shape.clone())
    }

    /// Reset this view's gradient to zero.
    ///
    /// Only this tensor's storage is touched; callers zero every parameter
    /// they reuse across backward passes.
    pub fn zero_grad(&self) {
        self.fill_grad(0.0);
    }

    /// Set every gradient position of this view to `value`.
    pub fn fill_grad(&self, value: f64) {
        let mut grad = self.storage.grad_mut();
        for i in self.positions() {
            grad[i] = value;
        }
    }

    /// Add `values` (row-major, one per element) into this view's gradient.
    pub(crate) fn accumulate_grad(&self, values: &[f64]) -> Result<(), TensorError> {
        if values.len() != self.len() {
            return Err(TensorError::ShapeMismatch {
                expected: self.len(),
                actual: values.len(),
            });
        }
        let mut grad = self.storage.grad_mut();
        for (i, &v) in self.positions().zip(values) {
            grad[i] += v;
        }
        Ok(())
    }

    /// In-place update of every viewed value from its gradient.
    ///
    /// Bypasses the graph entirely; this is the optimizer surface.
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let w = Tensor::from_slice(&[1.0, 2.0]);
    /// w.fill_grad(0.5);
    /// w.update_with_grad(|value, grad| *value -= 0.5 * grad);
    /// assert_eq!(w.to_vec(), vec![0.75, 1.75]);
    /// ```
    pub fn update_with_grad(&self, mut f: impl FnMut(&mut f64, f64)) {
        let mut data = self.storage.data_mut();
        let grad = self.storage.grad();
        for i in self.positions() {
            f(&mut data[i], grad[i]);
        }
    }

    /// Raw mutable access to the whole value buffer of the storage.
    pub fn with_data_mut<R>(&self, f: impl FnOnce(&mut [f64]) -> R) -> R {
        f(&mut self.storage.data_mut())
    }

    /// Raw mutable access to the whole gradient buffer of the storage.
    pub fn with_grad_mut<R>(&self, f: impl FnOnce(&mut [f64]) -> R) -> R {
        f(&mut self.storage.grad_mut())
    }

    /// Run `f` over this view's values as a contiguous row-major slice.
    ///
    /// Borrows storage directly when contiguous, otherwise gathers a copy.
    pub(crate) fn with_contiguous_values<R>(&self, f: impl FnOnce(&[f64]) -> R) -> R {
        if self.is_contiguous() {
            let data = self.storage.data();
            f(&data[self.offset..self.offset + self.len()])
        } else {
            log::debug!(
                "materializing view {:?} with strides {:?}",
                self.shape,
                self.strides
            );
            f(&self.to_vec())
        }
    }

    /// Same storage, no graph node.
    pub fn detach(&self) -> Tensor {
        Self {
            node: None,
            ..self.clone()
        }
    }

    /// Return a contiguous tensor with the same values.
    ///
    /// Already contiguous views are returned as-is (same storage, no copy).
    /// Otherwise the elements are copied in row-major order into fresh
    /// storage, and the copy is recorded so gradients flow back to `self`.
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// let tt = t.transpose(0, 1).unwrap().contiguous();
    /// assert!(!tt.shares_storage_with(&t));
    /// assert_eq!(tt.to_vec(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    /// ```
    pub fn contiguous(&self) -> Tensor {
        if self.is_contiguous() {
            return self.clone();
        }
        log::debug!(
            "materializing view {:?} with strides {:?}",
            self.shape,
            self.strides
        );
        let out = Self::from_parts(self.to_vec(), self.shape.clone());
        record(Op::Contiguous, out, smallvec![self.clone()])
    }

    /// Reshape the tensor to a new shape.
    ///
    /// Contiguous tensors are reshaped without copying; others are first
    /// materialized with [`contiguous`](Tensor::contiguous).
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if the element counts differ.
    ///
    /// # Example
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let t = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// let t2 = t.reshape(&[2, 3]).unwrap();
    /// assert_eq!(t2.shape(), &[2, 3]);
    /// assert!(t.shares_storage_with(&t2));
    /// assert!(t.reshape(&[4]).is_err());
    /// ```
    pub fn reshape(&self, new_shape: &[usize]) -> Result<Tensor, TensorError> {
        let expected = self.len();
        let actual = numel(new_shape);
        if expected != actual {
            return Err(TensorError::ShapeMismatch { expected, actual });
        }

        let base = self.contiguous();
        Ok(base.view(new_shape.to_vec(), compute_strides(new_shape), base.offset))
    }

    /// Permute the dimensions of the tensor without copying.
    ///
    /// `perm[i]` gives the source dimension for the i-th dimension of the result.
    ///
    /// # Errors
    ///
    /// Returns error if `perm` is not a valid permutation of `0..ndim`.
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let t = Tensor::zeros(&[2, 3, 4]);
    /// let p = t.permute(&[2, 0, 1]).unwrap();
    /// assert_eq!(p.shape(), &[4, 2, 3]);
    /// assert_eq!(p.strides(), &[1, 12, 4]);
    /// assert_eq!(p.data_ptr(), t.data_ptr());
    /// ```
    pub fn permute(&self, perm: &[usize]) -> Result<Tensor, TensorError> {
        validate_permutation(perm, self.ndim())?;

        let shape = perm.iter().map(|&p| self.shape[p]).collect();
        let strides = perm.iter().map(|&p| self.strides[p]).collect();
        Ok(self.view(shape, strides, self.offset))
    }

    /// Swap two axes without copying.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::InvalidPermutation` if either axis is out of range.
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Tensor, TensorError> {
        let mut perm: Vec<usize> = (0..self.ndim()).collect();
        if dim0 >= perm.len() || dim1 >= perm.len() {
            return Err(TensorError::InvalidPermutation {
                perm: vec![dim0, dim1],
                ndim: self.ndim(),
            });
        }
        perm.swap(dim0, dim1);
        self.permute(&perm)
    }

    /// Operation that produced this tensor, `None` for leaves.
    pub fn op(&self) -> Result<Option<Op>, TensorError> {
        match self.node {
            None => Ok(None),
            Some(id) => with_graph(|g| g.node(id).map(|n| Some(n.op()))),
        }
    }

    /// Tensors this one was computed from, one per operand.
    ///
    /// Views report the parents of the tensor they view. Leaves have none.
    pub fn parents(&self) -> Result<Vec<Tensor>, TensorError> {
        match self.node {
            None => Ok(Vec::new()),
            Some(id) => with_graph(|g| g.node(id).map(|n| n.inputs().to_vec())),
        }
    }
}

/// Validate that perm is a valid permutation of 0..ndim.
fn validate_permutation(perm: &[usize], ndim: usize) -> Result<(), TensorError> {
    let invalid = || TensorError::InvalidPermutation {
        perm: perm.to_vec(),
        ndim,
    };
    if perm.len() != ndim {
        return Err(invalid());
    }

    let mut seen = vec![false; ndim];
    for &p in perm {
        if p >= ndim || seen[p] {
            return Err(invalid());
        }
        seen[p] = true;
    }

    Ok(())
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(shape={:?}, data={:?})", self.shape, self.to_vec())
    }
}
