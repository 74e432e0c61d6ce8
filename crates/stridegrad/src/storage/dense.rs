//! Dense storage for tensor data and gradients.

use std::cell::{Ref, RefCell, RefMut};

/// Dense storage - a flat row-major value buffer plus an equal-length
/// gradient buffer.
///
/// Both buffers sit behind `RefCell` so that every view sharing this storage
/// can read and write them without owning it exclusively.
#[derive(Debug)]
pub struct Dense {
    data: RefCell<Vec<f64>>,
    grad: RefCell<Vec<f64>>,
}

impl Dense {
    /// Create dense storage with given length, zero-initialized.
    pub fn zeros(len: usize) -> Self {
        Self::from_vec(vec![0.0; len])
    }

    /// Create dense storage from existing vector (takes ownership).
    ///
    /// The gradient buffer starts at zero.
    pub fn from_vec(data: Vec<f64>) -> Self {
        let grad = vec![0.0; data.len()];
        Self {
            data: RefCell::new(data),
            grad: RefCell::new(grad),
        }
    }

    /// Length of storage.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    /// Check if storage is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the value buffer.
    #[inline]
    pub fn data(&self) -> Ref<'_, Vec<f64>> {
        self.data.borrow()
    }

    /// Mutably borrow the value buffer.
    #[inline]
    pub fn data_mut(&self) -> RefMut<'_, Vec<f64>> {
        self.data.borrow_mut()
    }

    /// Borrow the gradient buffer.
    #[inline]
    pub fn grad(&self) -> Ref<'_, Vec<f64>> {
        self.grad.borrow()
    }

    /// Mutably borrow the gradient buffer.
    #[inline]
    pub fn grad_mut(&self) -> RefMut<'_, Vec<f64>> {
        self.grad.borrow_mut()
    }

    /// Raw pointer to the first value (identity comparisons only).
    #[inline]
    pub fn as_ptr(&self) -> *const f64 {
        self.data.borrow().as_ptr()
    }
}
