//! Storage types for tensor data.
//!
//! ```text
//! Tensor (view: shape, strides, offset)  ──┐
//! Tensor (view: permuted)                ──┼──► Storage = Rc<Dense>
//! Tensor (view: reshaped)                ──┘        ├── data: Vec<f64>
//!                                                   └── grad: Vec<f64>
//! ```
//!
//! Storage is always a flat vector; shape/strides come from the Tensor view.
//! Writes through any view are immediately visible through every other view
//! of the same storage. There is no copy-on-write.

mod dense;

use std::cell::{Ref, RefMut};
use std::rc::Rc;

pub use dense::Dense;

/// Reference-counted handle to a [`Dense`] buffer pair.
///
/// Cloning the handle never copies elements. The buffer lives as long as
/// the longest-lived view or graph node holding a handle.
#[derive(Debug, Clone)]
pub struct Storage(Rc<Dense>);

impl Storage {
    /// Allocate zero-initialized storage.
    pub fn zeros(len: usize) -> Self {
        Self(Rc::new(Dense::zeros(len)))
    }

    /// Wrap an existing value vector.
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self(Rc::new(Dense::from_vec(data)))
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if storage is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn data(&self) -> Ref<'_, Vec<f64>> {
        self.0.data()
    }

    #[inline]
    pub fn data_mut(&self) -> RefMut<'_, Vec<f64>> {
        self.0.data_mut()
    }

    #[inline]
    pub fn grad(&self) -> Ref<'_, Vec<f64>> {
        self.0.grad()
    }

    #[inline]
    pub fn grad_mut(&self) -> RefMut<'_, Vec<f64>> {
        self.0.grad_mut()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const f64 {
        self.0.as_ptr()
    }

    /// Check if two handles point to the same buffer.
    #[inline]
    pub fn shares_storage_with(&self, other: &Storage) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Check if more than one handle refers to this buffer.
    #[inline]
    pub fn is_shared(&self) -> bool {
        Rc::strong_count(&self.0) > 1
    }
}
