//! stridegrad - strided tensors with reverse-mode automatic differentiation
//!
//! This crate provides n-dimensional `f64` tensors as strided views over
//! shared, reference-counted storage, with a thread-local computation graph
//! for gradients.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Tensor API (tensor, operations)
//!     → views: reshape, permute, transpose (zero-copy)
//!     → ops: add, sub, mul (broadcasting), matmul, sum, sum_axis, relu, sigmoid
//!
//! Level 2: Autodiff (autodiff module)
//!     → every op records a node in the thread-local graph
//!     → backward(): topological sort, reverse sweep, gradient accumulation
//!
//! Level 3: Storage (storage module)
//!     → Rc<Dense> with value and gradient buffers shared by every view
//! ```
//!
//! # Example
//!
//! ```
//! use stridegrad::Tensor;
//!
//! // Row-major 2x3 and 3x2 matrices
//! let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
//! let b = Tensor::from_vec(vec![7.0, 8.0, 9.0, 1.0, 2.0, 3.0], &[3, 2]).unwrap();
//!
//! let c = a.matmul(&b).unwrap();
//! assert_eq!(c.to_vec(), vec![31.0, 19.0, 85.0, 55.0]);
//!
//! c.sum().backward().unwrap();
//! assert_eq!(a.grad_at(&[0, 0]).unwrap(), 15.0);
//!
//! // Views share storage with their source
//! let at = a.transpose(0, 1).unwrap();
//! assert_eq!(at.data_ptr(), a.data_ptr());
//! ```

pub mod autodiff;
pub mod error;
#[cfg(feature = "nn")]
pub mod nn;
mod operations;
mod random;
pub mod storage;
pub mod strides;
pub mod tensor;

pub use autodiff::{NodeId, Op, clear_graph, no_grad};
pub use error::TensorError;
pub use storage::{Dense, Storage};
pub use tensor::Tensor;
