//! Tensor operations.
//!
//! Every tracked operation follows the same two steps:
//!
//! ```text
//! forward kernel (untracked, allocates a fresh contiguous output)
//!     → record(op, output, operands)   # attaches a graph node unless grad mode is off
//! ```
//!
//! Backward rules in [`crate::autodiff`] call the kernels directly.

mod activation;
mod elementwise;
mod matmul;
mod reduce;

pub(crate) use elementwise::broadcast_binary;
pub(crate) use matmul::matmul_forward;
pub(crate) use reduce::unbroadcast;
