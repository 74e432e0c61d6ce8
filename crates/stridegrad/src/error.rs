//! Error types for stridegrad.

use thiserror::Error;

/// Errors that can occur in tensor operations.
///
/// Every variant is recoverable: the failing operation produces no output
/// tensor and records nothing in the computation graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TensorError {
    /// Element count does not match the requested shape.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Two shapes cannot be broadcast against each other.
    #[error("cannot broadcast shapes {lhs:?} and {rhs:?}")]
    BroadcastMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    /// Inner dimensions of a matrix product disagree.
    #[error("matmul shape mismatch: {lhs:?} @ {rhs:?}")]
    MatmulMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    /// Operation requires specific tensor rank.
    #[error("expected tensor of rank {expected}, got rank {actual}")]
    RankMismatch { expected: usize, actual: usize },

    /// Invalid permutation.
    #[error("invalid permutation {perm:?} for tensor with {ndim} dimensions")]
    InvalidPermutation { perm: Vec<usize>, ndim: usize },

    /// Wrong number of indices provided.
    #[error("wrong number of indices: expected {expected}, got {actual}")]
    WrongNumberOfIndices { expected: usize, actual: usize },

    /// Index out of bounds.
    #[error("index out of bounds: index {index} is out of range for dimension {dim_size}")]
    IndexOutOfBounds { index: usize, dim_size: usize },

    /// Reduction axis does not exist.
    #[error("axis {axis} out of range for tensor with {ndim} dimensions")]
    AxisOutOfRange { axis: usize, ndim: usize },

    /// Tensor refers to a graph node discarded by `clear_graph`.
    #[error("graph node {index} was discarded by clear_graph()")]
    StaleNode { index: usize },

    /// Any other misuse of the API.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}
