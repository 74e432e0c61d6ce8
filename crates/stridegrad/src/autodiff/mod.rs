//! Reverse-mode automatic differentiation.
//!
//! Operations record themselves in a thread-local computation graph; calling
//! [`Tensor::backward`](crate::Tensor::backward) on a result walks that graph
//! in reverse topological order and accumulates gradients into the storage of
//! every tensor it reaches.
//!
//! # Architecture
//!
//! ```text
//! Tensor { node: Some(id) }  ──refers to──►  ComputationGraph (thread_local)
//!        │                                      │
//!        ▼                                      ▼
//!   Storage (data + grad)                 Vec<Node { op, output, inputs }>
//!                                              │
//!                                              ▼
//!                                   vjp::propagate (match on Op)
//! ```
//!
//! # Example
//!
//! ```
//! use stridegrad::Tensor;
//! use stridegrad::autodiff::clear_graph;
//!
//! clear_graph();
//!
//! let w = Tensor::from_slice(&[1.0, -2.0, 3.0]);
//! let loss = w.mul(&w).unwrap().sum();
//! loss.backward().unwrap();
//!
//! // d/dw sum(w^2) = 2w
//! assert_eq!(w.grad_to_vec(), vec![2.0, -4.0, 6.0]);
//! ```
//!
//! # Design Notes
//!
//! - Thread-local graph (no `Arc`, uses `Rc`); tensors are `!Send`.
//! - Gradients live next to values in the shared storage, so views of one
//!   buffer accumulate into the same gradient.
//! - Nodes stay alive until [`clear_graph`]; call it between training steps.

mod backward;
mod graph;
mod vjp;

pub use graph::{
    ComputationGraph, Inputs, Node, NodeId, Op, clear_graph, is_grad_enabled, no_grad,
    set_grad_enabled, with_graph,
};

pub(crate) use graph::record;
