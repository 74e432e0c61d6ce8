//! Computation graph for reverse-mode automatic differentiation.

use crate::error::TensorError;
use crate::tensor::Tensor;
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::fmt::Debug;

/// Unique identifier for a node in the computation graph.
///
/// Carries the epoch of the graph it was created in, so ids that survive a
/// [`clear_graph`] are detected instead of resolving to an unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    epoch: u64,
}

impl NodeId {
    /// Get the internal index.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Operation that produced a graph node.
///
/// Carries only the scalar parameters needed by the backward rule; operands
/// are stored on the [`Node`] itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    MatMul,
    SumAll,
    SumAxis { axis: usize },
    Relu,
    Sigmoid,
    Tanh,
    /// Materializing copy of a non-contiguous view.
    Contiguous,
}

impl Op {
    /// Number of operands the operation consumes.
    pub fn arity(&self) -> usize {
        match self {
            Op::Add | Op::Sub | Op::Mul | Op::MatMul => 2,
            Op::SumAll
            | Op::SumAxis { .. }
            | Op::Relu
            | Op::Sigmoid
            | Op::Tanh
            | Op::Contiguous => 1,
        }
    }
}

/// Operand list of a node. Every operation has at most two.
pub type Inputs = SmallVec<[Tensor; 2]>;

/// A node in the computation graph.
#[derive(Debug, Clone)]
pub struct Node {
    op: Op,
    /// Output view, without its own node id.
    output: Tensor,
    /// Parent tensors, one per operand, in operand order.
    inputs: Inputs,
}

impl Node {
    pub fn op(&self) -> Op {
        self.op
    }

    pub fn output(&self) -> &Tensor {
        &self.output
    }

    pub fn inputs(&self) -> &[Tensor] {
        &self.inputs
    }

    /// Node ids of the parents that are themselves graph nodes.
    ///
    /// Leaf parents have no node and are skipped.
    pub fn parent_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.inputs.iter().filter_map(Tensor::node_id)
    }
}

/// Thread-local computation graph.
///
/// An arena of nodes indexed by [`NodeId`]. Parent edges point to nodes
/// created strictly earlier, so the graph is acyclic by construction.
pub struct ComputationGraph {
    nodes: Vec<Node>,
    epoch: u64,
}

impl ComputationGraph {
    /// Create a new empty computation graph.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            epoch: 0,
        }
    }

    /// Append a node and return its id.
    pub fn push(&mut self, op: Op, output: Tensor, inputs: Inputs) -> NodeId {
        debug_assert_eq!(op.arity(), inputs.len());
        let id = NodeId {
            index: self.nodes.len(),
            epoch: self.epoch,
        };
        self.nodes.push(Node { op, output, inputs });
        id
    }

    /// Get node by ID.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::StaleNode` if the id predates the last clear.
    pub fn node(&self, id: NodeId) -> Result<&Node, TensorError> {
        if id.epoch != self.epoch {
            return Err(TensorError::StaleNode { index: id.index });
        }
        self.nodes
            .get(id.index)
            .ok_or(TensorError::StaleNode { index: id.index })
    }

    /// Get all nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Drop every node. Ids handed out before this call become stale.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.epoch += 1;
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for ComputationGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ComputationGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputationGraph")
            .field("num_nodes", &self.nodes.len())
            .field("epoch", &self.epoch)
            .finish()
    }
}

thread_local! {
    static GRAPH: RefCell<ComputationGraph> = RefCell::new(ComputationGraph::new());
    static GRAD_ENABLED: Cell<bool> = const { Cell::new(true) };
}

/// Access the thread-local computation graph.
///
/// The closure must not call back into graph-recording operations.
pub fn with_graph<R>(f: impl FnOnce(&mut ComputationGraph) -> R) -> R {
    GRAPH.with(|g| f(&mut g.borrow_mut()))
}

/// Clear the thread-local computation graph.
///
/// Call between training steps; leaf tensors are unaffected, intermediate
/// tensors still alive afterwards can no longer be differentiated through.
pub fn clear_graph() {
    with_graph(|g| g.clear());
}

/// Whether operations on this thread currently record graph nodes.
pub fn is_grad_enabled() -> bool {
    GRAD_ENABLED.with(Cell::get)
}

/// Enable or disable graph recording on this thread. Returns the previous mode.
pub fn set_grad_enabled(enabled: bool) -> bool {
    GRAD_ENABLED.with(|g| g.replace(enabled))
}

/// Run `f` with graph recording disabled, restoring the previous mode after.
///
/// # Example
///
/// ```
/// use stridegrad::Tensor;
/// use stridegrad::autodiff::no_grad;
///
/// let a = Tensor::ones(&[2]);
/// let b = no_grad(|| a.add(&a)).unwrap();
/// assert!(b.is_leaf());
/// ```
pub fn no_grad<R>(f: impl FnOnce() -> R) -> R {
    struct Restore(bool);

    impl Drop for Restore {
        fn drop(&mut self) {
            set_grad_enabled(self.0);
        }
    }

    let _restore = Restore(set_grad_enabled(false));
    f()
}

/// Attach `output` to the graph as the result of `op` over `inputs`.
///
/// With grad mode disabled the output is returned untracked.
pub(crate) fn record(op: Op, output: Tensor, inputs: Inputs) -> Tensor {
    if !is_grad_enabled() {
        return output;
    }
    let id = with_graph(|g| g.push(op, output.clone(), inputs));
    output.with_node(id)
}
