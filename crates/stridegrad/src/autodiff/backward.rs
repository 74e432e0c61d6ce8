//! Backward pass execution for reverse-mode automatic differentiation.

use super::graph::{ComputationGraph, Node, NodeId, no_grad, with_graph};
use super::vjp;
use crate::error::TensorError;
use crate::tensor::Tensor;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Nodes reachable from `root`, in topological order (parents first).
///
/// Uses petgraph for a proper topological sort, so a node consumed by
/// several downstream ops is emitted once, after all of them are known.
fn reachable_in_order(graph: &ComputationGraph, root: NodeId) -> Result<Vec<Node>, TensorError> {
    let mut dag: DiGraph<NodeId, ()> = DiGraph::new();
    let mut index: HashMap<NodeId, NodeIndex> = HashMap::new();
    let mut stack = vec![root];
    index.insert(root, dag.add_node(root));

    while let Some(id) = stack.pop() {
        let child = index[&id];
        for parent in graph.node(id)?.parent_ids() {
            let p = match index.get(&parent) {
                Some(&p) => p,
                None => {
                    let p = dag.add_node(parent);
                    index.insert(parent, p);
                    stack.push(parent);
                    p
                }
            };
            dag.update_edge(p, child, ());
        }
    }

    let order = toposort(&dag, None).map_err(|cycle| {
        TensorError::InvalidOperation(format!(
            "computation graph has a cycle through node {}",
            dag[cycle.node_id()].index()
        ))
    })?;

    order
        .into_iter()
        .map(|i| graph.node(dag[i]).cloned())
        .collect()
}

impl Tensor {
    /// Accumulate gradients of this tensor into every tensor it depends on.
    ///
    /// The gradient of `self` is seeded with 1.0 at every position, then each
    /// recorded operation propagates in reverse topological order. Leaf
    /// gradients accumulate across calls; call [`zero_grad`](Tensor::zero_grad)
    /// on parameters between steps. Gradients of intermediate results are
    /// reset at the start of every call.
    ///
    /// A root with more than one element is accepted but logged as a warning:
    /// the result is the gradient of the sum of its elements.
    ///
    /// Every tracked operation keeps its output and operands alive in the
    /// thread's graph until [`clear_graph`](crate::autodiff::clear_graph) is
    /// called. Training loops should clear the graph once per step, after
    /// `backward` and the optimizer update; otherwise memory grows with every
    /// iteration.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::StaleNode` if the graph was cleared after `self`
    /// (or one of its ancestors) was computed.
    ///
    /// # Example
    ///
    /// ```
    /// use stridegrad::Tensor;
    ///
    /// let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// let b = Tensor::from_vec(vec![10.0, 20.0, 30.0], &[1, 3]).unwrap();
    /// let loss = a.add(&b).unwrap().sum();
    /// loss.backward().unwrap();
    ///
    /// assert_eq!(a.grad_to_vec(), vec![1.0; 6]);
    /// assert_eq!(b.grad_to_vec(), vec![2.0, 2.0, 2.0]);
    /// ```
    pub fn backward(&self) -> Result<(), TensorError> {
        if self.len() != 1 {
            log::warn!(
                "backward() called on non-scalar tensor of shape {:?}; seeding every element with 1.0",
                self.shape()
            );
        }

        let Some(root) = self.node_id() else {
            self.fill_grad(1.0);
            return Ok(());
        };

        let nodes = with_graph(|g| reachable_in_order(g, root))?;

        for node in &nodes {
            node.output().zero_grad();
        }
        self.fill_grad(1.0);

        log::debug!("backward: propagating through {} nodes", nodes.len());
        no_grad(|| {
            nodes.iter().rev().try_for_each(|node| {
                log::trace!("backward: {:?} {:?}", node.op(), node.output().shape());
                vjp::propagate(node)
            })
        })
    }
}
