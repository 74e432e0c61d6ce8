//! Vector-Jacobian products, one rule per [`Op`].
//!
//! Each rule reads the gradient accumulated on the node's output and adds
//! its contribution into the gradient of every operand. Rules run with grad
//! mode disabled, so the kernels they call record nothing.

use super::graph::{Node, Op};
use crate::error::TensorError;
use crate::operations::{broadcast_binary, matmul_forward, unbroadcast};
use crate::tensor::Tensor;

/// Run the backward rule of `node`.
pub(crate) fn propagate(node: &Node) -> Result<(), TensorError> {
    let g = node.output().grad();
    let inputs = node.inputs();

    match node.op() {
        Op::Add => {
            accumulate(&inputs[0], unbroadcast(g.clone(), inputs[0].shape())?)?;
            accumulate(&inputs[1], unbroadcast(g, inputs[1].shape())?)
        }
        Op::Sub => {
            accumulate(&inputs[0], unbroadcast(g.clone(), inputs[0].shape())?)?;
            accumulate(&inputs[1], unbroadcast(g.scale(-1.0), inputs[1].shape())?)
        }
        Op::Mul => {
            let (a, b) = (&inputs[0], &inputs[1]);
            let ga = broadcast_binary(&g, b, |g, y| g * y)?;
            let gb = broadcast_binary(&g, a, |g, x| g * x)?;
            accumulate(a, unbroadcast(ga, a.shape())?)?;
            accumulate(b, unbroadcast(gb, b.shape())?)
        }
        Op::MatMul => {
            // dA = dC @ B^T, dB = A^T @ dC
            let (a, b) = (&inputs[0], &inputs[1]);
            let ga = matmul_forward(&g, &b.transpose(0, 1)?)?;
            let gb = matmul_forward(&a.transpose(0, 1)?, &g)?;
            accumulate(a, ga)?;
            accumulate(b, gb)
        }
        Op::SumAll => {
            let x = &inputs[0];
            let seed = g.item()?;
            x.accumulate_grad(&vec![seed; x.len()])
        }
        Op::SumAxis { axis } => {
            let x = &inputs[0];
            let mut kept = x.shape().to_vec();
            kept[axis] = 1;
            accumulate(x, g.reshape(&kept)?.broadcast_to(x.shape())?)
        }
        Op::Relu => {
            let x = &inputs[0];
            let mask = broadcast_binary(&g, x, |g, x| if x > 0.0 { g } else { 0.0 })?;
            accumulate(x, mask)
        }
        Op::Sigmoid => {
            // uses the output y, not the input
            let y = node.output();
            let local = broadcast_binary(&g, y, |g, y| g * y * (1.0 - y))?;
            accumulate(&inputs[0], local)
        }
        Op::Tanh => {
            let y = node.output();
            let local = broadcast_binary(&g, y, |g, y| g * (1.0 - y * y))?;
            accumulate(&inputs[0], local)
        }
        Op::Contiguous => accumulate(&inputs[0], g),
    }
}

fn accumulate(target: &Tensor, contribution: Tensor) -> Result<(), TensorError> {
    debug_assert_eq!(contribution.shape(), target.shape());
    target.accumulate_grad(&contribution.to_vec())
}
