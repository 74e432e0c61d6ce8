//! Optimizers.
//!
//! Updates write parameter storage directly and never record graph nodes.

use crate::tensor::Tensor;

/// Base trait for optimizers.
///
/// ```ignore
/// optimizer.zero_grad();
/// loss.backward()?;
/// optimizer.step();
/// ```
pub trait Optimizer {
    /// Update every parameter from its accumulated gradient.
    fn step(&mut self);

    /// Set gradients of all parameters to zero.
    fn zero_grad(&self);

    fn learning_rate(&self) -> f64;

    fn set_learning_rate(&mut self, lr: f64);
}

/// Stochastic gradient descent: `param -= lr * grad`.
#[derive(Debug, Clone)]
pub struct Sgd {
    params: Vec<Tensor>,
    lr: f64,
}

impl Sgd {
    pub fn new(params: Vec<Tensor>, lr: f64) -> Self {
        Self { params, lr }
    }

    pub fn parameters(&self) -> &[Tensor] {
        &self.params
    }
}

impl Optimizer for Sgd {
    fn step(&mut self) {
        let lr = self.lr;
        for p in &self.params {
            p.update_with_grad(|value, grad| *value -= lr * grad);
        }
    }

    fn zero_grad(&self) {
        for p in &self.params {
            p.zero_grad();
        }
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
    }
}
