//! Neural-network building blocks on top of the tracked tensor API.
//!
//! Enabled by the `nn` cargo feature (on by default).
//!
//! # Example
//!
//! ```
//! use stridegrad::Tensor;
//! use stridegrad::autodiff::clear_graph;
//! use stridegrad::nn::{Activation, Linear, Module, Optimizer, Sequential, Sgd, loss};
//!
//! let mut model = Sequential::new();
//! model.push(Linear::new(2, 4, true));
//! model.push(Activation::Relu);
//! model.push(Linear::new(4, 1, true));
//!
//! let mut sgd = Sgd::new(model.parameters(), 0.01);
//! let x = Tensor::from_rows(&[[0.0, 1.0], [1.0, 0.0]]).unwrap();
//! let y = Tensor::from_rows(&[[1.0], [0.0]]).unwrap();
//!
//! sgd.zero_grad();
//! let loss = loss::mse(&model.forward(&x).unwrap(), &y).unwrap();
//! loss.backward().unwrap();
//! sgd.step();
//! clear_graph();
//! ```

mod activation;
mod linear;
pub mod loss;
mod module;
mod optim;
mod sequential;

pub use activation::Activation;
pub use linear::Linear;
pub use module::Module;
pub use optim::{Optimizer, Sgd};
pub use sequential::Sequential;
