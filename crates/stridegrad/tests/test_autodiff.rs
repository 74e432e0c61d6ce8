//! Integration tests for the autodiff engine.
//!
//! Tests backward-mode automatic differentiation with concrete values and
//! numerical gradient checks.

use approx::assert_relative_eq;
use stridegrad::autodiff::{clear_graph, is_grad_enabled, no_grad, with_graph};
use stridegrad::{Op, Tensor, TensorError};

/// Compute numerical gradient using central difference.
///
/// grad_i ≈ (f(x + eps*e_i) - f(x - eps*e_i)) / (2*eps)
fn numerical_gradient<F>(f: F, x: &[f64], eps: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut grad = vec![0.0; x.len()];
    let mut x_plus = x.to_vec();
    let mut x_minus = x.to_vec();

    for i in 0..x.len() {
        x_plus[i] = x[i] + eps;
        x_minus[i] = x[i] - eps;

        let f_plus = f(&x_plus);
        let f_minus = f(&x_minus);
        grad[i] = (f_plus - f_minus) / (2.0 * eps);

        x_plus[i] = x[i];
        x_minus[i] = x[i];
    }
    grad
}

fn assert_grad_matches(analytical: &[f64], numerical: &[f64]) {
    assert_eq!(analytical.len(), numerical.len());
    for (a, n) in analytical.iter().zip(numerical) {
        assert_relative_eq!(a, n, epsilon = 1e-4);
    }
}

#[test]
fn test_broadcast_backward_concrete() {
    clear_graph();
    let a = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        .reshape(&[2, 3])
        .unwrap();
    let b = Tensor::from_slice(&[10.0, 20.0, 30.0])
        .reshape(&[1, 3])
        .unwrap();

    let c = (&a + &b).unwrap();
    let loss = c.sum();
    loss.backward().unwrap();

    assert_eq!(a.grad_to_vec(), vec![1.0; 6]);
    assert_eq!(b.grad_to_vec(), vec![2.0, 2.0, 2.0]);
}

#[test]
fn test_matmul_forward_backward_concrete() {
    clear_graph();
    let a = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        .reshape(&[2, 3])
        .unwrap();
    let b = Tensor::from_slice(&[7.0, 8.0, 9.0, 1.0, 2.0, 3.0])
        .reshape(&[3, 2])
        .unwrap();

    let c = a.matmul(&b).unwrap();
    assert_eq!(c.to_vec(), vec![31.0, 19.0, 85.0, 55.0]);

    c.sum().backward().unwrap();
    assert_eq!(a.grad_to_vec()[0], 15.0);
    // dA = 1 @ B^T: row sums of B
    assert_eq!(a.grad_to_vec(), vec![15.0, 10.0, 5.0, 15.0, 10.0, 5.0]);
    // dB = A^T @ 1: column sums of A
    assert_eq!(b.grad_to_vec(), vec![5.0, 5.0, 7.0, 7.0, 9.0, 9.0]);
}

#[test]
fn test_gradient_accumulation() {
    clear_graph();
    let a = Tensor::from_slice(&[1.0, 2.0]);
    let b = Tensor::from_slice(&[3.0, 4.0]);
    let loss = a.mul(&b).unwrap().add(&a).unwrap().sum();

    loss.backward().unwrap();
    let once_a = a.grad_to_vec();
    let once_b = b.grad_to_vec();
    assert_eq!(once_a, vec![4.0, 5.0]);
    assert_eq!(once_b, vec![1.0, 2.0]);

    loss.backward().unwrap();
    assert_eq!(a.grad_to_vec(), vec![8.0, 10.0]);
    assert_eq!(b.grad_to_vec(), vec![2.0, 4.0]);

    a.zero_grad();
    b.zero_grad();
    loss.backward().unwrap();
    assert_eq!(a.grad_to_vec(), once_a);
    assert_eq!(b.grad_to_vec(), once_b);
}

#[test]
fn test_numerical_gradient_mlp_layer() {
    let eps = 1e-5;
    let x_data = [0.5, -1.0, 2.0, 0.3, -0.7, 1.1];
    let w_data = [0.2, -0.4, 0.1, 0.9, -0.3, 0.5];
    let coeffs = Tensor::from_vec(vec![1.0, -2.0], &[1, 2]).unwrap();

    // f(W) = sum(sigmoid(X @ W) * c), X: 2x3, W: 3x2
    let forward = |x: &Tensor, w: &Tensor| -> Tensor {
        x.matmul(w)
            .unwrap()
            .sigmoid()
            .mul(&coeffs)
            .unwrap()
            .sum()
    };
    let f = |w: &[f64]| -> f64 {
        no_grad(|| {
            let x = Tensor::from_vec(x_data.to_vec(), &[2, 3]).unwrap();
            let w = Tensor::from_vec(w.to_vec(), &[3, 2]).unwrap();
            forward(&x, &w).item().unwrap()
        })
    };
    let numerical = numerical_gradient(f, &w_data, eps);

    clear_graph();
    let x = Tensor::from_vec(x_data.to_vec(), &[2, 3]).unwrap();
    let w = Tensor::from_vec(w_data.to_vec(), &[3, 2]).unwrap();
    forward(&x, &w).backward().unwrap();

    assert_grad_matches(&w.grad_to_vec(), &numerical);
}

#[test]
fn test_numerical_gradient_relu_sum_axis() {
    let eps = 1e-5;
    // kept away from 0 so relu is differentiable at every point
    let x_data = [0.5, -1.0, 2.0, 0.3, -0.7, 1.1];
    let weights = Tensor::from_slice(&[1.0, 2.0, 3.0]);

    // f(X) = sum(relu(X).sum_axis(0) * w)
    let forward = |x: &Tensor| -> Tensor {
        x.relu().sum_axis(0).unwrap().mul(&weights).unwrap().sum()
    };
    let f = |x: &[f64]| -> f64 {
        no_grad(|| forward(&Tensor::from_vec(x.to_vec(), &[2, 3]).unwrap()).item().unwrap())
    };
    let numerical = numerical_gradient(f, &x_data, eps);

    clear_graph();
    let x = Tensor::from_vec(x_data.to_vec(), &[2, 3]).unwrap();
    forward(&x).backward().unwrap();

    assert_grad_matches(&x.grad_to_vec(), &numerical);
    assert_eq!(x.grad_to_vec(), vec![1.0, 0.0, 3.0, 1.0, 0.0, 3.0]);
}

#[test]
fn test_numerical_gradient_transposed_operand() {
    let eps = 1e-5;
    let x_data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let w = Tensor::from_vec(vec![0.5, -1.0, 2.0, 0.25], &[2, 2]).unwrap();

    // f(X) = sum((X^T @ W)^2), X: 2x3
    let forward = |x: &Tensor| -> Tensor {
        let y = x.transpose(0, 1).unwrap().matmul(&w).unwrap();
        y.mul(&y).unwrap().sum()
    };
    let f = |x: &[f64]| -> f64 {
        no_grad(|| forward(&Tensor::from_vec(x.to_vec(), &[2, 3]).unwrap()).item().unwrap())
    };
    let numerical = numerical_gradient(f, &x_data, eps);

    clear_graph();
    let x = Tensor::from_vec(x_data.to_vec(), &[2, 3]).unwrap();
    forward(&x).backward().unwrap();

    assert_grad_matches(&x.grad_to_vec(), &numerical);
}

#[test]
fn test_gradient_through_materialized_reshape() {
    clear_graph();
    let x = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    let flat = x.transpose(0, 1).unwrap().reshape(&[6]).unwrap();
    assert!(!flat.shares_storage_with(&x));
    assert_eq!(flat.op().unwrap(), Some(Op::Contiguous));

    let coeffs = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    flat.mul(&coeffs).unwrap().sum().backward().unwrap();

    // flat = [x00, x10, x01, x11, x02, x12]
    assert_eq!(x.grad_to_vec(), vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
}

#[test]
fn test_leaf_view_accumulates_into_source() {
    clear_graph();
    let w = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let m = w.reshape(&[2, 3]).unwrap();
    let wt = m.transpose(0, 1).unwrap();

    let loss = wt.mul(&wt).unwrap().sum();
    loss.backward().unwrap();

    assert_eq!(w.grad_to_vec(), vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);
    assert_eq!(m.grad_at(&[1, 0]).unwrap(), 8.0);
}

#[test]
fn test_shared_subgraph_emitted_once() {
    clear_graph();
    let x = Tensor::from_slice(&[1.0, 2.0, 3.0]);
    let h = x.relu();
    // y = sum(h*h + h), dy/dx = 2x + 1 for x > 0
    let y = h.mul(&h).unwrap().add(&h).unwrap().sum();
    y.backward().unwrap();

    assert_eq!(x.grad_to_vec(), vec![3.0, 5.0, 7.0]);
}

#[test]
fn test_sum_axis_keepdim_broadcast_back() {
    clear_graph();
    // x - mean over rows: gradient of sum(x - rowsum/3) is zero
    let x = Tensor::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
    let mean = x
        .sum_axis_keepdim(1)
        .unwrap()
        .mul(&Tensor::scalar(1.0 / 3.0))
        .unwrap();
    assert_eq!(mean.shape(), &[2, 1]);

    let centered = x.sub(&mean).unwrap();
    centered.sum().backward().unwrap();
    for g in x.grad_to_vec() {
        assert_relative_eq!(g, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_numerical_gradient_sum_axis_vector_and_permuted() {
    let eps = 1e-5;
    let x_data = [0.5, -1.0, 2.0, 0.3, -0.7, 1.1];
    let weights = Tensor::from_slice(&[1.0, -2.0]);

    // f(X) = sum(tanh(X^T).sum_axis(0) * w) + (X.reshape(6).sum_axis(0))^2
    let forward = |x: &Tensor| -> Tensor {
        let columns = x.permute(&[1, 0]).unwrap().tanh().sum_axis(0).unwrap();
        let flat = x.reshape(&[6]).unwrap().sum_axis(0).unwrap();
        assert_eq!(flat.shape(), &[1]);
        let weighted = columns.mul(&weights).unwrap().sum();
        weighted.add(&flat.mul(&flat).unwrap()).unwrap()
    };
    let f = |x: &[f64]| -> f64 {
        no_grad(|| forward(&Tensor::from_vec(x.to_vec(), &[2, 3]).unwrap()).item().unwrap())
    };
    let numerical = numerical_gradient(f, &x_data, eps);

    clear_graph();
    let x = Tensor::from_vec(x_data.to_vec(), &[2, 3]).unwrap();
    forward(&x).backward().unwrap();

    assert_grad_matches(&x.grad_to_vec(), &numerical);
}

#[test]
fn test_broadcast_against_empty_axis() {
    clear_graph();
    let a = Tensor::ones(&[1]);
    let c = a.add(&Tensor::zeros(&[0])).unwrap();
    assert_eq!(c.shape(), &[0]);
    c.sum().backward().unwrap();
    assert_eq!(a.grad_to_vec(), vec![0.0]);

    clear_graph();
    let a = Tensor::ones(&[2, 1]);
    let b = Tensor::zeros(&[2, 0]);
    let c = a.mul(&b).unwrap();
    assert_eq!(c.shape(), &[2, 0]);
    c.sum().backward().unwrap();
    assert_eq!(a.grad_to_vec(), vec![0.0, 0.0]);
    assert!(b.grad_to_vec().is_empty());
}

#[test]
fn test_neg_gradient() {
    clear_graph();
    let x = Tensor::from_slice(&[1.0, -2.0]);
    (-&x).sum().backward().unwrap();
    assert_eq!(x.grad_to_vec(), vec![-1.0, -1.0]);
}

#[test]
fn test_no_grad_records_nothing() {
    clear_graph();
    let a = Tensor::ones(&[2, 2]);
    let out = no_grad(|| {
        assert!(!is_grad_enabled());
        a.matmul(&a).unwrap().relu().sum()
    });

    assert!(is_grad_enabled());
    assert!(out.is_leaf());
    assert!(with_graph(|g| g.is_empty()));
}

#[test]
fn test_detach_stops_gradient() {
    clear_graph();
    let x = Tensor::from_slice(&[1.0, 2.0]);
    let h = x.mul(&x).unwrap();
    let y = h.detach().mul(&x).unwrap().sum();
    y.backward().unwrap();

    // only the direct path through x contributes: d/dx (c * x) = c = x^2
    assert_eq!(x.grad_to_vec(), vec![1.0, 4.0]);
}

#[test]
fn test_parents_and_op() {
    clear_graph();
    let a = Tensor::ones(&[2]);
    let b = Tensor::ones(&[2]);
    let c = a.sub(&b).unwrap();

    assert_eq!(c.op().unwrap(), Some(Op::Sub));
    let parents = c.parents().unwrap();
    assert_eq!(parents.len(), 2);
    assert!(parents[0].shares_storage_with(&a));
    assert!(parents[1].shares_storage_with(&b));
    assert_eq!(a.op().unwrap(), None);
}

#[test]
fn test_backward_after_clear_is_stale() {
    clear_graph();
    let x = Tensor::ones(&[3]);
    let loss = x.relu().sum();
    clear_graph();

    assert!(matches!(
        loss.backward(),
        Err(TensorError::StaleNode { .. })
    ));
    assert!(matches!(loss.parents(), Err(TensorError::StaleNode { .. })));
}

#[test]
fn test_non_scalar_root_seeds_every_element() {
    let _ = env_logger::builder().is_test(true).try_init();
    clear_graph();

    let x = Tensor::from_slice(&[1.0, 2.0, 3.0]);
    let y = x.mul(&x).unwrap();
    // warns, then behaves like y.sum().backward()
    y.backward().unwrap();

    assert_eq!(x.grad_to_vec(), vec![2.0, 4.0, 6.0]);
}
