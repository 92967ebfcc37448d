#![forbid(unsafe_code)]

//! Shared problem generators for the benchmark harness.

use rand::rngs::SmallRng;
use rand::Rng;
use sepq_api::{CscMatrix, Params, PiecewiseQuadratic, Scalar};

/// Random feasible instance: dense A with b = A·x0 for an interior x0, a
/// diagonally dominated P, and interval indicators wide enough to contain
/// x0.
pub fn random_feasible_params(n: usize, m: usize, rng: &mut SmallRng) -> Params<Scalar> {
    assert!(m <= n, "need at least as many variables as constraints");

    let mut a_dense = vec![0.0 as Scalar; m * n];
    for value in a_dense.iter_mut() {
        *value = rng.gen::<Scalar>() - 0.5;
    }
    // column-major for the CSC constructor
    let mut a_cols = vec![0.0 as Scalar; m * n];
    for col in 0..n {
        for row in 0..m {
            a_cols[col * m + row] = a_dense[row * n + col];
        }
    }
    let a = CscMatrix::from_dense(m, n, &a_cols, 0.0);

    let x0: Vec<Scalar> = (0..n).map(|_| rng.gen::<Scalar>()).collect();
    let b = a.mul_vec(&x0);

    let diag: Vec<Scalar> = (0..n).map(|_| 1.0 + rng.gen::<Scalar>()).collect();
    let p = CscMatrix::diagonal(&diag);
    let q: Vec<Scalar> = (0..n).map(|_| rng.gen::<Scalar>() - 0.5).collect();

    let g = (0..n)
        .map(|_| PiecewiseQuadratic::indicator(-5.0, 5.0))
        .collect();

    Params { p, q, a, b, g }
}
