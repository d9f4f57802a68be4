// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/barni-rs

//! Variable-width banded smoother (C3).

use crate::error::{BarniError, Result};

/// Per-channel regularizer supplied to the smoother.
///
/// The reference implementation passes an arbitrary callable; this is a
/// small closed sum type covering the shapes actually used by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lambda {
    /// The same regularizer at every channel.
    Constant(f64),
    /// `slope * i + intercept`, letting the smoothing track the Gaussian
    /// peak width (`\propto \sqrt{e}`) of Poisson-noise-limited spectra.
    Linear { slope: f64, intercept: f64 },
    /// An explicit per-channel table, one entry per smoothed bin boundary.
    Channelwise(Vec<f64>),
}

impl Lambda {
    fn at(&self, i: usize) -> f64 {
        match self {
            Lambda::Constant(c) => *c,
            Lambda::Linear { slope, intercept } => slope * i as f64 + intercept,
            Lambda::Channelwise(table) => table.get(i).copied().unwrap_or(0.0),
        }
    }
}

/// Solves `(I + L^T D(lambda) L) x = y` for a symmetric tridiagonal system,
/// where `L` is the first-difference operator and `D(lambda)` holds the
/// per-channel regularizers.
pub fn smooth(y: &[f64], lambda: &Lambda) -> Result<Vec<f64>> {
    let n = y.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    if y.iter().all(|&v| v == 0.0) {
        return Ok(vec![0.0; n]);
    }

    // diag[i] = 1 + lambda_{i-1} + lambda_i (lambda_{-1} = lambda_n = 0)
    // off[i]  = -lambda_i, linking channel i and i+1, for i in 0..n-1
    let mut diag = vec![0.0_f64; n];
    let mut off = vec![0.0_f64; n.saturating_sub(1)];
    let mut c2 = 0.0_f64;
    for i in 0..n.saturating_sub(1) {
        let c = lambda.at(i);
        diag[i] = 1.0 + c + c2;
        off[i] = -c;
        c2 = c;
    }
    diag[n - 1] = 1.0 + c2;

    solve_symmetric_tridiagonal(&diag, &off, y)
}

/// Thomas's algorithm for a symmetric tridiagonal system with diagonal
/// `diag[0..n]` and off-diagonal `off[0..n-1]` (linking `i` and `i+1`).
pub fn solve_symmetric_tridiagonal(diag: &[f64], off: &[f64], rhs: &[f64]) -> Result<Vec<f64>> {
    let n = diag.len();
    if rhs.len() != n || off.len() + 1 != n {
        return Err(BarniError::ShapeMismatch {
            context: "solve_symmetric_tridiagonal dimension mismatch",
            expected: n,
            actual: rhs.len(),
        });
    }
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut c_prime = vec![0.0_f64; n.saturating_sub(1)];
    let mut d_prime = vec![0.0_f64; n];

    if diag[0] == 0.0 {
        return Err(BarniError::NumericalError(
            "singular tridiagonal system (zero leading pivot)".into(),
        ));
    }
    if n > 1 {
        c_prime[0] = off[0] / diag[0];
    }
    d_prime[0] = rhs[0] / diag[0];

    for i in 1..n {
        let lower = off[i - 1];
        let pivot = diag[i] - lower * c_prime.get(i - 1).copied().unwrap_or(0.0);
        if pivot.abs() < 1e-300 {
            return Err(BarniError::NumericalError(format!(
                "singular tridiagonal system at row {i}"
            )));
        }
        if i < n - 1 {
            c_prime[i] = off[i] / pivot;
        }
        d_prime[i] = (rhs[i] - lower * d_prime[i - 1]) / pivot;
    }

    let mut x = vec![0.0_f64; n];
    x[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d_prime[i] - c_prime[i] * x[i + 1];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smooth_matches_reference_output() {
        // diag = [2, 3, 3, 3, 3, 2], off = [-1, -1, -1, -1, -1]; exact
        // rational solution of (I + L^T D(1) L) x = y for y = [0..5].
        let y = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let out = smooth(&y, &Lambda::Constant(1.0)).unwrap();
        let reference = [
            11.0 / 18.0,
            11.0 / 9.0,
            37.0 / 18.0,
            53.0 / 18.0,
            34.0 / 9.0,
            79.0 / 18.0,
        ];
        for (a, b) in out.iter().zip(reference.iter()) {
            assert!((a - b).abs() < 1e-9, "{a} vs {b}");
        }
    }

    #[test]
    fn smooth_conserves_sum_for_constant_lambda() {
        let y = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let out = smooth(&y, &Lambda::Constant(1.0)).unwrap();
        let sum: f64 = out.iter().sum();
        assert!((sum - 15.0).abs() < 1e-6, "{sum}");
    }

    #[test]
    fn smooth_handles_all_zero_input_without_nan() {
        let y = vec![0.0; 10];
        let out = smooth(&y, &Lambda::Constant(2.0)).unwrap();
        assert!(out.iter().all(|v| v.is_finite()));
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn smooth_rejects_empty_rhs_mismatch() {
        let diag = [1.0, 1.0];
        let off = [0.5];
        let rhs = [1.0];
        assert!(solve_symmetric_tridiagonal(&diag, &off, &rhs).is_err());
    }
}
