// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/barni-rs

//! Augmented tridiagonal/dense block solver (C6) — the continuum/peak
//! joint solve at the algorithmic heart of the pipeline.
//!
//! Solves the block system
//! ```text
//! [ T   S  ] [b]   [y  ]
//! [ Sᵀ  SᵀS] [a] = [Sᵀy]
//! ```
//! where `T` is symmetric tridiagonal, `S` holds the dense peak-triple
//! response kernels, `b` is the continuum and `a` the (non-negative) peak
//! amplitudes.

use nalgebra::{DMatrix, DVector};

use crate::error::{BarniError, Result};
use crate::spa::nnls::nnls;

const ZERO_TOLERANCE: f64 = 1e-9;

/// Output of the augmented block solve.
pub struct AugmentedSolution {
    /// Continuum amplitude per channel.
    pub continuum: Vec<f64>,
    /// Non-negative amplitude per response column (peak triple element).
    pub amplitudes: Vec<f64>,
}

/// Solves the augmented tridiagonal/dense system described above.
///
/// `diag`/`off` describe the symmetric tridiagonal regularizer `T`
/// (`diag.len() == n`, `off.len() == n - 1`). `s` is the `n x m` matrix of
/// response columns. `y` is the observed counts, length `n`.
pub fn solve_augmented(
    diag: &[f64],
    off: &[f64],
    s: &DMatrix<f64>,
    y: &[f64],
) -> Result<AugmentedSolution> {
    let n = diag.len();
    let m = s.ncols();

    if off.len() + 1 != n {
        return Err(BarniError::ShapeMismatch {
            context: "solve_augmented: off-diagonal length must be n - 1",
            expected: n.saturating_sub(1),
            actual: off.len(),
        });
    }
    if s.nrows() != n {
        return Err(BarniError::ShapeMismatch {
            context: "solve_augmented: S must have n rows",
            expected: n,
            actual: s.nrows(),
        });
    }
    if y.len() != n {
        return Err(BarniError::ShapeMismatch {
            context: "solve_augmented: y must have length n",
            expected: n,
            actual: y.len(),
        });
    }

    if m == 0 {
        let continuum = crate::spa::smoother::solve_symmetric_tridiagonal(diag, off, y)?;
        return Ok(AugmentedSolution {
            continuum,
            amplitudes: Vec::new(),
        });
    }

    // Step 1: reduce T to unit-diagonal upper-bidiagonal, propagating the
    // same row operations through S and the RHS y (-> b1_prime).
    let mut s_prime = s.clone();
    let mut b1_prime = DVector::from_row_slice(y);
    let mut c_prime = vec![0.0_f64; n.saturating_sub(1)];

    if diag[0] == 0.0 {
        return Err(BarniError::NumericalError(
            "solve_augmented: singular tridiagonal leading pivot".into(),
        ));
    }
    let mut pivot = diag[0];
    if n > 1 {
        c_prime[0] = off[0] / pivot;
    }
    for col in 0..m {
        s_prime[(0, col)] /= pivot;
    }
    b1_prime[0] /= pivot;

    for i in 1..n {
        let lower = off[i - 1];
        pivot = diag[i] - lower * c_prime.get(i - 1).copied().unwrap_or(0.0);
        if pivot.abs() < 1e-300 {
            return Err(BarniError::NumericalError(format!(
                "solve_augmented: singular tridiagonal system at row {i}"
            )));
        }
        if i < n - 1 {
            c_prime[i] = off[i] / pivot;
        }
        for col in 0..m {
            let updated = s_prime[(i, col)] - lower * s_prime[(i - 1, col)];
            s_prime[(i, col)] = updated / pivot;
        }
        b1_prime[i] = (b1_prime[i] - lower * b1_prime[i - 1]) / pivot;
    }

    // Step 2: zero the lower-left block Sᵀ by sweeping left to right,
    // accumulating the corresponding correction into SᵀS and B2.
    let mut st = s.transpose(); // m x n, will become ~0
    let mut sts = s.transpose() * s; // m x m
    let mut b2 = s.transpose() * DVector::from_row_slice(y); // m

    for i in 0..n {
        for k in 0..m {
            let factor = st[(k, i)];
            if factor == 0.0 {
                continue;
            }
            st[(k, i)] -= factor; // zeroes this entry
            if i + 1 < n {
                st[(k, i + 1)] -= factor * c_prime[i];
            }
            for col in 0..m {
                sts[(k, col)] -= factor * s_prime[(i, col)];
            }
            b2[k] -= factor * b1_prime[i];
        }
    }

    let lower_left_sum: f64 = st.iter().sum();
    if lower_left_sum.abs() > ZERO_TOLERANCE * (1.0 + st.abs().sum()) {
        return Err(BarniError::NumericalError(format!(
            "solve_augmented: lower-left block not eliminated (sum = {lower_left_sum})"
        )));
    }

    // Step 3: solve the dense lower-right block for non-negative amplitudes.
    let amplitudes = nnls(&sts, &b2)?;

    // Step 4: back-propagate amplitudes into the upper block's RHS.
    let correction = &s_prime * &amplitudes;
    let b1_final = &b1_prime - correction;

    // Step 5: back-substitute the unit-diagonal upper-bidiagonal top block.
    let mut continuum = vec![0.0_f64; n];
    continuum[n - 1] = b1_final[n - 1];
    for i in (0..n - 1).rev() {
        continuum[i] = b1_final[i] - c_prime[i] * continuum[i + 1];
    }

    Ok(AugmentedSolution {
        continuum,
        amplitudes: amplitudes.iter().copied().collect(),
    })
}
