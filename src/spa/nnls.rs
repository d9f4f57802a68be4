// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/barni-rs

//! Classical active-set non-negative least squares (Lawson-Hanson).
//!
//! Minimizes `||A x - b||_2` subject to `x >= 0`. Used by the augmented
//! solver (C6) to constrain peak-triple amplitudes to physically meaningful
//! (non-negative) values.

use nalgebra::{DMatrix, DVector};

use crate::error::{BarniError, Result};

const MAX_OUTER_ITERATIONS: usize = 300;
const TOLERANCE: f64 = 1e-10;

/// Solves `min ||a*x - b||` subject to `x >= 0`.
pub fn nnls(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    let n = a.ncols();
    if a.nrows() != b.len() {
        return Err(BarniError::ShapeMismatch {
            context: "nnls: A rows must match b length",
            expected: a.nrows(),
            actual: b.len(),
        });
    }
    if n == 0 {
        return Ok(DVector::zeros(0));
    }

    let mut x = DVector::zeros(n);
    let mut passive = vec![false; n]; // true => variable allowed to be nonzero

    let mut iterations = 0usize;
    loop {
        let residual = b - a * &x;
        let gradient = a.transpose() * &residual; // w = A^T(b - A x)

        // Find the most promising bound variable to free.
        let mut best_idx: Option<usize> = None;
        let mut best_val = TOLERANCE;
        for j in 0..n {
            if !passive[j] && gradient[j] > best_val {
                best_val = gradient[j];
                best_idx = Some(j);
            }
        }
        let Some(enter) = best_idx else { break };
        passive[enter] = true;

        iterations += 1;
        if iterations > MAX_OUTER_ITERATIONS {
            return Err(BarniError::NumericalError(
                "nnls: exceeded iteration cap without convergence".into(),
            ));
        }

        loop {
            let idx: Vec<usize> = (0..n).filter(|&j| passive[j]).collect();
            if idx.is_empty() {
                break;
            }
            let sub_a = a.select_columns(idx.iter());
            let z_sub = solve_least_squares(&sub_a, b)?;

            if z_sub.iter().all(|&v| v > 0.0) {
                x.fill(0.0);
                for (k, &j) in idx.iter().enumerate() {
                    x[j] = z_sub[k];
                }
                break;
            }

            // Some passive variable wants to go negative: back off along the
            // line from the current feasible x toward z_sub.
            let mut alpha = f64::INFINITY;
            for (k, &j) in idx.iter().enumerate() {
                if z_sub[k] <= 0.0 {
                    let denom = x[j] - z_sub[k];
                    if denom.abs() > 1e-14 {
                        alpha = alpha.min(x[j] / denom);
                    }
                }
            }
            if !alpha.is_finite() {
                alpha = 0.0;
            }

            let mut z_full = DVector::zeros(n);
            for (k, &j) in idx.iter().enumerate() {
                z_full[j] = z_sub[k];
            }
            for j in 0..n {
                if passive[j] {
                    x[j] += alpha * (z_full[j] - x[j]);
                }
            }
            for j in 0..n {
                if passive[j] && x[j].abs() < 1e-12 {
                    x[j] = 0.0;
                    passive[j] = false;
                }
            }

            iterations += 1;
            if iterations > MAX_OUTER_ITERATIONS {
                return Err(BarniError::NumericalError(
                    "nnls: exceeded iteration cap without convergence".into(),
                ));
            }
        }
    }

    Ok(x)
}

/// Unconstrained least squares via the normal equations, regularized with a
/// tiny ridge term so a rank-deficient passive set never produces NaN.
fn solve_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    let ata = a.transpose() * a;
    let atb = a.transpose() * b;
    let n = ata.nrows();
    let ridge = DMatrix::<f64>::identity(n, n) * 1e-12;
    (ata + ridge)
        .lu()
        .solve(&atb)
        .ok_or_else(|| BarniError::NumericalError("nnls: singular passive-set system".into()))
}
