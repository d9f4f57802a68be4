// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/barni-rs

//! Iterative lower-envelope continuum extraction (C4).

use crate::error::Result;
use crate::spa::smoother::{smooth, Lambda};

/// Estimates the continuum under a spectrum and returns it alongside a
/// lightly-smoothed copy of the input (spec §4.4).
///
/// 1. `u <- smooth(y, 0.05*mu)` suppresses Poisson noise without erasing
///    peaks.
/// 2. `x <- smooth(u, mu)` is a heavy smoothing approximating the continuum.
/// 3. Two refinement passes pull `x` down into the valleys by smoothing the
///    negative residual `min(u - x, 0)` at a halved `mu` and adding it back.
/// 4. The result is clamped to non-negative.
pub fn compute_baseline(y: &[f64], mu: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    let u = smooth(y, &Lambda::Linear { slope: mu * 0.05, intercept: 0.0 })?;
    let mut x = smooth(&u, &Lambda::Linear { slope: mu, intercept: 0.0 })?;

    let mut step_mu = mu;
    for _ in 0..2 {
        step_mu /= 2.0;
        let clamped_x: Vec<f64> = x.iter().map(|&v| v.max(0.0)).collect();
        let residual: Vec<f64> = u
            .iter()
            .zip(clamped_x.iter())
            .map(|(&ui, &xi)| (ui - xi).min(0.0))
            .collect();
        let correction = smooth(&residual, &Lambda::Linear { slope: step_mu, intercept: 0.0 })?;
        x = correction
            .iter()
            .zip(clamped_x.iter())
            .map(|(&c, &xi)| c + xi)
            .collect();
    }

    let baseline: Vec<f64> = x.iter().map(|&v| v.max(0.0)).collect();
    Ok((baseline, u))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_is_nonnegative() {
        let y: Vec<f64> = (0..200)
            .map(|i| 50.0 - 0.1 * i as f64 + if i == 100 { 500.0 } else { 0.0 })
            .collect();
        let (baseline, _) = compute_baseline(&y, 0.2).unwrap();
        assert!(baseline.iter().all(|&b| b >= 0.0));
    }

    #[test]
    fn baseline_stays_under_a_planted_peak() {
        let n = 200;
        let mut y = vec![20.0_f64; n];
        y[100] += 800.0;
        y[99] += 300.0;
        y[101] += 300.0;
        let (baseline, _) = compute_baseline(&y, 0.3).unwrap();
        assert!(baseline[100] < y[100]);
    }

    #[test]
    fn flat_zero_spectrum_gives_zero_baseline() {
        let y = vec![0.0; 50];
        let (baseline, u) = compute_baseline(&y, 0.1).unwrap();
        assert!(baseline.iter().all(|&b| b == 0.0));
        assert!(u.iter().all(|&v| v == 0.0));
    }
}
