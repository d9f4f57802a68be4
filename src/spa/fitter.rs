// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/barni-rs

//! Neighbor-triple expansion, response kernels, and width recombination
//! (C7).

use crate::error::{BarniError, Result};
use crate::peak::Peak;
use crate::spa::energy_scale::EnergyScale;
use crate::spa::sensor::SensorModel;

/// One element of an expanded peak triple, carrying its unit-area response
/// kernel once [`attach_response_kernels`] has run.
#[derive(Debug, Clone)]
pub struct TripleElement {
    /// Energy (keV) of this triple element.
    pub energy: f64,
    /// Amplitude assigned to this element — initially the proposer's
    /// intensity estimate, later replaced by the augmented solver's output.
    pub amplitude: f64,
    /// Unit-area response kernel, one entry per spectrum bin. Populated by
    /// [`attach_response_kernels`]; empty beforehand.
    pub response: Vec<f64>,
}

/// Replaces each proposed peak at energy `e0` by three peaks at
/// `e0 - sigma(e0)`, `e0`, `e0 + sigma(e0)`, each retaining the same
/// intensity (spec §4.6). The triple spans one FWHM, giving the joint
/// solver enough degrees of freedom to fit asymmetric peak shapes and small
/// miscalibrations.
pub fn expand_triples<S: SensorModel>(peaks: &[Peak], sensor: &S) -> Result<Vec<TripleElement>> {
    let mut out = Vec::with_capacity(peaks.len() * 3);
    for p in peaks {
        let sigma = sensor.resolution(p.energy)?;
        for e in [p.energy - sigma, p.energy, p.energy + sigma] {
            out.push(TripleElement {
                energy: e,
                amplitude: p.intensity,
                response: Vec::new(),
            });
        }
    }
    Ok(out)
}

/// Attaches a unit-area response vector to each triple element (spec §4.6).
pub fn attach_response_kernels<S: SensorModel>(
    triples: &mut [TripleElement],
    sensor: &S,
    edges: &[f64],
) -> Result<()> {
    for t in triples.iter_mut() {
        t.response = sensor.response(t.energy, 1.0, edges)?;
    }
    Ok(())
}

/// Combines amplitude-attached triples in groups of three into final peaks
/// with recovered widths (spec §4.8). Groups whose total amplitude is zero
/// are discarded. `baseline` is left at `0.0` — filled in later from the
/// continuum integral by the orchestrator.
pub fn combine_triples(triples: &[TripleElement], edges: &[f64]) -> Result<Vec<Peak>> {
    if triples.len() % 3 != 0 {
        return Err(BarniError::ShapeMismatch {
            context: "combine_triples requires a multiple of 3 elements",
            expected: triples.len() - (triples.len() % 3),
            actual: triples.len(),
        });
    }

    let mut peaks = Vec::with_capacity(triples.len() / 3);
    for group in triples.chunks(3) {
        let total: f64 = group.iter().map(|t| t.amplitude).sum();
        if total == 0.0 {
            continue;
        }

        let energy: f64 = group.iter().map(|t| t.amplitude * t.energy).sum::<f64>() / total;

        // Max bin-density a_i * S_i / bin_width across the three elements.
        let mut height = 0.0_f64;
        for t in group {
            for (i, &s) in t.response.iter().enumerate() {
                let bin_width = edges[i + 1] - edges[i];
                if bin_width <= 0.0 {
                    continue;
                }
                let density = t.amplitude * s / bin_width;
                if density > height {
                    height = density;
                }
            }
        }

        let width = if height > 0.0 {
            ((total / height).powi(2) / (2.0 * std::f64::consts::PI)).sqrt()
        } else {
            0.0
        };

        peaks.push(Peak::new(energy, total, 0.0, width));
    }

    Ok(peaks)
}
