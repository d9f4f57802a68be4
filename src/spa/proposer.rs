// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/barni-rs

//! Derivative-scan peak proposer with significance gating and merge (C5).

use crate::error::Result;
use crate::peak::Peak;
use crate::spa::energy_scale::EnergyScale;
use crate::spa::sensor::SensorModel;

/// A candidate peak before response-kernel expansion, carrying the
/// fractional channel its centroid was interpolated at.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    channel: f64,
    energy: f64,
    intensity: f64,
}

/// Scans `u - b` for rising-to-falling transitions, gates them by
/// significance, interpolates a sub-bin centroid, discards anything below
/// `lld`, and merges candidates closer together than `2.35*sigma` (spec
/// §4.5).
///
/// Returns peaks sorted by ascending energy, each with `baseline = 0` and
/// `width = 0` (filled in by later pipeline stages).
pub fn propose<S: SensorModel>(
    u: &[f64],
    b: &[f64],
    es: &EnergyScale,
    sensor: &S,
    lld: f64,
) -> Result<Vec<Peak>> {
    let mut potential: Vec<Candidate> = Vec::new();

    if !u.is_empty() {
        let mut current = u[0] - b[0];
        let mut prev = current;
        let mut rising = false;

        for i in 0..u.len() {
            let next = u[i] - b[i];

            if current == next {
                prev = current;
                continue;
            }

            if rising && current > next {
                rising = false;
                let sig = current / b.get(i.wrapping_sub(1)).copied().unwrap_or(0.0).max(1.0).sqrt();
                if sig > 1.0 {
                    let p1 = ((next + current) / 2.0).max(0.0);
                    let p2 = ((prev + current) / 2.0).max(0.0);
                    let f = 0.5 * (p2 - p1) / (p2 + p1);

                    let channel = i as f64 - 1.0 + f;
                    let energy = es.find_energy(channel);
                    potential.push(Candidate {
                        channel,
                        energy,
                        intensity: current,
                    });
                }
            }

            if !rising && current < next {
                rising = true;
            }

            prev = current;
            current = next;
        }
    }

    // Merge pass: walk the proposal list once; while the *current* merged
    // candidate's neighbor lies within 2.35*sigma of it, fold it in and
    // continue from the new position (spec §13 Open Question resolution
    // #1 — this does not reproduce the off-by-one suspected in the source).
    let mut peaks = Vec::new();
    let mut i = 0;
    while i < potential.len() {
        let mut current = potential[i];
        if current.energy < lld {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        loop {
            if j >= potential.len() {
                break;
            }
            let sigma = sensor.resolution(current.energy)?;
            let boundary = current.energy + sigma * 2.35;
            if potential[j].energy >= boundary {
                break;
            }
            let next = potential[j];
            let f = current.intensity / (current.intensity + next.intensity);
            current = Candidate {
                channel: f * current.channel + (1.0 - f) * next.channel,
                energy: f * current.energy + (1.0 - f) * next.energy,
                intensity: f * current.intensity + (1.0 - f) * next.intensity,
            };
            j += 1;
        }

        peaks.push(Peak::new(current.energy, current.intensity, 0.0, 0.0));
        i = j;
    }

    Ok(peaks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spa::GaussianSensorModel;

    fn unit_scale(n: usize) -> EnergyScale {
        EnergyScale::new((0..=n).map(|i| i as f64 * 3.0).collect()).unwrap()
    }

    fn gauss(energy: f64, amplitude: f64, centers: &[f64], sigma: f64) -> Vec<f64> {
        centers
            .iter()
            .map(|&c| amplitude * (-0.5 * ((c - energy) / sigma).powi(2)).exp())
            .collect()
    }

    #[test]
    fn single_planted_peak_is_recovered() {
        let es = unit_scale(100);
        let centers = es.centers();
        let sensor = GaussianSensorModel::new(0.05, 662.0, 0.0, 0.5).unwrap();
        let y: Vec<f64> = centers
            .iter()
            .enumerate()
            .map(|(i, &e)| 100.0 - 0.1 * i as f64 + gauss(150.0, 1000.0, &[e], 6.0)[0])
            .collect();
        let b: Vec<f64> = centers.iter().enumerate().map(|(i, _)| 100.0 - 0.1 * i as f64).collect();
        let peaks = propose(&y, &b, &es, &sensor, 0.0).unwrap();
        assert_eq!(peaks.len(), 1);
        assert!((peaks[0].energy - 150.0).abs() < 10.0, "{}", peaks[0].energy);
    }

    #[test]
    fn candidates_below_lld_are_discarded() {
        let es = unit_scale(100);
        let centers = es.centers();
        let sensor = GaussianSensorModel::new(0.05, 662.0, 0.0, 0.5).unwrap();
        let y: Vec<f64> = centers.iter().map(|&e| gauss(30.0, 1000.0, &[e], 6.0)[0]).collect();
        let b = vec![0.0; centers.len()];
        let peaks = propose(&y, &b, &es, &sensor, 50.0).unwrap();
        assert!(peaks.is_empty());
    }

    #[test]
    fn empty_spectrum_yields_no_peaks() {
        let es = unit_scale(10);
        let sensor = GaussianSensorModel::new(0.05, 662.0, 0.0, 0.5).unwrap();
        let y = vec![0.0; 10];
        let b = vec![0.0; 10];
        let peaks = propose(&y, &b, &es, &sensor, 0.0).unwrap();
        assert!(peaks.is_empty());
    }

    #[test]
    fn close_peaks_merge_into_one() {
        let es = unit_scale(200);
        let centers = es.centers();
        let sensor = GaussianSensorModel::new(0.1, 662.0, 0.0, 0.5).unwrap();
        let y: Vec<f64> = centers
            .iter()
            .map(|&e| {
                gauss(116.0, 1000.0, &[e], 6.0)[0] + gauss(130.0, 1000.0, &[e], 6.0)[0]
            })
            .collect();
        let b = vec![0.0; centers.len()];
        let peaks = propose(&y, &b, &es, &sensor, 0.0).unwrap();
        assert_eq!(peaks.len(), 1);
    }
}
