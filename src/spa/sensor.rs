// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/barni-rs

//! Energy-dependent Gaussian sensor resolution model (C2).

use statrs::distribution::{ContinuousCDF, Normal};

use crate::config::SpaConfig;
use crate::error::{BarniError, Result};
use crate::xml::ToXml;

/// Detector resolution and peak-response model.
///
/// Implementations are read-only collaborators supplied by the caller — the
/// core never fits or discovers this model, only evaluates it.
pub trait SensorModel {
    /// Standard deviation (keV) of the response at `energy`.
    fn resolution(&self, energy: f64) -> Result<f64>;

    /// Integral of a Gaussian of the given `intensity` centered at `energy`
    /// over each bin in `edges`, length `edges.len() - 1`.
    fn response(&self, energy: f64, intensity: f64, edges: &[f64]) -> Result<Vec<f64>>;

    /// Integral of a piecewise-linear flux `(e, i)` over `[e1, e2]`,
    /// convolved with the Gaussian response kernel, via composite Simpson's
    /// rule.
    fn response_integral(
        &self,
        e1: f64,
        e2: f64,
        i1: f64,
        i2: f64,
        edges: &[f64],
    ) -> Result<Vec<f64>>;
}

/// A detector whose resolution follows `sigma(e) = (A + B*e)^C`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianSensorModel {
    /// FWHM/energy resolution at `ref_energy`.
    pub resolution: f64,
    /// Reference energy (keV) the resolution is quoted at.
    pub ref_energy: f64,
    /// Electronic noise contribution (keV, FWHM at zero energy).
    pub electronic_noise: f64,
    /// Widening power `C`.
    pub widening_power: f64,
    a: f64,
    b: f64,
}

impl GaussianSensorModel {
    /// Build a sensor model from its physical parameters, deriving the
    /// internal `A`/`B` coefficients.
    pub fn new(
        resolution: f64,
        ref_energy: f64,
        electronic_noise: f64,
        widening_power: f64,
    ) -> Result<Self> {
        if widening_power == 0.0 {
            return Err(BarniError::DomainError {
                context: "GaussianSensorModel widening_power must be nonzero",
                value: widening_power.to_string(),
            });
        }
        let fwhm_ref_kev = resolution * ref_energy;
        let fwhm0_kev = electronic_noise;
        let c = widening_power;
        let a = (fwhm0_kev / 2.355).powf(1.0 / c);
        let b = ((fwhm_ref_kev / 2.355).powf(1.0 / c) - a) / ref_energy;
        Ok(Self {
            resolution,
            ref_energy,
            electronic_noise,
            widening_power,
            a,
            b,
        })
    }

    /// The derived `A` coefficient.
    pub fn a(&self) -> f64 {
        self.a
    }

    /// The derived `B` coefficient.
    pub fn b(&self) -> f64 {
        self.b
    }

    /// Builds a sensor model from an [`SpaConfig`]'s `resolution`/
    /// `ref_energy`/`electronic_noise`/`widening_power` fields, so a loaded
    /// config actually determines the sensor an analysis run uses instead
    /// of those fields going unread.
    pub fn from_config(config: &SpaConfig) -> Result<Self> {
        Self::new(
            config.resolution,
            config.ref_energy,
            config.electronic_noise,
            config.widening_power,
        )
    }
}

impl SensorModel for GaussianSensorModel {
    fn resolution(&self, energy: f64) -> Result<f64> {
        if energy < 0.0 {
            return Err(BarniError::DomainError {
                context: "sensor resolution requires non-negative energy",
                value: energy.to_string(),
            });
        }
        Ok((self.a + self.b * energy).powf(self.widening_power))
    }

    fn response(&self, energy: f64, intensity: f64, edges: &[f64]) -> Result<Vec<f64>> {
        let sigma = self.resolution(energy)?;
        let normal = Normal::new(energy, sigma).map_err(|e| {
            BarniError::NumericalError(format!("invalid Gaussian response parameters: {e}"))
        })?;
        let cdf: Vec<f64> = edges.iter().map(|&e| normal.cdf(e)).collect();
        Ok(cdf
            .windows(2)
            .map(|w| intensity * (w[1] - w[0]))
            .collect())
    }

    fn response_integral(
        &self,
        e1: f64,
        e2: f64,
        i1: f64,
        i2: f64,
        edges: &[f64],
    ) -> Result<Vec<f64>> {
        let r0 = 0.5 * self.resolution((e1 + e2) / 2.0)?;
        if r0 <= 0.0 {
            return Err(BarniError::NumericalError(
                "response_integral: non-positive resolution midpoint".into(),
            ));
        }
        let mut n = ((e2 - e1) / r0) as i64;
        if n < 4 {
            n = 4;
        }
        if n & 1 != 0 {
            n += 1;
        }
        let h = (e2 - e1) / n as f64;

        let nb = edges.len().saturating_sub(1);
        let mut out = vec![0.0_f64; nb];

        if i1 != 0.0 {
            add_assign(&mut out, &self.response(e1, i1 * h / 3.0, edges)?);
        }
        if i2 != 0.0 {
            add_assign(&mut out, &self.response(e2, i2 * h / 3.0, edges)?);
        }

        for i in 1..n {
            let weight = if i & 1 != 0 { 4.0 } else { 2.0 };
            let e = e1 + i as f64 * h;
            let f = (e - e1) / (e2 - e1);
            let flux = i1 * (1.0 - f) + f * i2;
            add_assign(&mut out, &self.response(e, flux * h / 3.0 * weight, edges)?);
        }

        Ok(out)
    }
}

impl ToXml for GaussianSensorModel {
    /// XML representation matching the persisted schema of spec §6.
    fn to_xml(&self) -> String {
        let mut xml = String::from("<GaussianSensorModel>\n");
        xml.push_str(&format!("  <resolution>{}</resolution>\n", self.resolution));
        xml.push_str(&format!(
            "  <resolutionEnergy>{}</resolutionEnergy>\n",
            self.ref_energy
        ));
        xml.push_str(&format!(
            "  <electronicNoise>{}</electronicNoise>\n",
            self.electronic_noise
        ));
        xml.push_str(&format!(
            "  <wideningPower>{}</wideningPower>\n",
            self.widening_power
        ));
        xml.push_str("</GaussianSensorModel>\n");
        xml
    }
}

fn add_assign(acc: &mut [f64], other: &[f64]) {
    for (a, b) in acc.iter_mut().zip(other.iter()) {
        *a += b;
    }
}
