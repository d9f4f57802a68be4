// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/barni-rs

//! A counts-vs-energy histogram (spec §3 "Spectrum").

use crate::error::{BarniError, Result};
use crate::spa::EnergyScale;
use crate::xml::{indent, ToXml};

/// A gamma-ray spectrum: counts per bin plus the [`EnergyScale`] that
/// defines the bin edges, along with acquisition metadata.
///
/// Invariant: `counts.len() == energy_scale.num_bins()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    counts: Vec<f64>,
    energy_scale: EnergyScale,
    /// Live time in seconds. Must be positive whenever the spectrum is used
    /// for intrinsic-source scaling.
    pub livetime: f64,
    /// Real (wall-clock) time in seconds.
    pub realtime: f64,
    /// Distance from source to detector (cm), if known.
    pub distance: Option<f64>,
    /// Dose rate at the detector face (uR), if known.
    pub gamma_dose: Option<f64>,
    /// A free-form label for the spectrum.
    pub title: Option<String>,
}

impl Spectrum {
    /// Builds a spectrum from raw counts and an energy scale.
    ///
    /// `livetime` and `realtime` default to `1.0`, matching the reference
    /// implementation's constructor defaults.
    pub fn new(counts: Vec<f64>, energy_scale: EnergyScale) -> Result<Self> {
        Self::with_times(counts, energy_scale, 1.0, 1.0)
    }

    /// Builds a spectrum with explicit live/real times.
    pub fn with_times(
        counts: Vec<f64>,
        energy_scale: EnergyScale,
        livetime: f64,
        realtime: f64,
    ) -> Result<Self> {
        if counts.len() != energy_scale.num_bins() {
            return Err(BarniError::ShapeMismatch {
                context: "Spectrum counts length must equal energy_scale.num_bins()",
                expected: energy_scale.num_bins(),
                actual: counts.len(),
            });
        }
        if counts.iter().any(|c| c.is_nan() || *c < 0.0) {
            return Err(BarniError::DomainError {
                context: "Spectrum counts must be finite and non-negative",
                value: format!("{counts:?}"),
            });
        }
        Ok(Self {
            counts,
            energy_scale,
            livetime,
            realtime,
            distance: None,
            gamma_dose: None,
            title: None,
        })
    }

    /// The per-bin counts.
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// The energy scale shared by every bin.
    pub fn energy_scale(&self) -> &EnergyScale {
        &self.energy_scale
    }

    /// Number of bins.
    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    /// Integrates counts over `[e1, e2]`, linearly apportioning the two
    /// partial boundary bins (spec §4.9 `Spectrum.getIntegral`).
    pub fn integral(&self, e1: f64, e2: f64) -> f64 {
        let edges = self.energy_scale.edges();
        let c3 = self.energy_scale.find_bin(e1);
        let c4 = self.energy_scale.find_bin(e2);

        let (u1, u2) = (edges[c3], edges[c3 + 1]);
        let f1 = (e1 - u1) / (u2 - u1);

        let (u1, u2) = (edges[c4], edges[c4 + 1]);
        let f2 = (e2 - u1) / (u2 - u1);

        let total: f64 = self.counts[c3..=c4].iter().sum();
        total - self.counts[c3] * f1 - self.counts[c4] * f2
    }

    /// Counts normalized by bin width (counts per keV).
    pub fn normed_counts(&self) -> Vec<f64> {
        let edges = self.energy_scale.edges();
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &c)| c / (edges[i + 1] - edges[i]))
            .collect()
    }

    /// Downsamples by pairing adjacent bins `(2i, 2i+1)`. When `num_bins()`
    /// is odd the trailing unpaired bin is folded into the last output bin
    /// rather than dropped (spec §13 Open Question resolution #3) — the
    /// reference implementation's `downsample()` indexes the energy scale
    /// directly and its behavior on odd `N` is untested.
    pub fn downsample(&self) -> Result<Self> {
        let n = self.counts.len();
        if n < 2 {
            return Err(BarniError::DomainError {
                context: "Spectrum::downsample requires at least 2 bins",
                value: n.to_string(),
            });
        }
        let out_bins = n / 2;
        let edges = self.energy_scale.edges();

        let mut new_edges: Vec<f64> = (0..=out_bins).map(|i| edges[2 * i]).collect();
        let mut new_counts: Vec<f64> = (0..out_bins)
            .map(|i| self.counts[2 * i] + self.counts[2 * i + 1])
            .collect();
        if n % 2 == 1 {
            // Odd trailing channel: fold into the last output bin rather
            // than silently dropping it or creating a narrower final bin.
            *new_edges.last_mut().unwrap() = edges[n];
            *new_counts.last_mut().unwrap() += self.counts[n - 1];
        }

        let energy_scale = EnergyScale::new(new_edges)?;
        let mut out = Spectrum::with_times(new_counts, energy_scale, self.livetime, self.realtime)?;
        out.distance = self.distance;
        out.gamma_dose = self.gamma_dose;
        out.title = self.title.clone();
        Ok(out)
    }

    /// Renders to the XML element named in spec §6, optionally tagged
    /// with a `name` attribute (e.g. `"sample"`, `"continuum"`).
    pub fn to_xml_named(&self, name: Option<&str>) -> String {
        let mut xml = match name {
            Some(n) => format!("<Spectrum name=\"{n}\">\n"),
            None => "<Spectrum>\n".to_string(),
        };
        xml.push_str("  <counts>");
        for c in &self.counts {
            xml.push_str(&c.to_string());
            xml.push(' ');
        }
        xml.push_str("</counts>\n");
        xml.push_str(&indent(&self.energy_scale.to_xml()));
        xml.push_str(&format!("  <livetime>{}</livetime>\n", self.livetime));
        xml.push_str(&format!("  <realtime>{}</realtime>\n", self.realtime));
        if let Some(d) = self.distance {
            xml.push_str(&format!("  <distance>{d}</distance>\n"));
        }
        if let Some(d) = self.gamma_dose {
            xml.push_str(&format!("  <gamma_dose>{d}</gamma_dose>\n"));
        }
        if let Some(t) = &self.title {
            xml.push_str(&format!("  <title>{t}</title>\n"));
        }
        xml.push_str("</Spectrum>\n");
        xml
    }
}

impl ToXml for Spectrum {
    fn to_xml(&self) -> String {
        self.to_xml_named(None)
    }
}
