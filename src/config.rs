// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/barni-rs

//! Algorithm tunables for the Smooth Peak Analysis pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{BarniError, Result};

/// Tunable parameters for a single `analyze()` run.
///
/// This is the algorithm's own configuration surface — sensor parameters and
/// smoothing/threshold knobs — not an application-level config (no CLI
/// flags, no hardware/database/networking sections live here).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpaConfig {
    /// Sensor resolution `R` at `refEnergy`, e.g. `0.05` for 5%.
    pub resolution: f64,

    /// Reference energy (keV) at which `resolution` is specified.
    pub ref_energy: f64,

    /// Electronic noise contribution to the sensor resolution model (keV).
    pub electronic_noise: f64,

    /// Widening power `C` of the sensor resolution model.
    pub widening_power: f64,

    /// Overall smoothing strength passed to the baseline estimator and the
    /// augmented solver's regularizer.
    pub smoothing_factor: f64,

    /// Low-level discriminator: peaks below this energy (keV) are discarded.
    pub start_energy: f64,

    /// Declared for schema parity with the original `SmoothPeakAnalysis`
    /// attribute of the same name; like the original, which never reads it
    /// in its analysis routine, this crate's `analyze()` does not use it to
    /// bound the working channel range.
    pub end_energy: f64,
}

impl Default for SpaConfig {
    fn default() -> Self {
        Self {
            resolution: 0.05,
            ref_energy: 662.0,
            electronic_noise: 1.0,
            widening_power: 0.6,
            smoothing_factor: 3.0,
            start_energy: 35.0,
            end_energy: 3000.0,
        }
    }
}

impl SpaConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BarniError::DomainError {
                context: "reading SpaConfig file",
                value: e.to_string(),
            }
        })?;
        let config: SpaConfig = toml::from_str(&content).map_err(|e| BarniError::DomainError {
            context: "parsing SpaConfig TOML",
            value: e.to_string(),
        })?;
        info!("loaded SpaConfig from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_physically_sane() {
        let cfg = SpaConfig::default();
        assert!(cfg.resolution > 0.0);
        assert!(cfg.ref_energy > 0.0);
        assert!(cfg.end_energy > cfg.start_energy);
    }

    #[test]
    fn load_roundtrips_through_toml() {
        let cfg = SpaConfig::default();
        let s = toml::to_string(&cfg).unwrap();
        let back: SpaConfig = toml::from_str(&s).unwrap();
        assert_eq!(cfg, back);
    }
}
