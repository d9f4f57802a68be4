// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/barni-rs

//! BARNI Smooth Peak Analysis core.
//!
//! BARNI identifies radionuclides in a gamma-ray energy spectrum recorded by
//! a low-resolution detector. This crate implements the hard, numerically
//! interesting part of that pipeline: the **Smooth Peak Analysis (SPA)**
//! decomposition of a raw counts-vs-energy histogram into a smooth
//! continuum plus a sparse list of photopeaks.
//!
//! # Pipeline
//!
//! ```text
//! raw spectrum
//!   -> Smoother + BaselineEstimator   (continuum estimate)
//!   -> PeakProposer                  (derivative scan on the residual)
//!   -> PeakFitter::expand_triples     (one FWHM of freedom per peak)
//!   -> AugmentedSolver               (joint continuum/amplitude solve, NNLS)
//!   -> PeakFitter::combine_triples    (final peaks with recovered widths)
//!   -> PeakResult                    (peaks, continuum, sensor reference)
//! ```
//!
//! Classifier training, CLI orchestration, YAML configuration, generic XML
//! deserialization, plotting, and the experimental "unfolding" analyzer are
//! out of scope here — they are external collaborators, used through the
//! interfaces this crate exposes.
//!
//! # Example
//!
//! ```
//! use barni::config::SpaConfig;
//! use barni::spa::{EnergyScale, GaussianSensorModel, IdentificationInput, SmoothPeakAnalysis};
//! use barni::Spectrum;
//!
//! let edges: Vec<f64> = (0..=100).map(|i| i as f64 * 3.0).collect();
//! let es = EnergyScale::new(edges).unwrap();
//! let counts = vec![10.0; 100];
//! let spectrum = Spectrum::new(counts, es).unwrap();
//!
//! let sensor = GaussianSensorModel::new(0.05, 662.0, 0.0, 0.5).unwrap();
//! let spa = SmoothPeakAnalysis::new(sensor, SpaConfig::default());
//! let results = spa.analyze(&IdentificationInput::new(spectrum)).unwrap();
//! assert!(results.sample.continuum().counts().iter().all(|&c| c >= 0.0));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod peak;
pub mod spa;
pub mod spectrum;
pub mod xml;

pub use error::{BarniError, Result};
pub use peak::{Peak, PeakResult, RegionOfInterest};
pub use spectrum::Spectrum;
pub use xml::ToXml;
