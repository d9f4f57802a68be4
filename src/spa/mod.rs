// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/barni-rs

//! Smooth Peak Analysis (SPA) pipeline: C1-C8 of the BARNI core.
//!
//! Submodules map directly onto the component table: [`energy_scale`] (C1),
//! [`sensor`] (C2), [`smoother`] (C3), [`baseline`] (C4), [`proposer`] (C5),
//! [`nnls`] and [`solver`] (C6), [`fitter`] (C7), and [`analysis`] (C8, the
//! orchestrator that drives the others).

pub mod analysis;
pub mod baseline;
pub mod energy_scale;
pub mod fitter;
pub mod nnls;
pub mod proposer;
pub mod sensor;
pub mod smoother;
pub mod solver;

pub use analysis::{IdentificationInput, PeakResults, SmoothPeakAnalysis};
pub use energy_scale::EnergyScale;
pub use sensor::{GaussianSensorModel, SensorModel};
pub use smoother::Lambda;
