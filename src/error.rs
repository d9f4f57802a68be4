// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/barni-rs

//! Error types for the Smooth Peak Analysis core.

use thiserror::Error;

/// Errors raised by the SPA pipeline.
#[derive(Debug, Error)]
pub enum BarniError {
    /// Two arrays that are required to agree in length (or a matrix block
    /// that is required to have specific dimensions) do not.
    #[error("shape mismatch: {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Where the mismatch was detected.
        context: &'static str,
        /// The expected length or dimension.
        expected: usize,
        /// The length or dimension actually seen.
        actual: usize,
    },

    /// An input value falls outside the domain the algorithm is defined on
    /// (negative energy, non-positive livetime, negative regularizer, etc).
    #[error("domain error: {context}: {value}")]
    DomainError {
        /// Description of the violated domain constraint.
        context: &'static str,
        /// The offending value, formatted for display.
        value: String,
    },

    /// A numerical routine failed: a singular tridiagonal system, an NNLS
    /// solve that did not converge, or a post-elimination consistency check
    /// that failed to land within tolerance.
    #[error("numerical error: {0}")]
    NumericalError(String),

    /// The peak proposer found no candidates. Not fatal — callers may treat
    /// this as "continuum-only fit" — but distinguishable from a true error.
    #[error("empty peak set")]
    EmptyPeakSet,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BarniError>;
