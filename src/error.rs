//! Error types for the sampling layer and the run configuration.
//!
//! A rejected excitation draw is not an error: it is the `Draw::Rejected`
//! value and never surfaces here.

use thiserror::Error;

/// Fatal errors raised while building or reweighting a probability table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplerError {
    /// Weights sum to less than the configured floor.
    #[error("degenerate distribution: weights sum to {sum:e}, below the floor {floor:e}")]
    DegenerateDistribution { sum: f64, floor: f64 },

    /// No (generator, exsig) pairs were supplied by the active terms.
    #[error("no excitation cases: at least one generator/exsig pair is required")]
    EmptyCaseSet,

    /// Weight vector does not have one entry per case.
    #[error("expected {expected} weights, found {found}")]
    WeightCount { expected: usize, found: usize },

    /// A weight is negative, NaN or infinite.
    #[error("invalid weight {value} at index {index}")]
    InvalidWeight { index: usize, value: f64 },

    /// The `ncase - 1` given weights leave no room for the last case.
    #[error("partial case weights sum to {sum}, which exceeds one")]
    PartialWeightsExceedOne { sum: f64 },
}

/// Errors raised while reading or interpreting a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error(transparent)]
    Sampler(#[from] SamplerError),
}
