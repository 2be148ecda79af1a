//! IO module - YAML run configuration.

mod config;

pub use config::{read_config, CaseWeightsConfig, RunConfig, StateConfig, TermConfig};
