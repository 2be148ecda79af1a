use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::basis::Particles;
use crate::error::ConfigError;
use crate::excitgen::CaseWeights;
use crate::hamiltonian::ExcitGenOpts;
use crate::sampling::DEFAULT_FLOOR;

/// One active Hamiltonian term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TermConfig {
    /// Hubbard model on a hypercubic lattice.
    Hubbard {
        dims: Vec<usize>,
        #[serde(default = "default_periodic")]
        periodic: bool,
        t: f64,
        u: f64,
    },
    /// Random symmetric two-body integrals, one irrep label per site.
    General { irreps: Vec<usize>, scale: f64, seed: u64 },
    /// Holstein ladder coupling, one boson mode per fermion site.
    Holstein {
        g: f64,
        #[serde(default)]
        v_unc: Vec<f64>,
        occ_cutoff: u32,
    },
    /// Boson interaction conserving the sum of mode indices.
    BosonSum { nmode: usize, v: f64, occ_cutoff: u32 },
    /// Hopping on a hypercubic lattice dressed by one boson operator on a
    /// mode at either end of the bond. The lattice must match the fermion
    /// sites.
    LadderHopping {
        dims: Vec<usize>,
        #[serde(default = "default_periodic")]
        periodic: bool,
        g: f64,
        occ_cutoff: u32,
    },
}

fn default_periodic() -> bool {
    true
}

/// Initial case probabilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "weights", rename_all = "snake_case")]
pub enum CaseWeightsConfig {
    #[default]
    Uniform,
    Explicit(Vec<f64>),
    Partial(Vec<f64>),
    /// From the generators' connection estimates for the initial state.
    ApproxConnections,
}

impl CaseWeightsConfig {
    pub fn resolve(&self, particles: &Particles) -> CaseWeights {
        match self {
            CaseWeightsConfig::Uniform => CaseWeights::Uniform,
            CaseWeightsConfig::Explicit(w) => CaseWeights::Explicit(w.clone()),
            CaseWeightsConfig::Partial(w) => CaseWeights::Partial(w.clone()),
            CaseWeightsConfig::ApproxConnections => CaseWeights::ApproxConnections(*particles),
        }
    }
}

/// Source state the attempts are drawn from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Occupied spin orbitals, `ispin * nsite + isite`.
    pub frm: Vec<usize>,
    /// Boson occupation per mode; empty means the vacuum.
    pub bos: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub seed: u64,
    /// Worker threads, 0 for one per core.
    #[serde(default)]
    pub nthread: usize,
    pub nblock: usize,
    /// Attempts per worker per block.
    pub nattempt: usize,
    #[serde(default = "default_floor")]
    pub floor: f64,
    #[serde(default)]
    pub case_weights: CaseWeightsConfig,
    /// Keep the initial case probabilities for the whole run.
    #[serde(default)]
    pub static_probs: bool,
    #[serde(default = "default_min_case_prob")]
    pub min_case_prob: f64,
    /// Draws every case needs before a reweight is considered.
    #[serde(default = "default_ndraw_min")]
    pub ndraw_min: u64,
    #[serde(default)]
    pub excitgen: ExcitGenOpts,
    pub terms: Vec<TermConfig>,
    #[serde(default)]
    pub state: StateConfig,
}

fn default_floor() -> f64 {
    DEFAULT_FLOOR
}

fn default_min_case_prob() -> f64 {
    0.01
}

fn default_ndraw_min() -> u64 {
    100
}

impl RunConfig {
    /// Check the values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nblock == 0 {
            return Err(invalid("nblock", "at least one block is required"));
        }
        if self.nattempt == 0 {
            return Err(invalid("nattempt", "at least one attempt per block is required"));
        }
        if self.floor.is_nan() || self.floor <= 0.0 {
            return Err(invalid("floor", format!("must be positive, found {}", self.floor)));
        }
        if !(0.0..1.0).contains(&self.min_case_prob) {
            return Err(invalid("min_case_prob", format!("must lie in [0, 1), found {}", self.min_case_prob)));
        }
        if self.terms.is_empty() {
            return Err(invalid("terms", "no Hamiltonian terms given"));
        }
        for term in &self.terms {
            match term {
                TermConfig::Hubbard { dims, .. } | TermConfig::LadderHopping { dims, .. }
                    if dims.is_empty() || dims.contains(&0) =>
                {
                    return Err(invalid("dims", format!("bad lattice dimensions {dims:?}")));
                }
                TermConfig::General { irreps, .. } if irreps.is_empty() => {
                    return Err(invalid("irreps", "one irrep label per site is required"));
                }
                TermConfig::BosonSum { nmode: 0, .. } => {
                    return Err(invalid("nmode", "at least one boson mode is required"));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}

/// Read and validate a YAML run configuration.
pub fn read_config(path: impl AsRef<Path>) -> Result<RunConfig, ConfigError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config: RunConfig = serde_yaml::from_reader(reader)?;
    config.validate()?;
    Ok(config)
}
