//! Excitation generation module - the generator contract, the concrete
//! sampling strategies and the case registry that selects between them.

mod bos_sum_doubles;
mod group;
mod hubbard;
mod ladder;
mod mag_log;
pub(crate) mod pairs;
mod pchb;
mod traits;
mod uniform_singles;

#[cfg(test)]
mod tester;

pub use bos_sum_doubles::BosonSumConservingDoubles;
pub use group::{CaseRegistry, CaseWeights, ExcitCase};
pub use hubbard::{HubbardPreferDoubleOcc, HubbardUniform};
pub use ladder::{LadderHoppingUniform, LadderPureDensity, LadderPureUniform};
pub use mag_log::MagnitudeLogger;
pub use pchb::PchbDoubles;
pub use traits::{Draw, ExcitGen, Mbf, Proposal};
pub use uniform_singles::UniformSingles;
