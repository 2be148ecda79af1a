//! Hamiltonian module - physical terms that supply excitation generators and
//! answer coupling queries.

mod bos_sum;
mod general;
mod holstein;
mod hopping_ladder;
mod hubbard;
mod lattice;

pub use bos_sum::SumConservingBosHam;
pub use general::GeneralFrmHam;
pub use holstein::HolsteinLadderHam;
pub use hopping_ladder::HoppingLadderHam;
pub use hubbard::HubbardFrmHam;
pub use lattice::Lattice;

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::basis::{FrmBasis, FrmConn, FrmOnv};
use crate::excitgen::ExcitGen;

/// Generator selection switches shared by all terms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExcitGenOpts {
    /// Hubbard hops preferentially start from doubly occupied sites.
    pub hubbard_prefer_double_occ: bool,
    /// Scales the preference towards doubly occupied sites.
    pub hubbard_u_fac: f64,
    /// Holstein ladder moves pick the mode through an electron.
    pub ladder_density: bool,
}

impl Default for ExcitGenOpts {
    fn default() -> Self {
        Self {
            hubbard_prefer_double_occ: false,
            hubbard_u_fac: 1.0,
            ladder_density: false,
        }
    }
}

/// A physical interaction term.
pub trait HamTerm: Send + Sync + Debug {
    fn description(&self) -> &str;

    /// Generators able to sample the connections of this term. Each one keeps
    /// a shared reference to the term for its coupling queries.
    fn excit_gens(self: Arc<Self>, opts: &ExcitGenOpts) -> Vec<Box<dyn ExcitGen>>;
}

/// Fermion term queried by the fermion generators.
pub trait FrmHam: Send + Sync + Debug {
    fn basis(&self) -> &FrmBasis;

    /// True if every non-zero single connects spin orbitals of the same
    /// (spin, irrep) label.
    fn conserves_symmetry(&self) -> bool;

    /// Matrix element `<src|H|conn(src)>`, with the empty connection giving
    /// the diagonal.
    fn get_element(&self, src: &FrmOnv, conn: &FrmConn) -> f64;
}
