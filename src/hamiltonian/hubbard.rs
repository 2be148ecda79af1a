//! Fermi-Hubbard model on a lattice.

use std::sync::Arc;

use nalgebra::DMatrix;
use tracing::warn;

use super::{ExcitGenOpts, FrmHam, HamTerm, Lattice};
use crate::basis::{FrmBasis, FrmConn, FrmOnv};
use crate::excitgen::{ExcitGen, HubbardPreferDoubleOcc, HubbardUniform};

/// `H = sum_<pq>,s h[p,q] c†ps cqs + U sum_p n_p,alpha n_p,beta`, with
/// `h = -t` on every lattice bond.
#[derive(Debug, Clone)]
pub struct HubbardFrmHam {
    basis: FrmBasis,
    lattice: Lattice,
    h1: DMatrix<f64>,
    pub t: f64,
    pub u: f64,
}

impl HubbardFrmHam {
    pub fn new(lattice: Lattice, t: f64, u: f64) -> Self {
        let h1 = lattice.hopping_matrix(t);
        Self { basis: FrmBasis::new(lattice.nsite()), lattice, h1, t, u }
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn hopping(&self) -> &DMatrix<f64> {
        &self.h1
    }
}

impl FrmHam for HubbardFrmHam {
    fn basis(&self) -> &FrmBasis {
        &self.basis
    }

    fn conserves_symmetry(&self) -> bool {
        true
    }

    fn get_element(&self, src: &FrmOnv, conn: &FrmConn) -> f64 {
        match (conn.ann.as_slice(), conn.cre.as_slice()) {
            ([], []) => {
                let ndoub = (0..self.basis.nsite).filter(|&s| src.site_nocc(s) == 2).count();
                self.u * ndoub as f64
            }
            (&[i], &[a]) => {
                if self.basis.ispin(i) != self.basis.ispin(a) {
                    return 0.0;
                }
                self.h1[(self.basis.isite(a), self.basis.isite(i))] * conn.sign(src)
            }
            _ => 0.0,
        }
    }
}

impl HamTerm for HubbardFrmHam {
    fn description(&self) -> &str {
        "Hubbard"
    }

    fn excit_gens(self: Arc<Self>, opts: &ExcitGenOpts) -> Vec<Box<dyn ExcitGen>> {
        if opts.hubbard_prefer_double_occ {
            if self.u > 0.0 && opts.hubbard_u_fac > 0.0 {
                return vec![Box::new(HubbardPreferDoubleOcc::new(self, opts.hubbard_u_fac))];
            }
            warn!(u = self.u, u_fac = opts.hubbard_u_fac, "double-occupancy preference needs positive U, using uniform hops");
        }
        vec![Box::new(HubbardUniform::new(self))]
    }
}
