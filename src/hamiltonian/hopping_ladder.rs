//! Electron hopping dressed by a boson creation or annihilation.

use std::sync::Arc;

use super::{ExcitGenOpts, HamTerm, Lattice};
use crate::basis::{BosBasis, FrmBasis, FrmBosConn, FrmBosOnv};
use crate::excitgen::{ExcitGen, LadderHoppingUniform};

/// `H = g sum_<pq>,s (b†p + bp + b†q + bq) c†ps cqs`, summed over both
/// orientations of every lattice bond, with one boson mode per site. A hop
/// couples to the modes at both ends of its bond.
#[derive(Debug, Clone)]
pub struct HoppingLadderHam {
    frm_basis: FrmBasis,
    lattice: Lattice,
    pub bos_basis: BosBasis,
    pub g: f64,
}

impl HoppingLadderHam {
    pub fn new(lattice: Lattice, g: f64, occ_cutoff: u32) -> Self {
        let nsite = lattice.nsite();
        Self { frm_basis: FrmBasis::new(nsite), lattice, bos_basis: BosBasis::new(nsite, occ_cutoff), g }
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn nsite(&self) -> usize {
        self.frm_basis.nsite
    }

    pub fn nmode(&self) -> usize {
        self.bos_basis.nmode
    }

    /// Coefficient of `b†n c†a ci`, equal to that of `bn c†a ci`.
    pub fn coeff(&self, imode: usize, a: usize, i: usize) -> f64 {
        let basis = &self.frm_basis;
        if basis.ispin(a) != basis.ispin(i) {
            return 0.0;
        }
        let (site_a, site_i) = (basis.isite(a), basis.isite(i));
        if !self.lattice.is_bonded(site_a, site_i) || (imode != site_a && imode != site_i) {
            return 0.0;
        }
        self.g
    }

    /// Panics unless `src` has as many sites as the lattice.
    pub(crate) fn check_sites(&self, src: &FrmBosOnv) {
        assert_eq!(
            src.frm.nsite(),
            self.nsite(),
            "ladder hopping lattice has {} sites, state has {}",
            self.nsite(),
            src.frm.nsite()
        );
    }

    pub fn get_element(&self, src: &FrmBosOnv, conn: &FrmBosConn) -> f64 {
        let (&[i], &[a]) = (conn.frm.ann.as_slice(), conn.frm.cre.as_slice()) else {
            return 0.0;
        };
        let imode = match (conn.bos.ann.as_slice(), conn.bos.cre.as_slice()) {
            (&[n], []) | ([], &[n]) => n,
            _ => return 0.0,
        };
        self.check_sites(src);
        self.coeff(imode, a, i) * conn.bos.occ_factor(&src.bos) * conn.frm.sign(&src.frm)
    }
}

impl HamTerm for HoppingLadderHam {
    fn description(&self) -> &str {
        "ladder hopping"
    }

    fn excit_gens(self: Arc<Self>, _opts: &ExcitGenOpts) -> Vec<Box<dyn ExcitGen>> {
        vec![Box::new(LadderHoppingUniform::new(self))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{BosConn, BosOnv, FrmConn, FrmOnv};
    use approx::assert_relative_eq;

    fn ham() -> HoppingLadderHam {
        HoppingLadderHam::new(Lattice::hypercubic(&[4], true), 0.3, 2)
    }

    #[test]
    fn test_hopping_elements() {
        let ham = ham();
        let src = FrmBosOnv::new(FrmOnv::from_occs(4, &[0, 2, 5]), BosOnv::from_occs(vec![0, 1, 2, 0]));
        // alpha 0 -> 1 passes no electron, creating on site 1 with one boson present
        let conn = FrmBosConn::new(FrmConn::single(0, 1), BosConn::cre_one(1));
        assert_relative_eq!(ham.get_element(&src, &conn), 0.3 * 2.0_f64.sqrt(), epsilon = 1e-12);
        // alpha 2 -> 1 annihilating on site 2
        let conn = FrmBosConn::new(FrmConn::single(2, 1), BosConn::ann_one(2));
        assert_relative_eq!(ham.get_element(&src, &conn), 0.3 * 2.0_f64.sqrt(), epsilon = 1e-12);
        // alpha 0 -> 3 jumps over the electron on site 2
        let conn = FrmBosConn::new(FrmConn::single(0, 3), BosConn::cre_one(3));
        assert_relative_eq!(ham.get_element(&src, &conn), -0.3, epsilon = 1e-12);
        // mode away from the bond
        let conn = FrmBosConn::new(FrmConn::single(0, 1), BosConn::cre_one(3));
        assert_eq!(ham.get_element(&src, &conn), 0.0);
        // spin flip
        let conn = FrmBosConn::new(FrmConn::single(0, 5 + 2), BosConn::cre_one(0));
        assert_eq!(ham.get_element(&src, &conn), 0.0);
        // pure hop
        assert_eq!(ham.get_element(&src, &FrmConn::single(0, 1).into()), 0.0);
    }

    #[test]
    fn test_hermitian() {
        let ham = ham();
        let src = FrmBosOnv::new(FrmOnv::from_occs(4, &[0, 2, 5]), BosOnv::from_occs(vec![0, 1, 2, 0]));
        for (i, a, imode) in [(0, 1, 1), (0, 3, 0), (5, 4, 0), (2, 3, 3)] {
            let conn = FrmBosConn::new(FrmConn::single(i, a), BosConn::cre_one(imode));
            let dst = conn.apply(&src);
            let back = FrmBosConn::new(FrmConn::single(a, i), BosConn::ann_one(imode));
            assert_relative_eq!(ham.get_element(&src, &conn), ham.get_element(&dst, &back), epsilon = 1e-12);
        }
    }

    #[test]
    #[should_panic(expected = "ladder hopping lattice has 4 sites")]
    fn test_site_mismatch_panics() {
        let src = FrmBosOnv::new(FrmOnv::from_occs(3, &[0]), BosOnv::new(4));
        let conn = FrmBosConn::new(FrmConn::single(0, 1), BosConn::cre_one(1));
        ham().get_element(&src, &conn);
    }
}
