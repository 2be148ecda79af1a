//! Hopping moves for lattice Hubbard models.

use std::sync::Arc;

use crate::basis::{CachedOrbs, ExSig, FrmConn, FrmOnv, Particles, EX_SINGLE};
use crate::excitgen::{Draw, ExcitGen};
use crate::hamiltonian::{FrmHam, HubbardFrmHam};
use crate::sampling::Prng;

/// Same-spin neighbours of spin orbital `i` that are vacant in `src`.
fn vacant_neighbours(ham: &HubbardFrmHam, src: &FrmOnv, i: usize) -> Vec<usize> {
    let basis = ham.basis();
    let ispin = basis.ispin(i);
    ham.lattice()
        .neighbours(basis.isite(i))
        .iter()
        .map(|&s| basis.ispinorb(ispin, s))
        .filter(|&a| !src.get(a))
        .collect()
}

/// Picks an electron uniformly, then a vacant same-spin neighbour uniformly.
#[derive(Debug)]
pub struct HubbardUniform {
    ham: Arc<HubbardFrmHam>,
}

impl HubbardUniform {
    pub fn new(ham: Arc<HubbardFrmHam>) -> Self {
        Self { ham }
    }
}

impl ExcitGen for HubbardUniform {
    fn description(&self) -> &str {
        "Hubbard uniform hopping"
    }

    fn exsigs(&self) -> &[ExSig] {
        &[EX_SINGLE]
    }

    fn approx_nconn(&self, _exsig: ExSig, particles: &Particles) -> usize {
        particles.nelec() * self.ham.lattice().max_coordination()
    }

    fn draw_frm(&self, exsig: ExSig, src: &FrmOnv, orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<FrmConn> {
        debug_assert_eq!(exsig, EX_SINGLE);
        let occ = &orbs.frm(src).occ;
        if occ.is_empty() {
            return Draw::Rejected;
        }
        let i = occ[rng.draw_uint(occ.len())];
        let valid = vacant_neighbours(&self.ham, src, i);
        if valid.is_empty() {
            return Draw::Rejected;
        }
        let a = valid[rng.draw_uint(valid.len())];
        let conn = FrmConn::single(i, a);
        let prob = 1.0 / (occ.len() * valid.len()) as f64;
        let helem = self.ham.get_element(src, &conn);
        Draw::proposed(conn, prob, Some(helem))
    }

    fn prob_frm(&self, src: &FrmOnv, orbs: &mut CachedOrbs, conn: &FrmConn) -> f64 {
        let (&[i], &[a]) = (conn.ann.as_slice(), conn.cre.as_slice()) else {
            return 0.0;
        };
        if !src.get(i) {
            return 0.0;
        }
        let valid = vacant_neighbours(&self.ham, src, i);
        if !valid.contains(&a) {
            return 0.0;
        }
        1.0 / (orbs.frm(src).occ.len() * valid.len()) as f64
    }

    fn coupling_frm(&self, src: &FrmOnv, conn: &FrmConn) -> f64 {
        self.ham.get_element(src, conn)
    }
}

/// Like [`HubbardUniform`], but when doubly occupied sites exist the moving
/// electron is taken from one of them with probability
/// `p_d = 1 / (1 + 1 / (u_fac * U))`. The reported probability accounts for
/// both ways an electron on a doubly occupied site can be chosen.
#[derive(Debug)]
pub struct HubbardPreferDoubleOcc {
    ham: Arc<HubbardFrmHam>,
    prob_doub: f64,
}

impl HubbardPreferDoubleOcc {
    pub fn new(ham: Arc<HubbardFrmHam>, u_fac: f64) -> Self {
        let prob_doub = 1.0 / (1.0 + 1.0 / (u_fac * ham.u));
        Self { ham, prob_doub }
    }

    /// Probability of picking electron `i` from `src`.
    fn prob_elec(&self, i: usize, occ: &[usize], doubly_occ_sites: &[usize]) -> f64 {
        let nelec = occ.len() as f64;
        if doubly_occ_sites.is_empty() {
            return 1.0 / nelec;
        }
        let nelec_doub = 2.0 * doubly_occ_sites.len() as f64;
        let on_doub = doubly_occ_sites.contains(&self.ham.basis().isite(i));
        let mut prob = (1.0 - self.prob_doub) / nelec;
        if on_doub {
            prob += self.prob_doub / nelec_doub;
        }
        prob
    }
}

impl ExcitGen for HubbardPreferDoubleOcc {
    fn description(&self) -> &str {
        "Hubbard hopping preferring double occupancy"
    }

    fn exsigs(&self) -> &[ExSig] {
        &[EX_SINGLE]
    }

    fn approx_nconn(&self, _exsig: ExSig, particles: &Particles) -> usize {
        particles.nelec() * self.ham.lattice().max_coordination()
    }

    fn draw_frm(&self, exsig: ExSig, src: &FrmOnv, orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<FrmConn> {
        debug_assert_eq!(exsig, EX_SINGLE);
        let decoded = orbs.frm(src);
        let occ = &decoded.occ;
        if occ.is_empty() {
            return Draw::Rejected;
        }
        let doub = &decoded.doubly_occ_sites;
        let i = if !doub.is_empty() && rng.draw_float() < self.prob_doub {
            let isite = doub[rng.draw_uint(doub.len())];
            self.ham.basis().ispinorb(rng.draw_uint(2), isite)
        } else {
            occ[rng.draw_uint(occ.len())]
        };
        let valid = vacant_neighbours(&self.ham, src, i);
        if valid.is_empty() {
            return Draw::Rejected;
        }
        let a = valid[rng.draw_uint(valid.len())];
        let conn = FrmConn::single(i, a);
        let prob = self.prob_elec(i, occ, doub) / valid.len() as f64;
        let helem = self.ham.get_element(src, &conn);
        Draw::proposed(conn, prob, Some(helem))
    }

    fn prob_frm(&self, src: &FrmOnv, orbs: &mut CachedOrbs, conn: &FrmConn) -> f64 {
        let (&[i], &[a]) = (conn.ann.as_slice(), conn.cre.as_slice()) else {
            return 0.0;
        };
        if !src.get(i) {
            return 0.0;
        }
        let valid = vacant_neighbours(&self.ham, src, i);
        if !valid.contains(&a) {
            return 0.0;
        }
        let decoded = orbs.frm(src);
        self.prob_elec(i, &decoded.occ, &decoded.doubly_occ_sites) / valid.len() as f64
    }

    fn coupling_frm(&self, src: &FrmOnv, conn: &FrmConn) -> f64 {
        self.ham.get_element(src, conn)
    }
}
