//! Uniform single excitations.

use std::sync::Arc;

use crate::basis::{CachedOrbs, ExSig, FrmConn, FrmOnv, Particles, EX_SINGLE};
use crate::excitgen::{Draw, ExcitGen};
use crate::hamiltonian::FrmHam;
use crate::sampling::Prng;

/// Picks an occupied and a vacant spin orbital uniformly. When the term
/// conserves spin and point-group symmetry, the pair is restricted to one
/// (spin, irrep) label, itself chosen uniformly among the labels that admit
/// a move.
#[derive(Debug)]
pub struct UniformSingles {
    ham: Arc<dyn FrmHam>,
    spin_conserving: bool,
}

impl UniformSingles {
    pub fn new(ham: Arc<dyn FrmHam>) -> Self {
        let spin_conserving = ham.conserves_symmetry();
        Self { ham, spin_conserving }
    }
}

impl ExcitGen for UniformSingles {
    fn description(&self) -> &str {
        if self.spin_conserving {
            "uniform singles (symmetry conserving)"
        } else {
            "uniform singles"
        }
    }

    fn exsigs(&self) -> &[ExSig] {
        &[EX_SINGLE]
    }

    fn approx_nconn(&self, _exsig: ExSig, particles: &Particles) -> usize {
        let nsite = self.ham.basis().nsite;
        if self.spin_conserving {
            particles.nalpha * nsite.saturating_sub(particles.nalpha)
                + particles.nbeta * nsite.saturating_sub(particles.nbeta)
        } else {
            particles.nelec() * (2 * nsite).saturating_sub(particles.nelec())
        }
    }

    fn draw_frm(&self, exsig: ExSig, src: &FrmOnv, orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<FrmConn> {
        debug_assert_eq!(exsig, EX_SINGLE);
        let decoded = orbs.frm(src);
        debug_assert_eq!(decoded.occ_by_label.len(), self.ham.basis().nlabel(), "orbital cache built for another basis");
        let (i, a, prob) = if self.spin_conserving {
            let nlabel = decoded.nonempty_labels.len();
            if nlabel == 0 {
                return Draw::Rejected;
            }
            let label = decoded.nonempty_labels[rng.draw_uint(nlabel)];
            let occ = &decoded.occ_by_label[label];
            let vac = &decoded.vac_by_label[label];
            let prob = 1.0 / (nlabel * occ.len() * vac.len()) as f64;
            (occ[rng.draw_uint(occ.len())], vac[rng.draw_uint(vac.len())], prob)
        } else {
            let (nocc, nvac) = (decoded.occ.len(), decoded.vac.len());
            if nocc == 0 || nvac == 0 {
                return Draw::Rejected;
            }
            let prob = 1.0 / (nocc * nvac) as f64;
            (decoded.occ[rng.draw_uint(nocc)], decoded.vac[rng.draw_uint(nvac)], prob)
        };
        Draw::proposed(FrmConn::single(i, a), prob, None)
    }

    fn prob_frm(&self, src: &FrmOnv, orbs: &mut CachedOrbs, conn: &FrmConn) -> f64 {
        let (&[i], &[a]) = (conn.ann.as_slice(), conn.cre.as_slice()) else {
            return 0.0;
        };
        if !src.get(i) || src.get(a) {
            return 0.0;
        }
        let decoded = orbs.frm(src);
        if !self.spin_conserving {
            return 1.0 / (decoded.occ.len() * decoded.vac.len()) as f64;
        }
        let basis = self.ham.basis();
        let label = basis.label(i);
        if basis.label(a) != label {
            return 0.0;
        }
        let n = decoded.nonempty_labels.len() * decoded.occ_by_label[label].len() * decoded.vac_by_label[label].len();
        1.0 / n as f64
    }

    fn coupling_frm(&self, src: &FrmOnv, conn: &FrmConn) -> f64 {
        self.ham.get_element(src, conn)
    }
}
