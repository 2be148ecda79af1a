//! Precomputed heat-bath double excitations.
//!
//! For every occupied spin-orbital pair `ij` an alias table over the
//! destination pairs `ab` is built once, weighted by `|<ab||ij>|`. A draw is
//! then one uniform pair choice plus one O(1) alias draw, and the proposal
//! probability is roughly proportional to the coupling.

use std::sync::Arc;

use tracing::info;

use super::pairs;
use crate::basis::{CachedOrbs, ExSig, FrmConn, FrmOnv, Particles, EX_DOUBLE};
use crate::excitgen::{Draw, ExcitGen};
use crate::hamiltonian::{FrmHam, GeneralFrmHam};
use crate::sampling::{Prng, WeightedSampler, DEFAULT_FLOOR};

#[derive(Debug)]
pub struct PchbDoubles {
    ham: Arc<GeneralFrmHam>,
    nspinorb: usize,
    /// One table per `ij`, `None` where no `ab` couples.
    rows: Vec<Option<WeightedSampler>>,
}

impl PchbDoubles {
    pub fn new(ham: Arc<GeneralFrmHam>) -> Self {
        let nspinorb = ham.basis().nspinorb();
        let npair = pairs::npair(nspinorb);
        let mut rows = Vec::with_capacity(npair);
        for ij in 0..npair {
            let (i, j) = pairs::decode(ij);
            let weights: Vec<f64> = (0..npair)
                .map(|ab| {
                    let (a, b) = pairs::decode(ab);
                    if a == i || a == j || b == i || b == j {
                        0.0
                    } else {
                        ham.antisym(a, b, i, j).abs()
                    }
                })
                .collect();
            rows.push(WeightedSampler::build(&weights, DEFAULT_FLOOR).ok());
        }
        let nrow = rows.iter().filter(|r| r.is_some()).count();
        info!(nspinorb, npair, nrow, "built precomputed heat-bath tables");
        Self { ham, nspinorb, rows }
    }

    fn row(&self, i: usize, j: usize) -> Option<&WeightedSampler> {
        self.rows[pairs::encode(i, j)].as_ref()
    }
}

impl ExcitGen for PchbDoubles {
    fn description(&self) -> &str {
        "precomputed heat-bath doubles"
    }

    fn exsigs(&self) -> &[ExSig] {
        &[EX_DOUBLE]
    }

    fn approx_nconn(&self, _exsig: ExSig, particles: &Particles) -> usize {
        particles.nelec_pair() * pairs::npair(self.nspinorb)
    }

    fn draw_frm(&self, exsig: ExSig, src: &FrmOnv, orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<FrmConn> {
        debug_assert_eq!(exsig, EX_DOUBLE);
        let occ = &orbs.frm(src).occ;
        let npair_elec = pairs::npair(occ.len());
        if npair_elec == 0 {
            return Draw::Rejected;
        }
        let (ielec, jelec) = pairs::decode(rng.draw_uint(npair_elec));
        let (i, j) = (occ[ielec], occ[jelec]);
        let Some(row) = self.row(i, j) else {
            return Draw::Rejected;
        };
        let ab = row.draw(rng);
        let (a, b) = pairs::decode(ab);
        if src.get(a) || src.get(b) {
            return Draw::Rejected;
        }
        let conn = FrmConn::double(i, j, a, b);
        let prob = row.probability(ab) / npair_elec as f64;
        let helem = self.ham.get_element(src, &conn);
        Draw::proposed(conn, prob, Some(helem))
    }

    fn prob_frm(&self, src: &FrmOnv, orbs: &mut CachedOrbs, conn: &FrmConn) -> f64 {
        let (&[j, i], &[b, a]) = (conn.ann.as_slice(), conn.cre.as_slice()) else {
            return 0.0;
        };
        if j >= i || b >= a || !src.get(i) || !src.get(j) || src.get(a) || src.get(b) {
            return 0.0;
        }
        let npair_elec = pairs::npair(orbs.frm(src).occ.len());
        match self.row(i, j) {
            Some(row) => row.probability(pairs::encode(a, b)) / npair_elec as f64,
            None => 0.0,
        }
    }

    fn coupling_frm(&self, src: &FrmOnv, conn: &FrmConn) -> f64 {
        self.ham.get_element(src, conn)
    }
}
