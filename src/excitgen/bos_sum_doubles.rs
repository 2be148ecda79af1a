//! Boson pair moves conserving the sum of mode indices.

use std::sync::Arc;

use super::pairs;
use crate::basis::{BosConn, BosOnv, CachedOrbs, ExSig, Particles, EX_0022};
use crate::excitgen::{Draw, ExcitGen};
use crate::hamiltonian::SumConservingBosHam;
use crate::sampling::Prng;

/// Range `[min, max)` of creation modes `a` such that `b = i + j - a` is a
/// valid mode, and the number of modes in it equal to `i` or `j`.
fn creation_range(i: usize, j: usize, nmode: usize) -> (usize, usize, usize) {
    let min = if i + j >= nmode { 1 + i + j - nmode } else { 0 };
    let max = (i + j + 1).min(nmode);
    let nexclude = if i == j { 1 } else { 2 };
    (min, max, nexclude)
}

/// Picks two boson operators uniformly from the occupied modes, then a
/// creation mode `a` uniformly among those compatible with the index sum,
/// never re-creating in `i` or `j`.
#[derive(Debug)]
pub struct BosonSumConservingDoubles {
    ham: Arc<SumConservingBosHam>,
}

impl BosonSumConservingDoubles {
    pub fn new(ham: Arc<SumConservingBosHam>) -> Self {
        Self { ham }
    }

    fn nmode(&self) -> usize {
        self.ham.basis.nmode
    }

    /// True if creating in `a` and `b` stays within the occupation cutoff.
    fn fits_cutoff(&self, src: &BosOnv, a: usize, b: usize) -> bool {
        let cutoff = self.ham.basis.occ_cutoff;
        if a == b {
            src[a] + 2 <= cutoff
        } else {
            src[a] < cutoff && src[b] < cutoff
        }
    }

    /// Probability of choosing the annihilation pair `(i, j)`, `i <= j`.
    fn prob_pair(src: &BosOnv, i: usize, j: usize, nboson: usize) -> f64 {
        let npair = pairs::npair(nboson) as f64;
        let (ni, nj) = (src[i] as f64, src[j] as f64);
        if i == j {
            ni * (ni - 1.0) / (2.0 * npair)
        } else {
            ni * nj / npair
        }
    }
}

impl ExcitGen for BosonSumConservingDoubles {
    fn description(&self) -> &str {
        "boson sum-conserving doubles"
    }

    fn exsigs(&self) -> &[ExSig] {
        &[EX_0022]
    }

    fn approx_nconn(&self, _exsig: ExSig, particles: &Particles) -> usize {
        pairs::npair(particles.nboson) * self.nmode()
    }

    fn draw_bos(&self, exsig: ExSig, src: &BosOnv, orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<BosConn> {
        debug_assert_eq!(exsig, EX_0022);
        let nmode = self.nmode();
        assert_eq!(src.nmode(), nmode, "boson state has {} modes, term has {nmode}", src.nmode());
        let ops = &orbs.bos(src).expanded;
        let nboson = ops.len();
        if nboson < 2 {
            return Draw::Rejected;
        }
        let (hi, lo) = pairs::decode(rng.draw_uint(pairs::npair(nboson)));
        let (i, j) = (ops[lo], ops[hi]);

        let (min, max, nexclude) = creation_range(i, j, nmode);
        if min + nexclude >= max {
            return Draw::Rejected;
        }
        let nchoice = max - min - nexclude;
        let mut a = rng.draw_uint_in(min, max - nexclude);
        if a >= i {
            a += 1;
        }
        if i != j && a >= j {
            a += 1;
        }
        debug_assert!(a < max && a != i && a != j, "creation mode {a} out of range");
        let b = i + j - a;

        if !self.fits_cutoff(src, a, b) {
            return Draw::Rejected;
        }

        let mut prob = Self::prob_pair(src, i, j, nboson) / nchoice as f64;
        if a != b {
            prob *= 2.0;
        }
        let conn = BosConn::new(vec![i, j], vec![a, b]);
        let helem = self.ham.get_element(src, &conn);
        Draw::proposed(conn, prob, Some(helem))
    }

    fn prob_bos(&self, src: &BosOnv, _orbs: &mut CachedOrbs, conn: &BosConn) -> f64 {
        let (&[i, j], &[a, b]) = (conn.ann.as_slice(), conn.cre.as_slice()) else {
            return 0.0;
        };
        if a + b != i + j || a == i || a == j || src.nboson() < 2 || !self.fits_cutoff(src, a, b) {
            return 0.0;
        }
        let (min, max, nexclude) = creation_range(i, j, self.nmode());
        if min + nexclude >= max {
            return 0.0;
        }
        let nchoice = (max - min - nexclude) as f64;
        let prob = Self::prob_pair(src, i, j, src.nboson()) / nchoice;
        if a != b {
            2.0 * prob
        } else {
            prob
        }
    }

    fn coupling_bos(&self, src: &BosOnv, conn: &BosConn) -> f64 {
        self.ham.get_element(src, conn)
    }
}
