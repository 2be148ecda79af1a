//! Connections: the difference between a source state and a destination.
//!
//! A fermion connection `{ann: [i, j], cre: [a, b]}` stands for the operator
//! string `c†a c†b cj ci` acting on the source, i.e. the annihilators are
//! applied in ascending order and then the creators in descending order.
//! [`FrmConn::phase`] is the sign picked up by doing exactly that.

use super::exsig::ExSig;
use super::onv::{BosOnv, FrmBosOnv, FrmOnv};

/// Fermion excitation with sorted annihilated and created spin orbitals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FrmConn {
    pub ann: Vec<usize>,
    pub cre: Vec<usize>,
}

impl FrmConn {
    /// Build from unsorted index lists.
    pub fn new(mut ann: Vec<usize>, mut cre: Vec<usize>) -> Self {
        ann.sort_unstable();
        cre.sort_unstable();
        Self { ann, cre }
    }

    pub fn single(i: usize, a: usize) -> Self {
        Self { ann: vec![i], cre: vec![a] }
    }

    pub fn double(i: usize, j: usize, a: usize, b: usize) -> Self {
        Self::new(vec![i, j], vec![a, b])
    }

    pub fn exsig(&self) -> ExSig {
        ExSig::new(self.cre.len() as u32, self.ann.len() as u32, 0, 0)
    }

    /// True if every annihilated orbital is occupied in `src` and every
    /// created one is vacant once the annihilations are done.
    pub fn is_valid(&self, src: &FrmOnv) -> bool {
        self.ann.iter().all(|&i| src.get(i))
            && self.cre.iter().all(|&a| !src.get(a) || self.ann.contains(&a))
            && self.ann.windows(2).all(|w| w[0] < w[1])
            && self.cre.windows(2).all(|w| w[0] < w[1])
    }

    /// Destination state.
    pub fn apply(&self, src: &FrmOnv) -> FrmOnv {
        let mut dst = src.clone();
        for &i in &self.ann {
            debug_assert!(dst.get(i), "annihilating vacant spin orbital {i}");
            dst.clr(i);
        }
        for &a in &self.cre {
            debug_assert!(!dst.get(a), "creating in occupied spin orbital {a}");
            dst.set(a);
        }
        dst
    }

    /// True if the operator string picks up a minus sign on `src`.
    pub fn phase(&self, src: &FrmOnv) -> bool {
        let mut work = src.clone();
        let mut nswap = 0;
        for &i in &self.ann {
            nswap += work.nset_below(i);
            work.clr(i);
        }
        for &a in self.cre.iter().rev() {
            nswap += work.nset_below(a);
            work.set(a);
        }
        nswap % 2 == 1
    }

    /// `-1.0` or `1.0` according to [`Self::phase`].
    pub fn sign(&self, src: &FrmOnv) -> f64 {
        if self.phase(src) {
            -1.0
        } else {
            1.0
        }
    }
}

/// Boson excitation with sorted mode indices. A mode may repeat, e.g.
/// `ann: [2, 2]` removes two bosons from mode 2.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BosConn {
    pub ann: Vec<usize>,
    pub cre: Vec<usize>,
}

impl BosConn {
    pub fn new(mut ann: Vec<usize>, mut cre: Vec<usize>) -> Self {
        ann.sort_unstable();
        cre.sort_unstable();
        Self { ann, cre }
    }

    pub fn cre_one(imode: usize) -> Self {
        Self { ann: vec![], cre: vec![imode] }
    }

    pub fn ann_one(imode: usize) -> Self {
        Self { ann: vec![imode], cre: vec![] }
    }

    pub fn exsig(&self) -> ExSig {
        ExSig::new(0, 0, self.cre.len() as u32, self.ann.len() as u32)
    }

    /// Net occupation change of each mode touched, ascending in mode index.
    pub fn deltas(&self) -> Vec<(usize, i64)> {
        let mut deltas: Vec<(usize, i64)> = Vec::new();
        let touched = self.ann.iter().map(|&n| (n, -1)).chain(self.cre.iter().map(|&n| (n, 1)));
        for (imode, d) in touched {
            match deltas.iter_mut().find(|(m, _)| *m == imode) {
                Some((_, acc)) => *acc += d,
                None => deltas.push((imode, d)),
            }
        }
        deltas.sort_unstable_by_key(|&(m, _)| m);
        deltas
    }

    /// True if the source has enough bosons to annihilate and the
    /// destination respects `occ_cutoff`.
    pub fn is_valid(&self, src: &BosOnv, occ_cutoff: u32) -> bool {
        self.deltas().into_iter().all(|(imode, d)| {
            let occ = src[imode] as i64 + d;
            let nann = self.ann.iter().filter(|&&n| n == imode).count() as i64;
            occ >= 0 && occ <= occ_cutoff as i64 && src[imode] as i64 >= nann
        })
    }

    pub fn apply(&self, src: &BosOnv) -> BosOnv {
        let mut dst = src.clone();
        for &n in &self.ann {
            debug_assert!(dst[n] > 0, "annihilating empty mode {n}");
            dst.set(n, dst[n] - 1);
        }
        for &n in &self.cre {
            dst.set(n, dst[n] + 1);
        }
        dst
    }

    /// Product of the bosonic ladder-operator factors `sqrt(n)` and
    /// `sqrt(n+1)` picked up by applying the annihilators then the creators.
    pub fn occ_factor(&self, src: &BosOnv) -> f64 {
        let mut work = src.clone();
        let mut fac = 1.0;
        for &n in &self.ann {
            fac *= (work[n] as f64).sqrt();
            work.set(n, work[n].saturating_sub(1));
        }
        for &n in &self.cre {
            fac *= (work[n] as f64 + 1.0).sqrt();
            work.set(n, work[n] + 1);
        }
        fac
    }
}

/// Mixed fermion-boson excitation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FrmBosConn {
    pub frm: FrmConn,
    pub bos: BosConn,
}

impl FrmBosConn {
    pub fn new(frm: FrmConn, bos: BosConn) -> Self {
        Self { frm, bos }
    }

    pub fn exsig(&self) -> ExSig {
        ExSig::new(
            self.frm.cre.len() as u32,
            self.frm.ann.len() as u32,
            self.bos.cre.len() as u32,
            self.bos.ann.len() as u32,
        )
    }

    pub fn apply(&self, src: &FrmBosOnv) -> FrmBosOnv {
        FrmBosOnv::new(self.frm.apply(&src.frm), self.bos.apply(&src.bos))
    }
}

impl From<FrmConn> for FrmBosConn {
    fn from(frm: FrmConn) -> Self {
        Self { frm, bos: BosConn::default() }
    }
}

impl From<BosConn> for FrmBosConn {
    fn from(bos: BosConn) -> Self {
        Self { frm: FrmConn::default(), bos }
    }
}
