//! Occupation-number vectors (basis states) and their single-particle bases.
//!
//! Fermion spin orbitals are ordered spin-major: `ispinorb = ispin * nsite + isite`.

use std::ops::Index;

/// Fermionic single-particle basis: sites, with an abelian irrep label per site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrmBasis {
    pub nsite: usize,
    irreps: Vec<usize>,
    nirrep: usize,
}

impl FrmBasis {
    /// Basis without point-group information (every site in irrep 0).
    pub fn new(nsite: usize) -> Self {
        Self { nsite, irreps: vec![0; nsite], nirrep: 1 }
    }

    /// Basis with one irrep label per site. Products of irreps are taken as
    /// XOR, so `nirrep` is rounded up to a power of two.
    pub fn with_irreps(irreps: Vec<usize>) -> Self {
        let max = irreps.iter().copied().max().unwrap_or(0);
        Self {
            nsite: irreps.len(),
            irreps,
            nirrep: (max + 1).next_power_of_two(),
        }
    }

    pub fn nspinorb(&self) -> usize {
        2 * self.nsite
    }

    pub fn nirrep(&self) -> usize {
        self.nirrep
    }

    pub fn irrep(&self, isite: usize) -> usize {
        self.irreps[isite]
    }

    #[inline]
    pub fn isite(&self, ispinorb: usize) -> usize {
        ispinorb % self.nsite
    }

    #[inline]
    pub fn ispin(&self, ispinorb: usize) -> usize {
        ispinorb / self.nsite
    }

    #[inline]
    pub fn ispinorb(&self, ispin: usize, isite: usize) -> usize {
        debug_assert!(ispin < 2 && isite < self.nsite, "spin orbital OOB");
        ispin * self.nsite + isite
    }

    /// Number of distinct (spin, irrep) labels.
    pub fn nlabel(&self) -> usize {
        2 * self.nirrep
    }

    /// (spin, irrep) label of a spin orbital.
    #[inline]
    pub fn label(&self, ispinorb: usize) -> usize {
        self.ispin(ispinorb) * self.nirrep + self.irreps[self.isite(ispinorb)]
    }
}

/// Bosonic single-particle basis with a per-mode occupation cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BosBasis {
    pub nmode: usize,
    pub occ_cutoff: u32,
}

impl BosBasis {
    pub fn new(nmode: usize, occ_cutoff: u32) -> Self {
        Self { nmode, occ_cutoff }
    }
}

/// Fermion occupation vector stored as a bitset over spin orbitals.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrmOnv {
    nsite: usize,
    words: Vec<u64>,
}

impl FrmOnv {
    pub fn new(nsite: usize) -> Self {
        let nword = (2 * nsite).div_ceil(64);
        Self { nsite, words: vec![0; nword] }
    }

    /// State with the given spin orbitals occupied.
    pub fn from_occs(nsite: usize, occs: &[usize]) -> Self {
        let mut onv = Self::new(nsite);
        for &i in occs {
            onv.set(i);
        }
        onv
    }

    pub fn nsite(&self) -> usize {
        self.nsite
    }

    pub fn nspinorb(&self) -> usize {
        2 * self.nsite
    }

    #[inline]
    pub fn get(&self, i: usize) -> bool {
        assert!(i < self.nspinorb(), "spin orbital {i} OOB");
        self.words[i / 64] >> (i % 64) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, i: usize) {
        assert!(i < self.nspinorb(), "spin orbital {i} OOB");
        self.words[i / 64] |= 1 << (i % 64);
    }

    #[inline]
    pub fn clr(&mut self, i: usize) {
        assert!(i < self.nspinorb(), "spin orbital {i} OOB");
        self.words[i / 64] &= !(1 << (i % 64));
    }

    pub fn nelec(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Number of occupied spin orbitals with index below `i`.
    pub fn nset_below(&self, i: usize) -> usize {
        let (iword, ibit) = (i / 64, i % 64);
        let below: usize = self.words[..iword].iter().map(|w| w.count_ones() as usize).sum();
        let partial = if ibit == 0 { 0 } else { (self.words[iword] & ((1u64 << ibit) - 1)).count_ones() };
        below + partial as usize
    }

    /// Occupied spin orbitals in ascending order.
    pub fn occs(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(iword, &word)| {
            let mut w = word;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let ibit = w.trailing_zeros() as usize;
                w &= w - 1;
                Some(iword * 64 + ibit)
            })
        })
    }

    /// Number of electrons (0, 1 or 2) on a site.
    pub fn site_nocc(&self, isite: usize) -> u32 {
        self.get(isite) as u32 + self.get(isite + self.nsite) as u32
    }

    pub(crate) fn words(&self) -> &[u64] {
        &self.words
    }
}

/// Boson occupation vector: one occupation number per mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BosOnv {
    occs: Vec<u32>,
}

impl BosOnv {
    pub fn new(nmode: usize) -> Self {
        Self { occs: vec![0; nmode] }
    }

    pub fn from_occs(occs: Vec<u32>) -> Self {
        Self { occs }
    }

    pub fn nmode(&self) -> usize {
        self.occs.len()
    }

    pub fn nboson(&self) -> usize {
        self.occs.iter().map(|&n| n as usize).sum()
    }

    pub fn occs(&self) -> &[u32] {
        &self.occs
    }

    pub fn set(&mut self, imode: usize, occ: u32) {
        self.occs[imode] = occ;
    }
}

impl Index<usize> for BosOnv {
    type Output = u32;

    fn index(&self, imode: usize) -> &u32 {
        &self.occs[imode]
    }
}

/// Combined fermion-boson basis state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrmBosOnv {
    pub frm: FrmOnv,
    pub bos: BosOnv,
}

impl FrmBosOnv {
    pub fn new(frm: FrmOnv, bos: BosOnv) -> Self {
        Self { frm, bos }
    }
}

/// Particle-number data used for connection-count estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Particles {
    pub nalpha: usize,
    pub nbeta: usize,
    pub nboson: usize,
}

impl Particles {
    pub fn new(nalpha: usize, nbeta: usize, nboson: usize) -> Self {
        Self { nalpha, nbeta, nboson }
    }

    pub fn nelec(&self) -> usize {
        self.nalpha + self.nbeta
    }

    /// Number of same-spin electron pairs plus opposite-spin pairs.
    pub fn nelec_pair(&self) -> usize {
        let n = self.nelec();
        n * n.saturating_sub(1) / 2
    }

    pub fn of_frm(onv: &FrmOnv) -> Self {
        let nalpha = onv.occs().filter(|&i| i < onv.nsite()).count();
        Self::new(nalpha, onv.nelec() - nalpha, 0)
    }

    pub fn of_bos(onv: &BosOnv) -> Self {
        Self::new(0, 0, onv.nboson())
    }

    pub fn of_frmbos(onv: &FrmBosOnv) -> Self {
        Self { nboson: onv.bos.nboson(), ..Self::of_frm(&onv.frm) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frm_onv_bits() {
        let onv = FrmOnv::from_occs(4, &[0, 1, 4, 5]);
        assert_eq!(onv.nelec(), 4);
        assert_eq!(onv.occs().collect::<Vec<_>>(), vec![0, 1, 4, 5]);
        assert!(onv.get(4) && !onv.get(2));
        assert_eq!(onv.nset_below(4), 2);
        assert_eq!(onv.nset_below(5), 3);
        assert_eq!(onv.site_nocc(0), 2);
        assert_eq!(onv.site_nocc(2), 0);
    }

    #[test]
    fn test_frm_onv_spans_words() {
        let mut onv = FrmOnv::new(40);
        onv.set(3);
        onv.set(63);
        onv.set(64);
        onv.set(79);
        assert_eq!(onv.occs().collect::<Vec<_>>(), vec![3, 63, 64, 79]);
        assert_eq!(onv.nset_below(64), 2);
        assert_eq!(onv.nset_below(79), 3);
        onv.clr(63);
        assert_eq!(onv.nelec(), 3);
    }

    #[test]
    #[should_panic]
    fn test_frm_onv_oob() {
        let onv = FrmOnv::new(3);
        onv.get(6);
    }

    #[test]
    fn test_basis_labels() {
        let basis = FrmBasis::with_irreps(vec![0, 1, 0, 2]);
        assert_eq!(basis.nirrep(), 4);
        assert_eq!(basis.nlabel(), 8);
        assert_eq!(basis.label(1), 1);
        assert_eq!(basis.label(basis.ispinorb(1, 3)), 4 + 2);
        assert_eq!(basis.isite(5), 1);
        assert_eq!(basis.ispin(5), 1);
    }

    #[test]
    fn test_particles() {
        let onv = FrmBosOnv::new(FrmOnv::from_occs(3, &[0, 1, 4]), BosOnv::from_occs(vec![1, 0, 2]));
        let particles = Particles::of_frmbos(&onv);
        assert_eq!(particles, Particles::new(2, 1, 3));
        assert_eq!(particles.nelec_pair(), 3);
    }
}
