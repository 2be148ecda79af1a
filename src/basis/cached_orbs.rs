//! Lazily decoded occupied/vacant orbital lists of the current source state.
//!
//! Every worker owns one [`CachedOrbs`] and calls [`CachedOrbs::clear`] when it
//! moves to a new source state. Debug builds fingerprint the state each
//! decoded view was built from and panic on a stale read.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::onv::{BosOnv, FrmBasis, FrmOnv};

/// Decoded fermion occupation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrmDecoded {
    pub occ: Vec<usize>,
    pub vac: Vec<usize>,
    /// Occupied spin orbitals partitioned by (spin, irrep) label.
    pub occ_by_label: Vec<Vec<usize>>,
    pub vac_by_label: Vec<Vec<usize>>,
    /// Labels with at least one occupied and one vacant spin orbital.
    pub nonempty_labels: Vec<usize>,
    /// Sites holding both an alpha and a beta electron.
    pub doubly_occ_sites: Vec<usize>,
    pub site_nocc: Vec<u32>,
}

impl FrmDecoded {
    fn decode(src: &FrmOnv, basis: Option<&FrmBasis>) -> Self {
        let nsite = src.nsite();
        let default_basis;
        let basis = match basis {
            Some(b) => {
                assert_eq!(b.nsite, nsite, "basis does not match source state");
                b
            }
            None => {
                default_basis = FrmBasis::new(nsite);
                &default_basis
            }
        };

        let nlabel = basis.nlabel();
        let mut decoded = Self {
            occ: Vec::with_capacity(src.nelec()),
            vac: Vec::with_capacity(src.nspinorb() - src.nelec()),
            occ_by_label: vec![Vec::new(); nlabel],
            vac_by_label: vec![Vec::new(); nlabel],
            nonempty_labels: Vec::new(),
            doubly_occ_sites: Vec::new(),
            site_nocc: vec![0; nsite],
        };
        for ispinorb in 0..src.nspinorb() {
            let label = basis.label(ispinorb);
            if src.get(ispinorb) {
                decoded.occ.push(ispinorb);
                decoded.occ_by_label[label].push(ispinorb);
                decoded.site_nocc[basis.isite(ispinorb)] += 1;
            } else {
                decoded.vac.push(ispinorb);
                decoded.vac_by_label[label].push(ispinorb);
            }
        }
        decoded.nonempty_labels = (0..nlabel)
            .filter(|&l| !decoded.occ_by_label[l].is_empty() && !decoded.vac_by_label[l].is_empty())
            .collect();
        decoded.doubly_occ_sites = (0..nsite).filter(|&s| decoded.site_nocc[s] == 2).collect();
        decoded
    }
}

/// Decoded boson occupation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BosDecoded {
    /// Modes with non-zero occupation.
    pub occ_modes: Vec<usize>,
    /// Every mode repeated by its occupation, e.g. `[2, 0, 1] -> [0, 0, 2]`.
    pub expanded: Vec<usize>,
}

impl BosDecoded {
    fn decode(src: &BosOnv) -> Self {
        let mut occ_modes = Vec::new();
        let mut expanded = Vec::with_capacity(src.nboson());
        for (imode, &n) in src.occs().iter().enumerate() {
            if n > 0 {
                occ_modes.push(imode);
                expanded.extend(std::iter::repeat(imode).take(n as usize));
            }
        }
        Self { occ_modes, expanded }
    }
}

#[derive(Debug, Default)]
pub struct CachedOrbs {
    basis: Option<FrmBasis>,
    frm: Option<FrmDecoded>,
    bos: Option<BosDecoded>,
    frm_fingerprint: Option<u64>,
    bos_fingerprint: Option<u64>,
    ndecode: usize,
}

fn fingerprint<T: Hash>(state: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    state.hash(&mut hasher);
    hasher.finish()
}

/// Record the fingerprint on first use, panic if it changes before `clear`.
fn check_fingerprint<T: Hash>(slot: &mut Option<u64>, state: &T) {
    let fp = fingerprint(state);
    match *slot {
        Some(stored) => assert_eq!(stored, fp, "stale cached orbitals: clear() was not called after the source state changed"),
        None => *slot = Some(fp),
    }
}

impl CachedOrbs {
    /// Cache that partitions spin orbitals by the irreps of `basis`.
    pub fn new(basis: &FrmBasis) -> Self {
        Self { basis: Some(basis.clone()), ..Self::default() }
    }

    /// Forget everything decoded so far.
    pub fn clear(&mut self) {
        self.frm = None;
        self.bos = None;
        self.frm_fingerprint = None;
        self.bos_fingerprint = None;
    }

    /// Number of decodes performed since construction.
    pub fn ndecode(&self) -> usize {
        self.ndecode
    }

    pub fn frm(&mut self, src: &FrmOnv) -> &FrmDecoded {
        if cfg!(debug_assertions) {
            check_fingerprint(&mut self.frm_fingerprint, src);
        }
        let basis = self.basis.as_ref();
        let ndecode = &mut self.ndecode;
        self.frm.get_or_insert_with(|| {
            *ndecode += 1;
            FrmDecoded::decode(src, basis)
        })
    }

    pub fn bos(&mut self, src: &BosOnv) -> &BosDecoded {
        if cfg!(debug_assertions) {
            check_fingerprint(&mut self.bos_fingerprint, src);
        }
        let ndecode = &mut self.ndecode;
        self.bos.get_or_insert_with(|| {
            *ndecode += 1;
            BosDecoded::decode(src)
        })
    }
}
