//! Brute-force checker for excitation generators.
//!
//! Every structurally valid connection of one signature from a fixed source
//! state goes into a table together with its coupling. Repeated draws
//! then accumulate `1/prob` per connection: for an unbiased generator the
//! accumulated weight divided by the number of draws tends to 1 for every
//! connection with a non-zero coupling.

use std::collections::HashMap;

use crate::basis::{BosConn, BosOnv, CachedOrbs, ExSig, FrmBosConn, FrmBosOnv, FrmConn, FrmOnv, Particles};
use crate::excitgen::{Draw, ExcitGen, Mbf};
use crate::sampling::Prng;

/// Couplings below this are treated as structural zeros.
const HELEM_TOL: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
struct Entry {
    helem: f64,
    nocc: u64,
    weight: f64,
}

pub(crate) struct ExcitGenTester<'a, M: Mbf> {
    gen: &'a dyn ExcitGen,
    exsig: ExSig,
    src: M,
    orbs: CachedOrbs,
    table: HashMap<M::Conn, Entry>,
    nrejected: u64,
}

impl<'a, M: Mbf> ExcitGenTester<'a, M> {
    pub(crate) fn new(gen: &'a dyn ExcitGen, exsig: ExSig, src: M, conns: Vec<M::Conn>, orbs: CachedOrbs) -> Self {
        let table = conns
            .into_iter()
            .map(|conn| {
                let helem = M::coupling(gen, &src, &conn);
                (conn, Entry { helem, nocc: 0, weight: 0.0 })
            })
            .collect();
        Self { gen, exsig, src, orbs, table, nrejected: 0 }
    }

    /// Draw `ndraw` times, checking every proposal against the table.
    pub(crate) fn run(&mut self, ndraw: u64, rng: &mut Prng) {
        for _ in 0..ndraw {
            let proposal = match M::draw(self.gen, self.exsig, &self.src, &mut self.orbs, rng) {
                Draw::Rejected => {
                    self.nrejected += 1;
                    continue;
                }
                Draw::Proposed(p) => p,
            };
            assert_eq!(M::conn_exsig(&proposal.conn), self.exsig, "wrong signature for {:?}", proposal.conn);
            assert!(proposal.prob > 0.0 && proposal.prob <= 1.0, "bad probability {}", proposal.prob);
            let prob = M::prob(self.gen, &self.src, &mut self.orbs, &proposal.conn);
            assert!(
                (prob - proposal.prob).abs() <= 1e-10 * proposal.prob,
                "drawn probability {} differs from computed {prob} for {:?}",
                proposal.prob,
                proposal.conn
            );
            let entry = self
                .table
                .get_mut(&proposal.conn)
                .unwrap_or_else(|| panic!("{:?} is not a valid connection", proposal.conn));
            if let Some(helem) = proposal.helem {
                assert!((helem - entry.helem).abs() < 1e-10, "drawn coupling {helem} vs {}", entry.helem);
            }
            entry.nocc += 1;
            entry.weight += 1.0 / proposal.prob;
        }
    }

    fn coupled(&self) -> impl Iterator<Item = &Entry> {
        self.table.values().filter(|e| e.helem.abs() > HELEM_TOL)
    }

    pub(crate) fn nconn_coupled(&self) -> usize {
        self.coupled().count()
    }

    pub(crate) fn nrejected(&self) -> u64 {
        self.nrejected
    }

    /// Every connection with a non-zero coupling has been drawn.
    pub(crate) fn all_drawn_at_least_once(&self) -> bool {
        self.coupled().all(|e| e.nocc > 0)
    }

    /// Mean of `|weight/ndraw - 1|` over the coupled connections, where
    /// `ndraw` is the total number of draws so far.
    pub(crate) fn mean_abs_error(&self, ndraw: u64) -> f64 {
        let n = self.nconn_coupled();
        assert!(n > 0, "no coupled connections");
        self.coupled().map(|e| (e.weight / ndraw as f64 - 1.0).abs()).sum::<f64>() / n as f64
    }

    /// Every coupled connection has a normalized weight within `tol` of 1.
    pub(crate) fn all_correct_weights(&self, ndraw: u64, tol: f64) -> bool {
        self.coupled().all(|e| (e.weight / ndraw as f64 - 1.0).abs() < tol)
    }

    /// Draw `ndraw` times and then `15 * ndraw` more, asserting that every
    /// coupled connection shows up, that the error shrinks, and that the
    /// final weights are within 5% of 1.
    pub(crate) fn assert_unbiased(&mut self, ndraw: u64, rng: &mut Prng) {
        self.run(ndraw, rng);
        let mae_short = self.mean_abs_error(ndraw);
        self.run(15 * ndraw, rng);
        let ntotal = 16 * ndraw;
        assert!(self.all_drawn_at_least_once(), "{} missed a coupled connection", self.gen.description());
        let mae_long = self.mean_abs_error(ntotal);
        assert!(mae_long < mae_short, "error did not decrease: {mae_short} -> {mae_long}");
        assert!(self.all_correct_weights(ntotal, 0.05), "weights off for {}", self.gen.description());
    }
}

/// Generator that only declares signatures, for registry bookkeeping tests.
#[derive(Debug)]
pub(crate) struct StubGen {
    exsigs: Vec<ExSig>,
    nconn: usize,
}

impl StubGen {
    pub(crate) fn new(exsigs: &[ExSig], nconn: usize) -> Self {
        Self { exsigs: exsigs.to_vec(), nconn }
    }
}

impl ExcitGen for StubGen {
    fn description(&self) -> &str {
        "stub"
    }

    fn exsigs(&self) -> &[ExSig] {
        &self.exsigs
    }

    fn approx_nconn(&self, _exsig: ExSig, _particles: &Particles) -> usize {
        self.nconn
    }
}

fn combinations(items: &[usize], k: usize) -> Vec<Vec<usize>> {
    if k == 0 {
        return vec![vec![]];
    }
    let mut out = Vec::new();
    for (n, &first) in items.iter().enumerate() {
        for mut rest in combinations(&items[n + 1..], k - 1) {
            rest.insert(0, first);
            out.push(rest);
        }
    }
    out
}

/// Non-decreasing mode sequences of length `k`, each mode used at most
/// `limit(mode)` times.
fn multisets(nmode: usize, k: usize, limit: &dyn Fn(usize) -> usize, start: usize) -> Vec<Vec<usize>> {
    if k == 0 {
        return vec![vec![]];
    }
    let mut out = Vec::new();
    for imode in start..nmode {
        for mut rest in multisets(nmode, k - 1, limit, imode) {
            rest.insert(0, imode);
            if rest.iter().filter(|&&m| m == imode).count() <= limit(imode) {
                out.push(rest);
            }
        }
    }
    out
}

/// All fermion connections annihilating `nann` and creating `ncre`.
pub(crate) fn frm_conns(src: &FrmOnv, nann: usize, ncre: usize) -> Vec<FrmConn> {
    let occ: Vec<usize> = src.occs().collect();
    let vac: Vec<usize> = (0..src.nspinorb()).filter(|&p| !src.get(p)).collect();
    let mut conns = Vec::new();
    for ann in combinations(&occ, nann) {
        for cre in combinations(&vac, ncre) {
            conns.push(FrmConn { ann: ann.clone(), cre });
        }
    }
    conns
}

/// All boson connections respecting the source occupations and
/// `occ_cutoff`, with no mode both annihilated and created.
pub(crate) fn bos_conns(src: &BosOnv, nann: usize, ncre: usize, occ_cutoff: u32) -> Vec<BosConn> {
    let nmode = src.nmode();
    let anns = multisets(nmode, nann, &|m| src[m] as usize, 0);
    let cres = multisets(nmode, ncre, &|_| usize::MAX, 0);
    let mut conns = Vec::new();
    for ann in &anns {
        for cre in &cres {
            if cre.iter().any(|m| ann.contains(m)) {
                continue;
            }
            let conn = BosConn { ann: ann.clone(), cre: cre.clone() };
            if conn.is_valid(src, occ_cutoff) {
                conns.push(conn);
            }
        }
    }
    conns
}

pub(crate) fn frmbos_conns(src: &FrmBosOnv, exsig: ExSig, occ_cutoff: u32) -> Vec<FrmBosConn> {
    let frm = frm_conns(&src.frm, exsig.nfrm_ann() as usize, exsig.nfrm_cre() as usize);
    let bos = bos_conns(&src.bos, exsig.nbos_ann() as usize, exsig.nbos_cre() as usize, occ_cutoff);
    let mut conns = Vec::with_capacity(frm.len() * bos.len());
    for f in &frm {
        for b in &bos {
            conns.push(FrmBosConn::new(f.clone(), b.clone()));
        }
    }
    conns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerators() {
        let src = FrmOnv::from_occs(3, &[0, 3]);
        assert_eq!(frm_conns(&src, 1, 1).len(), 2 * 4);
        assert_eq!(frm_conns(&src, 2, 2).len(), 6);

        let src = BosOnv::from_occs(vec![2, 0, 1]);
        let conns = bos_conns(&src, 2, 2, 2);
        // {2,2} would put three bosons in mode 2
        assert!(conns.contains(&BosConn::new(vec![0, 0], vec![1, 1])));
        assert!(conns.contains(&BosConn::new(vec![0, 0], vec![1, 2])));
        assert!(!conns.contains(&BosConn::new(vec![0, 0], vec![2, 2])));
        assert!(conns.contains(&BosConn::new(vec![0, 2], vec![1, 1])));
        assert_eq!(conns.len(), 3);
        assert_eq!(bos_conns(&src, 0, 1, 2).len(), 2);
    }
}
