//! Boson creation and annihilation moves for electron-boson ladder terms.

use std::sync::Arc;

use crate::basis::{
    BosConn, BosOnv, CachedOrbs, ExSig, FrmBosConn, FrmBosOnv, FrmConn, Particles, EX_0001, EX_0010, EX_1101,
    EX_1110,
};
use crate::excitgen::{Draw, ExcitGen};
use crate::hamiltonian::{HolsteinLadderHam, HoppingLadderHam};
use crate::sampling::Prng;

/// The single boson operator of `bos`, with `true` for a creation.
fn bos_op(bos: &BosConn) -> Option<(usize, bool)> {
    match (bos.ann.as_slice(), bos.cre.as_slice()) {
        ([], &[n]) => Some((n, true)),
        (&[n], []) => Some((n, false)),
        _ => None,
    }
}

/// The boson operator of a pure ladder connection.
fn ladder_op(conn: &FrmBosConn) -> Option<(usize, bool)> {
    if !conn.frm.ann.is_empty() || !conn.frm.cre.is_empty() {
        return None;
    }
    bos_op(&conn.bos)
}

/// False if the move would annihilate from an empty mode or create beyond
/// the cutoff.
fn ladder_allowed(src: &BosOnv, imode: usize, create: bool, occ_cutoff: u32) -> bool {
    if create {
        src[imode] < occ_cutoff
    } else {
        src[imode] > 0
    }
}

/// The boson part of a move with signature `exsig` on mode `imode`, or
/// `None` if the occupation forbids it.
fn ladder_bos(src: &BosOnv, exsig: ExSig, imode: usize, occ_cutoff: u32) -> Option<BosConn> {
    let create = exsig.nbos_cre() == 1;
    debug_assert!(create != (exsig.nbos_ann() == 1), "not a single ladder operator: {exsig}");
    if !ladder_allowed(src, imode, create, occ_cutoff) {
        return None;
    }
    Some(if create { BosConn::cre_one(imode) } else { BosConn::ann_one(imode) })
}

fn ladder_conn(ham: &HolsteinLadderHam, src: &FrmBosOnv, exsig: ExSig, imode: usize) -> Option<FrmBosConn> {
    debug_assert!(exsig == EX_0010 || exsig == EX_0001);
    ladder_bos(&src.bos, exsig, imode, ham.bos_basis.occ_cutoff).map(FrmBosConn::from)
}

/// Same-spin entries of the spin-major sorted list `vac`.
fn same_spin(vac: &[usize], i: usize, nsite: usize) -> &[usize] {
    let split = vac.partition_point(|&a| a < nsite);
    if i < nsite {
        &vac[..split]
    } else {
        &vac[split..]
    }
}

/// Picks the boson mode uniformly.
#[derive(Debug)]
pub struct LadderPureUniform {
    ham: Arc<HolsteinLadderHam>,
}

impl LadderPureUniform {
    pub fn new(ham: Arc<HolsteinLadderHam>) -> Self {
        Self { ham }
    }
}

impl ExcitGen for LadderPureUniform {
    fn description(&self) -> &str {
        "ladder uniform mode"
    }

    fn exsigs(&self) -> &[ExSig] {
        &[EX_0010, EX_0001]
    }

    fn approx_nconn(&self, _exsig: ExSig, _particles: &Particles) -> usize {
        self.ham.nmode()
    }

    fn draw_frmbos(&self, exsig: ExSig, src: &FrmBosOnv, _orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<FrmBosConn> {
        self.ham.check_sites(src);
        let nmode = self.ham.nmode();
        let imode = rng.draw_uint(nmode);
        match ladder_conn(&self.ham, src, exsig, imode) {
            Some(conn) => {
                let helem = self.ham.get_element(src, &conn);
                Draw::proposed(conn, 1.0 / nmode as f64, Some(helem))
            }
            None => Draw::Rejected,
        }
    }

    fn prob_frmbos(&self, src: &FrmBosOnv, _orbs: &mut CachedOrbs, conn: &FrmBosConn) -> f64 {
        match ladder_op(conn) {
            Some((imode, create)) if ladder_allowed(&src.bos, imode, create, self.ham.bos_basis.occ_cutoff) => {
                1.0 / self.ham.nmode() as f64
            }
            _ => 0.0,
        }
    }

    fn coupling_frmbos(&self, src: &FrmBosOnv, conn: &FrmBosConn) -> f64 {
        self.ham.get_element(src, conn)
    }
}

/// Picks an electron uniformly and acts on the boson mode of its site, so
/// modes are chosen in proportion to the local electron count. Only valid
/// when the term has no uncoupled part.
#[derive(Debug)]
pub struct LadderPureDensity {
    ham: Arc<HolsteinLadderHam>,
}

impl LadderPureDensity {
    pub fn new(ham: Arc<HolsteinLadderHam>) -> Self {
        debug_assert!(ham.is_density_only(), "uncoupled ladder term present");
        Self { ham }
    }
}

impl ExcitGen for LadderPureDensity {
    fn description(&self) -> &str {
        "ladder density-weighted mode"
    }

    fn exsigs(&self) -> &[ExSig] {
        &[EX_0010, EX_0001]
    }

    fn approx_nconn(&self, _exsig: ExSig, particles: &Particles) -> usize {
        particles.nelec().min(self.ham.nmode())
    }

    fn draw_frmbos(&self, exsig: ExSig, src: &FrmBosOnv, orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<FrmBosConn> {
        self.ham.check_sites(src);
        let decoded = orbs.frm(&src.frm);
        let nelec = decoded.occ.len();
        if nelec == 0 {
            return Draw::Rejected;
        }
        // spin-major ordering: the site is the spin orbital modulo nsite
        let imode = decoded.occ[rng.draw_uint(nelec)] % src.frm.nsite();
        let prob = decoded.site_nocc[imode] as f64 / nelec as f64;
        match ladder_conn(&self.ham, src, exsig, imode) {
            Some(conn) => {
                let helem = self.ham.get_element(src, &conn);
                Draw::proposed(conn, prob, Some(helem))
            }
            None => Draw::Rejected,
        }
    }

    fn prob_frmbos(&self, src: &FrmBosOnv, orbs: &mut CachedOrbs, conn: &FrmBosConn) -> f64 {
        let Some((imode, create)) = ladder_op(conn) else {
            return 0.0;
        };
        self.ham.check_sites(src);
        if !ladder_allowed(&src.bos, imode, create, self.ham.bos_basis.occ_cutoff) {
            return 0.0;
        }
        let decoded = orbs.frm(&src.frm);
        if decoded.occ.is_empty() {
            return 0.0;
        }
        decoded.site_nocc[imode] as f64 / decoded.occ.len() as f64
    }

    fn coupling_frmbos(&self, src: &FrmBosOnv, conn: &FrmBosConn) -> f64 {
        self.ham.get_element(src, conn)
    }
}

/// Picks an electron uniformly, then a vacant spin orbital of the same spin
/// uniformly, then the boson mode uniformly.
#[derive(Debug)]
pub struct LadderHoppingUniform {
    ham: Arc<HoppingLadderHam>,
}

impl LadderHoppingUniform {
    pub fn new(ham: Arc<HoppingLadderHam>) -> Self {
        Self { ham }
    }
}

impl ExcitGen for LadderHoppingUniform {
    fn description(&self) -> &str {
        "ladder hopping uniform"
    }

    fn exsigs(&self) -> &[ExSig] {
        &[EX_1110, EX_1101]
    }

    /// Each electron hops along any bond, coupling to the mode at either end.
    fn approx_nconn(&self, _exsig: ExSig, particles: &Particles) -> usize {
        particles.nelec() * self.ham.lattice().max_coordination() * 2
    }

    fn draw_frmbos(&self, exsig: ExSig, src: &FrmBosOnv, orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<FrmBosConn> {
        debug_assert!(exsig == EX_1110 || exsig == EX_1101);
        self.ham.check_sites(src);
        let nsite = src.frm.nsite();
        let nmode = self.ham.nmode();
        let decoded = orbs.frm(&src.frm);
        let nelec = decoded.occ.len();
        if nelec == 0 {
            return Draw::Rejected;
        }
        let i = decoded.occ[rng.draw_uint(nelec)];
        let vac = same_spin(&decoded.vac, i, nsite);
        if vac.is_empty() {
            return Draw::Rejected;
        }
        let a = vac[rng.draw_uint(vac.len())];
        let prob = 1.0 / (nelec * vac.len() * nmode) as f64;
        let imode = rng.draw_uint(nmode);
        let Some(bos) = ladder_bos(&src.bos, exsig, imode, self.ham.bos_basis.occ_cutoff) else {
            return Draw::Rejected;
        };
        let conn = FrmBosConn::new(FrmConn::single(i, a), bos);
        let helem = self.ham.get_element(src, &conn);
        Draw::proposed(conn, prob, Some(helem))
    }

    fn prob_frmbos(&self, src: &FrmBosOnv, orbs: &mut CachedOrbs, conn: &FrmBosConn) -> f64 {
        let (&[i], &[a]) = (conn.frm.ann.as_slice(), conn.frm.cre.as_slice()) else {
            return 0.0;
        };
        let Some((imode, create)) = bos_op(&conn.bos) else {
            return 0.0;
        };
        self.ham.check_sites(src);
        let nsite = src.frm.nsite();
        if !src.frm.get(i) || src.frm.get(a) || (i < nsite) != (a < nsite) {
            return 0.0;
        }
        if !ladder_allowed(&src.bos, imode, create, self.ham.bos_basis.occ_cutoff) {
            return 0.0;
        }
        let decoded = orbs.frm(&src.frm);
        let nvac = same_spin(&decoded.vac, i, nsite).len();
        1.0 / (decoded.occ.len() * nvac * self.ham.nmode()) as f64
    }

    fn coupling_frmbos(&self, src: &FrmBosOnv, conn: &FrmBosConn) -> f64 {
        self.ham.get_element(src, conn)
    }
}
