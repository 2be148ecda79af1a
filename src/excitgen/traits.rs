//! Excitation generator traits.
//!
//! Provides `ExcitGen`, the contract every sampling strategy satisfies, and
//! `Mbf`, which dispatches a generic basis state to the right variant method.

use std::fmt::Debug;
use std::hash::Hash;

use crate::basis::{BosConn, BosOnv, CachedOrbs, ExSig, FrmBosConn, FrmBosOnv, FrmConn, FrmOnv, Particles};
use crate::sampling::Prng;

/// One proposed excitation.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal<C> {
    pub conn: C,
    /// Probability with which the generator proposes `conn` from the source.
    pub prob: f64,
    /// Coupling between source and destination, `None` if not computed yet.
    pub helem: Option<f64>,
}

/// Outcome of a single draw. `Rejected` is a normal result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Draw<C> {
    Proposed(Proposal<C>),
    Rejected,
}

impl<C> Draw<C> {
    pub fn proposed(conn: C, prob: f64, helem: Option<f64>) -> Self {
        Draw::Proposed(Proposal { conn, prob, helem })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Draw::Rejected)
    }

    pub fn proposal(self) -> Option<Proposal<C>> {
        match self {
            Draw::Proposed(p) => Some(p),
            Draw::Rejected => None,
        }
    }

    /// Convert the connection type, keeping probability and coupling.
    pub fn map_conn<D>(self, f: impl FnOnce(C) -> D) -> Draw<D> {
        match self {
            Draw::Proposed(p) => Draw::Proposed(Proposal { conn: f(p.conn), prob: p.prob, helem: p.helem }),
            Draw::Rejected => Draw::Rejected,
        }
    }
}

fn unsupported(desc: &str, what: &str) -> ! {
    panic!("excitation generator \"{desc}\" does not support {what}")
}

/// Excitation generator: proposes connections of a requested signature.
///
/// Generators are immutable after construction and shared by reference
/// between worker threads. All randomness comes from the `Prng` argument.
/// Each state variant has a `draw_*`, `prob_*` and `coupling_*` method; the
/// defaults panic, so a generator only implements the variants it supports.
/// The mixed-state defaults forward pure-fermion and pure-boson signatures
/// to the single-species methods.
pub trait ExcitGen: Send + Sync + Debug {
    /// Short diagnostic label.
    fn description(&self) -> &str;

    /// Signatures this generator can be asked for, one registry case each.
    fn exsigs(&self) -> &[ExSig];

    /// Cheap estimate of the number of reachable destinations.
    fn approx_nconn(&self, _exsig: ExSig, _particles: &Particles) -> usize {
        1
    }

    /// Draw from a fermion state.
    fn draw_frm(&self, _exsig: ExSig, _src: &FrmOnv, _orbs: &mut CachedOrbs, _rng: &mut Prng) -> Draw<FrmConn> {
        unsupported(self.description(), "fermion states")
    }

    /// Draw from a boson state.
    fn draw_bos(&self, _exsig: ExSig, _src: &BosOnv, _orbs: &mut CachedOrbs, _rng: &mut Prng) -> Draw<BosConn> {
        unsupported(self.description(), "boson states")
    }

    /// Draw from a fermion-boson state.
    fn draw_frmbos(&self, exsig: ExSig, src: &FrmBosOnv, orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<FrmBosConn> {
        if exsig.is_pure_frm() {
            self.draw_frm(exsig, &src.frm, orbs, rng).map_conn(FrmBosConn::from)
        } else if exsig.is_pure_bos() {
            self.draw_bos(exsig, &src.bos, orbs, rng).map_conn(FrmBosConn::from)
        } else {
            unsupported(self.description(), "mixed signatures")
        }
    }

    /// Probability that `draw_frm` proposes `conn` from `src`.
    fn prob_frm(&self, _src: &FrmOnv, _orbs: &mut CachedOrbs, _conn: &FrmConn) -> f64 {
        unsupported(self.description(), "fermion states")
    }

    fn prob_bos(&self, _src: &BosOnv, _orbs: &mut CachedOrbs, _conn: &BosConn) -> f64 {
        unsupported(self.description(), "boson states")
    }

    fn prob_frmbos(&self, src: &FrmBosOnv, orbs: &mut CachedOrbs, conn: &FrmBosConn) -> f64 {
        let exsig = conn.exsig();
        if exsig.is_pure_frm() {
            self.prob_frm(&src.frm, orbs, &conn.frm)
        } else if exsig.is_pure_bos() {
            self.prob_bos(&src.bos, orbs, &conn.bos)
        } else {
            unsupported(self.description(), "mixed signatures")
        }
    }

    /// Coupling between `src` and its connection, from the owning term.
    fn coupling_frm(&self, _src: &FrmOnv, _conn: &FrmConn) -> f64 {
        unsupported(self.description(), "fermion states")
    }

    fn coupling_bos(&self, _src: &BosOnv, _conn: &BosConn) -> f64 {
        unsupported(self.description(), "boson states")
    }

    fn coupling_frmbos(&self, src: &FrmBosOnv, conn: &FrmBosConn) -> f64 {
        let exsig = conn.exsig();
        if exsig.is_pure_frm() {
            self.coupling_frm(&src.frm, &conn.frm)
        } else if exsig.is_pure_bos() {
            self.coupling_bos(&src.bos, &conn.bos)
        } else {
            unsupported(self.description(), "mixed signatures")
        }
    }
}

/// Basis-state types the generators can act on.
pub trait Mbf: Clone + Debug + Hash + Eq + Send + Sync {
    type Conn: Clone + Debug + Hash + Eq + Send;

    fn draw(gen: &dyn ExcitGen, exsig: ExSig, src: &Self, orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<Self::Conn>;

    fn prob(gen: &dyn ExcitGen, src: &Self, orbs: &mut CachedOrbs, conn: &Self::Conn) -> f64;

    fn coupling(gen: &dyn ExcitGen, src: &Self, conn: &Self::Conn) -> f64;

    fn conn_exsig(conn: &Self::Conn) -> ExSig;

    fn apply(&self, conn: &Self::Conn) -> Self;

    fn particles(&self) -> Particles;
}

impl Mbf for FrmOnv {
    type Conn = FrmConn;

    fn draw(gen: &dyn ExcitGen, exsig: ExSig, src: &Self, orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<FrmConn> {
        gen.draw_frm(exsig, src, orbs, rng)
    }

    fn prob(gen: &dyn ExcitGen, src: &Self, orbs: &mut CachedOrbs, conn: &FrmConn) -> f64 {
        gen.prob_frm(src, orbs, conn)
    }

    fn coupling(gen: &dyn ExcitGen, src: &Self, conn: &FrmConn) -> f64 {
        gen.coupling_frm(src, conn)
    }

    fn conn_exsig(conn: &FrmConn) -> ExSig {
        conn.exsig()
    }

    fn apply(&self, conn: &FrmConn) -> Self {
        conn.apply(self)
    }

    fn particles(&self) -> Particles {
        Particles::of_frm(self)
    }
}

impl Mbf for BosOnv {
    type Conn = BosConn;

    fn draw(gen: &dyn ExcitGen, exsig: ExSig, src: &Self, orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<BosConn> {
        gen.draw_bos(exsig, src, orbs, rng)
    }

    fn prob(gen: &dyn ExcitGen, src: &Self, orbs: &mut CachedOrbs, conn: &BosConn) -> f64 {
        gen.prob_bos(src, orbs, conn)
    }

    fn coupling(gen: &dyn ExcitGen, src: &Self, conn: &BosConn) -> f64 {
        gen.coupling_bos(src, conn)
    }

    fn conn_exsig(conn: &BosConn) -> ExSig {
        conn.exsig()
    }

    fn apply(&self, conn: &BosConn) -> Self {
        conn.apply(self)
    }

    fn particles(&self) -> Particles {
        Particles::of_bos(self)
    }
}

impl Mbf for FrmBosOnv {
    type Conn = FrmBosConn;

    fn draw(gen: &dyn ExcitGen, exsig: ExSig, src: &Self, orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<FrmBosConn> {
        gen.draw_frmbos(exsig, src, orbs, rng)
    }

    fn prob(gen: &dyn ExcitGen, src: &Self, orbs: &mut CachedOrbs, conn: &FrmBosConn) -> f64 {
        gen.prob_frmbos(src, orbs, conn)
    }

    fn coupling(gen: &dyn ExcitGen, src: &Self, conn: &FrmBosConn) -> f64 {
        gen.coupling_frmbos(src, conn)
    }

    fn conn_exsig(conn: &FrmBosConn) -> ExSig {
        conn.exsig()
    }

    fn apply(&self, conn: &FrmBosConn) -> Self {
        conn.apply(self)
    }

    fn particles(&self) -> Particles {
        Particles::of_frmbos(self)
    }
}
