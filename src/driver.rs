//! Block driver: repeated spawning attempts from one source state, fanned
//! out over rayon workers, with case reweighting between blocks.
//!
//! Each attempt selects a case, draws from its generator and forms the
//! contribution `H / p`. Here `p` sums the probability of proposing the
//! connection over every case sharing its exsig, and `H` sums the element
//! over every term with a case of that exsig. The mean contribution per
//! attempt is then an unbiased estimate of the sum of the off-diagonal row
//! of the Hamiltonian at the source state.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::basis::{BosBasis, BosOnv, CachedOrbs, FrmBasis, FrmBosOnv, FrmOnv, Particles};
use crate::error::ConfigError;
use crate::excitgen::{CaseRegistry, CaseWeights, Draw, MagnitudeLogger, Mbf, Proposal};
use crate::hamiltonian::{
    FrmHam, GeneralFrmHam, HamTerm, HolsteinLadderHam, HoppingLadderHam, HubbardFrmHam, Lattice,
    SumConservingBosHam,
};
use crate::io::{RunConfig, TermConfig};
use crate::sampling::Prng;

/// Terms and source state assembled from a configuration.
#[derive(Debug)]
pub struct System {
    pub terms: Vec<Arc<dyn HamTerm>>,
    /// Fermion basis the orbital caches are built for.
    pub frm_basis: FrmBasis,
    pub src: FrmBosOnv,
}

impl System {
    pub fn from_config(config: &RunConfig) -> Result<Self, ConfigError> {
        let mut frm_basis: Option<FrmBasis> = None;
        let mut terms: Vec<Arc<dyn HamTerm>> = Vec::new();

        // fermion terms first: they fix the number of sites
        for term in &config.terms {
            let basis = match term {
                TermConfig::Hubbard { dims, periodic, t, u } => {
                    let ham = HubbardFrmHam::new(Lattice::hypercubic(dims, *periodic), *t, *u);
                    let basis = ham.basis().clone();
                    terms.push(Arc::new(ham));
                    basis
                }
                TermConfig::General { irreps, scale, seed } => {
                    let mut rng = Prng::from_seed(*seed);
                    let ham = GeneralFrmHam::random(FrmBasis::with_irreps(irreps.clone()), *scale, &mut rng)?;
                    let basis = ham.basis().clone();
                    terms.push(Arc::new(ham));
                    basis
                }
                _ => continue,
            };
            frm_basis = Some(match frm_basis {
                None => basis,
                Some(prev) if prev.nsite != basis.nsite => {
                    return Err(invalid("terms", format!("fermion terms disagree on nsite: {} vs {}", prev.nsite, basis.nsite)));
                }
                // keep whichever basis carries symmetry labels
                Some(prev) if prev.nirrep() >= basis.nirrep() => prev,
                Some(_) => basis,
            });
        }
        let frm_basis = frm_basis.unwrap_or_else(|| FrmBasis::new(0));
        let nsite = frm_basis.nsite;

        let mut bos_basis: Option<BosBasis> = None;
        for term in &config.terms {
            let basis = match term {
                TermConfig::Holstein { g, v_unc, occ_cutoff } => {
                    if nsite == 0 {
                        return Err(invalid("terms", "a Holstein term needs a fermion term to define the sites"));
                    }
                    let basis = BosBasis::new(nsite, *occ_cutoff);
                    terms.push(Arc::new(HolsteinLadderHam::new(basis, *g, v_unc.clone())?));
                    basis
                }
                TermConfig::BosonSum { nmode, v, occ_cutoff } => {
                    let basis = BosBasis::new(*nmode, *occ_cutoff);
                    terms.push(Arc::new(SumConservingBosHam::new(basis, *v)));
                    basis
                }
                TermConfig::LadderHopping { dims, periodic, g, occ_cutoff } => {
                    let ham = HoppingLadderHam::new(Lattice::hypercubic(dims, *periodic), *g, *occ_cutoff);
                    if ham.nsite() != nsite {
                        return Err(invalid(
                            "terms",
                            format!("ladder hopping lattice has {} sites, fermion terms have {nsite}", ham.nsite()),
                        ));
                    }
                    let basis = ham.bos_basis;
                    terms.push(Arc::new(ham));
                    basis
                }
                _ => continue,
            };
            bos_basis = Some(match bos_basis {
                Some(prev) if prev.nmode != basis.nmode => {
                    return Err(invalid("terms", format!("boson terms disagree on nmode: {} vs {}", prev.nmode, basis.nmode)));
                }
                Some(prev) => BosBasis::new(prev.nmode, prev.occ_cutoff.min(basis.occ_cutoff)),
                None => basis,
            });
        }

        let src = Self::source_state(config, nsite, bos_basis.as_ref())?;
        Ok(Self { terms, frm_basis, src })
    }

    fn source_state(config: &RunConfig, nsite: usize, bos_basis: Option<&BosBasis>) -> Result<FrmBosOnv, ConfigError> {
        let state = &config.state;
        if let Some(&i) = state.frm.iter().find(|&&i| i >= 2 * nsite) {
            return Err(invalid("state.frm", format!("spin orbital {i} out of range for {nsite} sites")));
        }
        let frm = FrmOnv::from_occs(nsite, &state.frm);
        if frm.nelec() != state.frm.len() {
            return Err(invalid("state.frm", "repeated spin orbital"));
        }

        let (nmode, cutoff) = bos_basis.map_or((0, 0), |b| (b.nmode, b.occ_cutoff));
        let bos = if state.bos.is_empty() {
            BosOnv::new(nmode)
        } else if state.bos.len() != nmode {
            return Err(invalid("state.bos", format!("expected {nmode} occupations, found {}", state.bos.len())));
        } else if let Some(&n) = state.bos.iter().find(|&&n| n > cutoff) {
            return Err(invalid("state.bos", format!("occupation {n} exceeds the cutoff {cutoff}")));
        } else {
            BosOnv::from_occs(state.bos.clone())
        };
        Ok(FrmBosOnv::new(frm, bos))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}

/// Accumulated results of the attempts of one block.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlockStats {
    pub nattempt: u64,
    pub nrejected: u64,
    /// Sum of `H / p` over successful draws.
    pub sum_contrib: f64,
    pub sum_abs_contrib: f64,
    pub sum_sq_contrib: f64,
}

impl BlockStats {
    fn merge(self, other: Self) -> Self {
        Self {
            nattempt: self.nattempt + other.nattempt,
            nrejected: self.nrejected + other.nrejected,
            sum_contrib: self.sum_contrib + other.sum_contrib,
            sum_abs_contrib: self.sum_abs_contrib + other.sum_abs_contrib,
            sum_sq_contrib: self.sum_sq_contrib + other.sum_sq_contrib,
        }
    }

    /// Estimate of the off-diagonal row sum.
    pub fn mean_contrib(&self) -> f64 {
        if self.nattempt == 0 {
            0.0
        } else {
            self.sum_contrib / self.nattempt as f64
        }
    }

    /// Standard error of [`Self::mean_contrib`].
    pub fn std_error(&self) -> f64 {
        if self.nattempt < 2 {
            return 0.0;
        }
        let n = self.nattempt as f64;
        let mean = self.mean_contrib();
        ((self.sum_sq_contrib / n - mean * mean).max(0.0) / (n - 1.0)).sqrt()
    }

    pub fn rejection_rate(&self) -> f64 {
        if self.nattempt == 0 {
            0.0
        } else {
            self.nrejected as f64 / self.nattempt as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub blocks: Vec<BlockStats>,
    /// Case probabilities in force at the end of the run.
    pub final_probs: Vec<f64>,
}

impl RunSummary {
    /// All blocks pooled.
    pub fn total(&self) -> BlockStats {
        self.blocks.iter().fold(BlockStats::default(), |acc, b| acc.merge(*b))
    }
}

/// One worker's share of a block.
fn run_worker<M: Mbf>(
    registry: &CaseRegistry,
    src: &M,
    mut orbs: CachedOrbs,
    nattempt: usize,
    rng: &mut Prng,
) -> (BlockStats, MagnitudeLogger) {
    let mut stats = BlockStats::default();
    let mut logger = MagnitudeLogger::new(registry.ncase());
    for _ in 0..nattempt {
        stats.nattempt += 1;
        let icase = registry.select_case(rng);
        let (conn, prob, helem) = match registry.draw_h(icase, src, &mut orbs, rng) {
            Draw::Rejected => {
                stats.nrejected += 1;
                continue;
            }
            Draw::Proposed(Proposal { conn, prob, helem: Some(helem) }) => (conn, prob, helem),
            Draw::Proposed(_) => unreachable!("draw_h always fills the coupling"),
        };
        logger.log(icase, helem, prob, registry.prob(icase));
        let prob_total = registry.combined_prob(icase, src, &mut orbs, prob, &conn);
        let helem_total = registry.combined_coupling(icase, src, &conn, helem);
        let contrib = helem_total / prob_total;
        stats.sum_contrib += contrib;
        stats.sum_abs_contrib += contrib.abs();
        stats.sum_sq_contrib += contrib * contrib;
    }
    (stats, logger)
}

/// Run one block over `nworker` rayon tasks.
pub fn run_block(
    registry: &CaseRegistry,
    system: &System,
    nattempt: usize,
    seed: u64,
    iblock: usize,
    nworker: usize,
) -> (BlockStats, MagnitudeLogger) {
    let ncase = registry.ncase();
    (0..nworker)
        .into_par_iter()
        .map(|iworker| {
            let mut rng = Prng::for_thread(seed, iblock * nworker + iworker);
            let orbs = CachedOrbs::new(&system.frm_basis);
            run_worker(registry, &system.src, orbs, nattempt, &mut rng)
        })
        .reduce(
            || (BlockStats::default(), MagnitudeLogger::new(ncase)),
            |(sa, la), (sb, lb)| (sa.merge(sb), la.merge(lb)),
        )
}

/// Build the registry from `config` and run all blocks.
pub fn run(config: &RunConfig) -> Result<RunSummary, ConfigError> {
    let system = System::from_config(config)?;
    let particles = Particles::of_frmbos(&system.src);
    let init = config.case_weights.resolve(&particles);
    let mut registry = CaseRegistry::new(&system.terms, &config.excitgen, init, config.floor)?;
    info!(ncase = registry.ncase(), nelec = particles.nelec(), nboson = particles.nboson, "built case registry");
    registry.log_breakdown();

    let nworker = rayon::current_num_threads();
    let mut blocks = Vec::with_capacity(config.nblock);
    for iblock in 0..config.nblock {
        let (stats, logger) = run_block(&registry, &system, config.nattempt, config.seed, iblock, nworker);
        info!(
            iblock,
            nattempt = stats.nattempt,
            rejection_rate = stats.rejection_rate(),
            mean_contrib = stats.mean_contrib(),
            "block done"
        );
        blocks.push(stats);

        if config.static_probs {
            continue;
        }
        match logger.suggest_weights(&registry, config.min_case_prob, config.ndraw_min) {
            Some(weights) => {
                registry.reweight(CaseWeights::Explicit(weights))?;
                registry.log_breakdown();
            }
            None => debug!(iblock, "too few draws per case to reweight"),
        }
    }
    Ok(RunSummary { blocks, final_probs: registry.probs().to_vec() })
}
