//! Rust ExcitGen - stochastic excitation generation for projector Monte Carlo
//!
//! This crate provides the alias-method case sampler, the excitation
//! generator contract with several concrete strategies, and a registry that
//! selects between them with dynamically tuned probabilities.

pub mod basis;
pub mod driver;
pub mod error;
pub mod excitgen;
pub mod hamiltonian;
pub mod io;
pub mod sampling;

// Re-export commonly used types at crate root
pub use basis::{BosOnv, CachedOrbs, ExSig, FrmBosOnv, FrmOnv, Particles};
pub use driver::{run, BlockStats, RunSummary, System};
pub use error::{ConfigError, SamplerError};
pub use excitgen::{CaseRegistry, CaseWeights, Draw, ExcitGen, MagnitudeLogger, Mbf, Proposal};
pub use hamiltonian::{ExcitGenOpts, HamTerm};
pub use io::{read_config, RunConfig};
pub use sampling::{Prng, WeightedSampler, DEFAULT_FLOOR};

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::basis::{BosBasis, FrmBasis, EX_0001, EX_0010, EX_0022, EX_1101, EX_1110, EX_DOUBLE, EX_SINGLE};
    use crate::hamiltonian::{
        GeneralFrmHam, HolsteinLadderHam, HoppingLadderHam, HubbardFrmHam, Lattice, SumConservingBosHam,
    };
    use crate::*;

    #[test]
    fn test_sample_config_runs() {
        let mut config = read_config(concat!(env!("CARGO_MANIFEST_DIR"), "/config.yml")).unwrap();
        config.nblock = 2;
        config.nattempt = 2_000;
        let summary = run(&config).unwrap();
        assert_eq!(summary.blocks.len(), 2);
        assert_eq!(summary.final_probs.len(), 5);
        assert!((summary.final_probs.iter().sum::<f64>() - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_registry_over_every_term() {
        let mut rng = Prng::from_seed(3);
        let general = GeneralFrmHam::random(FrmBasis::with_irreps(vec![0, 1, 1, 0]), 0.3, &mut rng).unwrap();
        let terms: Vec<Arc<dyn HamTerm>> = vec![
            Arc::new(HubbardFrmHam::new(Lattice::hypercubic(&[2, 2], false), 1.0, 2.0)),
            Arc::new(general),
            Arc::new(HolsteinLadderHam::new(BosBasis::new(4, 2), 0.3, vec![]).unwrap()),
            Arc::new(SumConservingBosHam::new(BosBasis::new(4, 2), 0.7)),
            Arc::new(HoppingLadderHam::new(Lattice::hypercubic(&[2, 2], false), 0.4, 2)),
        ];
        let opts = ExcitGenOpts { hubbard_prefer_double_occ: true, ladder_density: true, ..Default::default() };
        let registry = CaseRegistry::new(&terms, &opts, CaseWeights::Uniform, DEFAULT_FLOOR).unwrap();
        let exsigs: Vec<ExSig> = (0..registry.ncase()).map(|icase| registry.case(icase).exsig).collect();
        assert_eq!(exsigs, vec![EX_SINGLE, EX_SINGLE, EX_DOUBLE, EX_0010, EX_0001, EX_0022, EX_1110, EX_1101]);

        let src = FrmBosOnv::new(FrmOnv::from_occs(4, &[0, 1, 4, 6]), BosOnv::from_occs(vec![1, 0, 2, 0]));
        let mut orbs = CachedOrbs::new(&FrmBasis::with_irreps(vec![0, 1, 1, 0]));
        let mut counts: HashMap<ExSig, usize> = HashMap::new();
        for _ in 0..20_000 {
            let icase = registry.select_case(&mut rng);
            if let Draw::Proposed(p) = registry.draw_h(icase, &src, &mut orbs, &mut rng) {
                assert_eq!(p.conn.exsig(), registry.case(icase).exsig);
                let prob = registry.combined_prob(icase, &src, &mut orbs, p.prob, &p.conn);
                assert!(prob > 0.0 && prob <= 1.0);
                assert!(registry.combined_coupling(icase, &src, &p.conn, p.helem.unwrap_or_default()).is_finite());
                *counts.entry(p.conn.exsig()).or_default() += 1;
            }
        }
        for exsig in [EX_SINGLE, EX_DOUBLE, EX_0010, EX_0001, EX_0022, EX_1110, EX_1101] {
            assert!(counts.get(&exsig).copied().unwrap_or(0) > 0, "no successful {exsig} draws");
        }
        // one fermion and one boson decode for the whole run
        assert_eq!(orbs.ndecode(), 2);
    }
}
