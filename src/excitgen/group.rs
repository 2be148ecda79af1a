//! Case registry: every (generator, exsig) pair of the active terms under
//! one shared probability table.

use std::sync::Arc;

use tracing::{debug, info};

use crate::basis::{CachedOrbs, ExSig, Particles, NDISTINCT};
use crate::error::SamplerError;
use crate::excitgen::{Draw, ExcitGen, Mbf};
use crate::hamiltonian::{ExcitGenOpts, HamTerm};
use crate::sampling::{Prng, WeightedSampler};

/// One selectable excitation pathway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExcitCase {
    pub exsig: ExSig,
    /// Index of the owning generator in the registry.
    pub igen: usize,
}

/// How case probabilities are assigned, at construction and on reweight.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseWeights {
    /// Equal probability for every case.
    Uniform,
    /// One non-negative weight per case, normalized on use.
    Explicit(Vec<f64>),
    /// Probabilities for all but the last case; the last one takes what
    /// remains of 1.
    Partial(Vec<f64>),
    /// Weights from each generator's connection-count estimate.
    ApproxConnections(Particles),
}

#[derive(Debug)]
pub struct CaseRegistry {
    gens: Vec<Box<dyn ExcitGen>>,
    /// Index of the term each generator samples.
    gen_terms: Vec<usize>,
    cases: Vec<ExcitCase>,
    /// Cases per exsig, indexed by [`ExSig::index`].
    exsig_cases: Vec<Vec<usize>>,
    /// First case of each distinct term per exsig.
    exsig_term_cases: Vec<Vec<usize>>,
    sampler: WeightedSampler,
    floor: f64,
}

impl CaseRegistry {
    /// Collect the generators of every term and build the case list.
    pub fn new(
        terms: &[Arc<dyn HamTerm>],
        opts: &ExcitGenOpts,
        init: CaseWeights,
        floor: f64,
    ) -> Result<Self, SamplerError> {
        let term_gens = terms
            .iter()
            .map(|term| {
                let gens = term.clone().excit_gens(opts);
                info!(term = term.description(), ngen = gens.len(), "collected excitation generators");
                gens
            })
            .collect();
        Self::from_term_gens(term_gens, init, floor)
    }

    /// Generators that all sample the same term.
    pub fn from_excit_gens(
        gens: Vec<Box<dyn ExcitGen>>,
        init: CaseWeights,
        floor: f64,
    ) -> Result<Self, SamplerError> {
        Self::from_term_gens(vec![gens], init, floor)
    }

    /// Take ownership of the generators of each term and add one case per
    /// declared exsig.
    pub fn from_term_gens(
        term_gens: Vec<Vec<Box<dyn ExcitGen>>>,
        init: CaseWeights,
        floor: f64,
    ) -> Result<Self, SamplerError> {
        let mut gens = Vec::new();
        let mut gen_terms = Vec::new();
        for (iterm, term) in term_gens.into_iter().enumerate() {
            gen_terms.extend(std::iter::repeat(iterm).take(term.len()));
            gens.extend(term);
        }
        let cases: Vec<ExcitCase> = gens
            .iter()
            .enumerate()
            .flat_map(|(igen, gen)| gen.exsigs().iter().map(move |&exsig| ExcitCase { exsig, igen }))
            .collect();
        if cases.is_empty() {
            return Err(SamplerError::EmptyCaseSet);
        }
        let mut exsig_cases = vec![Vec::new(); NDISTINCT];
        let mut exsig_term_cases: Vec<Vec<usize>> = vec![Vec::new(); NDISTINCT];
        for (icase, case) in cases.iter().enumerate() {
            let i = case.exsig.index();
            exsig_cases[i].push(icase);
            let iterm = gen_terms[case.igen];
            if !exsig_term_cases[i].iter().any(|&jcase| gen_terms[cases[jcase].igen] == iterm) {
                exsig_term_cases[i].push(icase);
            }
        }
        let weights = Self::resolve_weights(&gens, &cases, &init)?;
        let sampler = WeightedSampler::build(&weights, floor)?;
        Ok(Self { gens, gen_terms, cases, exsig_cases, exsig_term_cases, sampler, floor })
    }

    fn resolve_weights(
        gens: &[Box<dyn ExcitGen>],
        cases: &[ExcitCase],
        weights: &CaseWeights,
    ) -> Result<Vec<f64>, SamplerError> {
        let ncase = cases.len();
        match weights {
            CaseWeights::Uniform => Ok(vec![1.0; ncase]),
            CaseWeights::Explicit(w) => {
                if w.len() != ncase {
                    return Err(SamplerError::WeightCount { expected: ncase, found: w.len() });
                }
                Ok(w.clone())
            }
            CaseWeights::Partial(w) => {
                if w.len() + 1 != ncase {
                    return Err(SamplerError::WeightCount { expected: ncase - 1, found: w.len() });
                }
                if let Some((index, &value)) = w.iter().enumerate().find(|(_, v)| !v.is_finite() || **v < 0.0) {
                    return Err(SamplerError::InvalidWeight { index, value });
                }
                let sum: f64 = w.iter().sum();
                if sum > 1.0 + 1e-12 {
                    return Err(SamplerError::PartialWeightsExceedOne { sum });
                }
                let mut full = w.clone();
                full.push((1.0 - sum).max(0.0));
                Ok(full)
            }
            CaseWeights::ApproxConnections(particles) => Ok(cases
                .iter()
                .map(|case| gens[case.igen].approx_nconn(case.exsig, particles) as f64)
                .collect()),
        }
    }

    pub fn ncase(&self) -> usize {
        self.cases.len()
    }

    pub fn case(&self, icase: usize) -> &ExcitCase {
        &self.cases[icase]
    }

    pub fn excit_gen(&self, icase: usize) -> &dyn ExcitGen {
        self.gens[self.cases[icase].igen].as_ref()
    }

    pub fn prob(&self, icase: usize) -> f64 {
        self.sampler.probability(icase)
    }

    pub fn probs(&self) -> &[f64] {
        self.sampler.probabilities()
    }

    /// Indices of the cases generating `exsig`.
    pub fn cases_for(&self, exsig: ExSig) -> &[usize] {
        &self.exsig_cases[exsig.index()]
    }

    /// Index of the term sampled by case `icase`.
    pub fn term_of(&self, icase: usize) -> usize {
        self.gen_terms[self.cases[icase].igen]
    }

    /// Pick a case according to the current probabilities. O(1).
    #[inline]
    pub fn select_case(&self, rng: &mut Prng) -> usize {
        self.sampler.draw(rng)
    }

    /// Draw from the generator of case `icase` with its exsig.
    pub fn draw<M: Mbf>(&self, icase: usize, src: &M, orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<M::Conn> {
        let case = &self.cases[icase];
        M::draw(self.gens[case.igen].as_ref(), case.exsig, src, orbs, rng)
    }

    /// Like [`Self::draw`], with the coupling always filled in.
    pub fn draw_h<M: Mbf>(&self, icase: usize, src: &M, orbs: &mut CachedOrbs, rng: &mut Prng) -> Draw<M::Conn> {
        let gen = self.excit_gen(icase);
        match self.draw(icase, src, orbs, rng) {
            Draw::Proposed(mut proposal) => {
                if proposal.helem.is_none() {
                    proposal.helem = Some(M::coupling(gen, src, &proposal.conn));
                }
                Draw::Proposed(proposal)
            }
            Draw::Rejected => Draw::Rejected,
        }
    }

    /// Total probability that one attempt proposes `conn`: the probability
    /// `prob` reported by case `icase` plus the contributions of every other
    /// case with the same exsig, each weighted by its case probability.
    pub fn combined_prob<M: Mbf>(
        &self,
        icase: usize,
        src: &M,
        orbs: &mut CachedOrbs,
        prob: f64,
        conn: &M::Conn,
    ) -> f64 {
        let exsig = self.cases[icase].exsig;
        let mut total = prob * self.prob(icase);
        for &jcase in self.cases_for(exsig) {
            if jcase == icase || self.prob(jcase) == 0.0 {
                continue;
            }
            total += M::prob(self.excit_gen(jcase), src, orbs, conn) * self.prob(jcase);
        }
        total
    }

    /// Full matrix element of `conn`: `helem` from the term of case `icase`
    /// plus the element of every other term with cases of the same exsig.
    pub fn combined_coupling<M: Mbf>(&self, icase: usize, src: &M, conn: &M::Conn, helem: f64) -> f64 {
        let iterm = self.term_of(icase);
        let mut total = helem;
        for &jcase in &self.exsig_term_cases[self.cases[icase].exsig.index()] {
            if self.term_of(jcase) != iterm {
                total += M::coupling(self.excit_gen(jcase), src, conn);
            }
        }
        total
    }

    /// Replace the case probabilities. On error the previous table is kept.
    pub fn reweight(&mut self, weights: CaseWeights) -> Result<(), SamplerError> {
        let weights = Self::resolve_weights(&self.gens, &self.cases, &weights)?;
        self.sampler = WeightedSampler::build(&weights, self.floor)?;
        debug!(probs = ?self.sampler.probabilities(), "reweighted excitation cases");
        Ok(())
    }

    pub fn reweight_by_particle_counts(&mut self, particles: &Particles) -> Result<(), SamplerError> {
        self.reweight(CaseWeights::ApproxConnections(*particles))
    }

    /// Log one line per case with its generator and probability.
    pub fn log_breakdown(&self) {
        for (icase, case) in self.cases.iter().enumerate() {
            info!(
                icase,
                exsig = %case.exsig,
                gen = self.gens[case.igen].description(),
                prob = self.prob(icase),
                "excitation case"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::basis::{BosBasis, FrmBasis, FrmConn, FrmOnv, EX_0001, EX_0010, EX_DOUBLE, EX_SINGLE};
    use crate::excitgen::tester::StubGen;
    use crate::excitgen::{HubbardPreferDoubleOcc, HubbardUniform, UniformSingles};
    use crate::hamiltonian::{FrmHam, GeneralFrmHam, HolsteinLadderHam, HubbardFrmHam, Lattice};
    use crate::sampling::DEFAULT_FLOOR;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use rayon::prelude::*;

    fn stubs(n: usize) -> Vec<Box<dyn ExcitGen>> {
        (0..n).map(|i| Box::new(StubGen::new(&[EX_SINGLE], i + 1)) as Box<dyn ExcitGen>).collect()
    }

    fn hubbard_holstein_terms() -> Vec<Arc<dyn HamTerm>> {
        let hubbard = HubbardFrmHam::new(Lattice::hypercubic(&[4], true), 1.0, 4.0);
        let holstein = HolsteinLadderHam::new(BosBasis::new(4, 3), 0.5, vec![]).unwrap();
        vec![Arc::new(hubbard), Arc::new(holstein)]
    }

    #[test]
    fn test_cases_from_terms() {
        let registry =
            CaseRegistry::new(&hubbard_holstein_terms(), &ExcitGenOpts::default(), CaseWeights::Uniform, DEFAULT_FLOOR)
                .unwrap();
        assert_eq!(registry.ncase(), 3);
        assert_eq!(registry.case(0).exsig, EX_SINGLE);
        assert_eq!(registry.case(1), &ExcitCase { exsig: EX_0010, igen: 1 });
        assert_eq!(registry.case(2), &ExcitCase { exsig: EX_0001, igen: 1 });
        assert_eq!(registry.cases_for(EX_0001), &[2]);
        assert!(registry.cases_for(EX_DOUBLE).is_empty());
        assert_eq!((registry.term_of(0), registry.term_of(1), registry.term_of(2)), (0, 1, 1));
        for icase in 0..3 {
            assert_relative_eq!(registry.prob(icase), 1.0 / 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_empty_case_set() {
        let err = CaseRegistry::from_excit_gens(vec![], CaseWeights::Uniform, DEFAULT_FLOOR).unwrap_err();
        assert_eq!(err, SamplerError::EmptyCaseSet);
        let err = CaseRegistry::new(&[], &ExcitGenOpts::default(), CaseWeights::Uniform, DEFAULT_FLOOR).unwrap_err();
        assert_eq!(err, SamplerError::EmptyCaseSet);
    }

    #[test]
    fn test_weight_validation() {
        let build = |w| CaseRegistry::from_excit_gens(stubs(3), w, DEFAULT_FLOOR).map(|r| r.probs().to_vec());
        assert_eq!(
            build(CaseWeights::Explicit(vec![1.0, 2.0])).unwrap_err(),
            SamplerError::WeightCount { expected: 3, found: 2 }
        );
        assert!(matches!(
            build(CaseWeights::Explicit(vec![1.0, -2.0, 1.0])),
            Err(SamplerError::InvalidWeight { index: 1, .. })
        ));
        assert!(matches!(
            build(CaseWeights::Explicit(vec![0.0; 3])),
            Err(SamplerError::DegenerateDistribution { .. })
        ));
        assert!(matches!(
            build(CaseWeights::Partial(vec![0.7, 0.6])),
            Err(SamplerError::PartialWeightsExceedOne { .. })
        ));
        assert!(matches!(
            build(CaseWeights::Partial(vec![0.7, f64::NAN])),
            Err(SamplerError::InvalidWeight { index: 1, .. })
        ));

        let probs = build(CaseWeights::Partial(vec![0.2, 0.3])).unwrap();
        assert_relative_eq!(probs.as_slice(), [0.2, 0.3, 0.5].as_slice(), epsilon = 1e-12);
        let probs = build(CaseWeights::ApproxConnections(Particles::default())).unwrap();
        assert_relative_eq!(probs.as_slice(), [1.0 / 6.0, 2.0 / 6.0, 3.0 / 6.0].as_slice(), epsilon = 1e-12);
    }

    #[test]
    fn test_failed_reweight_keeps_table() {
        let mut registry =
            CaseRegistry::from_excit_gens(stubs(2), CaseWeights::Explicit(vec![1.0, 3.0]), DEFAULT_FLOOR).unwrap();
        assert!(registry.reweight(CaseWeights::Explicit(vec![0.0, 0.0])).is_err());
        assert_relative_eq!(registry.prob(1), 0.75, epsilon = 1e-12);
        registry.reweight_by_particle_counts(&Particles::new(1, 1, 0)).unwrap();
        assert_relative_eq!(registry.prob(1), 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_selection_frequencies() {
        let registry =
            CaseRegistry::from_excit_gens(stubs(4), CaseWeights::Explicit(vec![1.0, 0.0, 2.0, 1.0]), DEFAULT_FLOOR)
                .unwrap();
        let mut rng = Prng::from_seed(31);
        let ndraw = 200_000;
        let mut counts = [0usize; 4];
        for _ in 0..ndraw {
            counts[registry.select_case(&mut rng)] += 1;
        }
        assert_eq!(counts[1], 0);
        for (icase, &count) in counts.iter().enumerate() {
            assert!((count as f64 / ndraw as f64 - registry.prob(icase)).abs() < 0.01);
        }
    }

    #[test]
    fn test_parallel_selection() {
        let registry =
            CaseRegistry::from_excit_gens(stubs(3), CaseWeights::Explicit(vec![0.5, 0.3, 0.2]), DEFAULT_FLOOR)
                .unwrap();
        let ndraw = 50_000;
        let counts = (0..8usize)
            .into_par_iter()
            .map(|ithread| {
                let mut rng = Prng::for_thread(7, ithread);
                let mut counts = [0usize; 3];
                for _ in 0..ndraw {
                    counts[registry.select_case(&mut rng)] += 1;
                }
                counts
            })
            .reduce(|| [0; 3], |a, b| [a[0] + b[0], a[1] + b[1], a[2] + b[2]]);
        let ntotal = (8 * ndraw) as f64;
        for (icase, &count) in counts.iter().enumerate() {
            assert!((count as f64 / ntotal - registry.prob(icase)).abs() < 0.005);
        }
    }

    #[test]
    fn test_combined_prob_is_unbiased() {
        let ham = Arc::new(HubbardFrmHam::new(Lattice::hypercubic(&[6], true), 1.0, 4.0));
        let gens: Vec<Box<dyn ExcitGen>> = vec![
            Box::new(HubbardUniform::new(ham.clone())),
            Box::new(HubbardPreferDoubleOcc::new(ham, 1.0)),
        ];
        let registry = CaseRegistry::from_excit_gens(gens, CaseWeights::Explicit(vec![0.3, 0.7]), DEFAULT_FLOOR).unwrap();
        let src = FrmOnv::from_occs(6, &[1, 3, 7, 10]);
        let mut orbs = CachedOrbs::default();

        let conn = FrmConn::single(1, 2);
        let p0 = registry.excit_gen(0).prob_frm(&src, &mut orbs, &conn);
        let p1 = registry.excit_gen(1).prob_frm(&src, &mut orbs, &conn);
        assert_relative_eq!(registry.combined_prob(0, &src, &mut orbs, p0, &conn), 0.3 * p0 + 0.7 * p1, epsilon = 1e-14);
        assert_relative_eq!(registry.combined_prob(1, &src, &mut orbs, p1, &conn), 0.3 * p0 + 0.7 * p1, epsilon = 1e-14);

        let mut rng = Prng::from_seed(12);
        let ndraw = 400_000;
        let mut weights: HashMap<FrmConn, f64> = HashMap::new();
        for _ in 0..ndraw {
            let icase = registry.select_case(&mut rng);
            if let Draw::Proposed(p) = registry.draw_h(icase, &src, &mut orbs, &mut rng) {
                assert!(p.helem.is_some());
                let prob = registry.combined_prob(icase, &src, &mut orbs, p.prob, &p.conn);
                *weights.entry(p.conn).or_default() += 1.0 / prob;
            }
        }
        // alpha 1 -> 0, 2; alpha 3 -> 2, 4; beta 1 -> 0, 2; beta 4 -> 3, 5
        assert_eq!(weights.len(), 8);
        for w in weights.values() {
            assert!((w / ndraw as f64 - 1.0).abs() < 0.05);
        }
    }

    #[test]
    fn test_combined_coupling_sums_terms() {
        let hubbard = Arc::new(HubbardFrmHam::new(Lattice::hypercubic(&[4], true), 1.0, 4.0));
        let mut rng = Prng::from_seed(3);
        let general = Arc::new(GeneralFrmHam::random(FrmBasis::new(4), 0.5, &mut rng).unwrap());
        let term_gens: Vec<Vec<Box<dyn ExcitGen>>> = vec![
            vec![
                Box::new(HubbardUniform::new(hubbard.clone())),
                Box::new(HubbardPreferDoubleOcc::new(hubbard.clone(), 1.0)),
            ],
            vec![Box::new(UniformSingles::new(general.clone()))],
        ];
        let registry = CaseRegistry::from_term_gens(term_gens, CaseWeights::Uniform, DEFAULT_FLOOR).unwrap();
        assert_eq!(registry.cases_for(EX_SINGLE), &[0, 1, 2]);
        assert_eq!(registry.term_of(1), 0);
        assert_eq!(registry.term_of(2), 1);

        let src = FrmOnv::from_occs(4, &[0, 1, 4]);
        let expected = |conn: &FrmConn| hubbard.get_element(&src, conn) + general.get_element(&src, conn);
        for conn in [FrmConn::single(1, 2), FrmConn::single(0, 3), FrmConn::single(0, 2)] {
            for icase in 0..3 {
                let helem = registry.excit_gen(icase).coupling_frm(&src, &conn);
                assert_relative_eq!(
                    registry.combined_coupling(icase, &src, &conn, helem),
                    expected(&conn),
                    epsilon = 1e-12
                );
            }
        }
    }

    proptest! {
        #[test]
        fn prop_reweight_normalizes(weights in prop::collection::vec(0.0f64..10.0, 1..8)) {
            prop_assume!(weights.iter().sum::<f64>() > 1e-6);
            let mut registry = CaseRegistry::from_excit_gens(stubs(weights.len()), CaseWeights::Uniform, DEFAULT_FLOOR).unwrap();
            registry.reweight(CaseWeights::Explicit(weights.clone())).unwrap();
            let sum: f64 = registry.probs().iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-8);
            let total: f64 = weights.iter().sum();
            for (icase, w) in weights.iter().enumerate() {
                prop_assert!(registry.prob(icase) >= 0.0);
                prop_assert!((registry.prob(icase) - w / total).abs() < 1e-10);
            }
        }

        #[test]
        fn prop_partial_weights_complete(partial in prop::collection::vec(0.0f64..0.3, 1..4)) {
            let registry = CaseRegistry::from_excit_gens(
                stubs(partial.len() + 1),
                CaseWeights::Partial(partial.clone()),
                DEFAULT_FLOOR,
            ).unwrap();
            let sum: f64 = registry.probs().iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-8);
            let last = registry.prob(partial.len());
            prop_assert!((last - (1.0 - partial.iter().sum::<f64>())).abs() < 1e-10);
        }
    }
}
