//! Per-case statistics of the largest `|helem| / p` seen, used to retune the
//! case probabilities between blocks.

use crate::excitgen::CaseRegistry;

/// Accumulates, for each case, the number of successful draws and the
/// largest `|helem| / (p_gen * p_case)` observed. One logger per worker;
/// combine with [`MagnitudeLogger::merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MagnitudeLogger {
    ndraw: Vec<u64>,
    max_ratio: Vec<f64>,
}

impl MagnitudeLogger {
    pub fn new(ncase: usize) -> Self {
        Self { ndraw: vec![0; ncase], max_ratio: vec![0.0; ncase] }
    }

    pub fn ncase(&self) -> usize {
        self.ndraw.len()
    }

    /// Record one successful draw of case `icase`.
    pub fn log(&mut self, icase: usize, helem: f64, prob_gen: f64, prob_case: f64) {
        debug_assert!(prob_gen > 0.0 && prob_case > 0.0, "logged a draw with zero probability");
        let ratio = helem.abs() / (prob_gen * prob_case);
        self.ndraw[icase] += 1;
        if ratio > self.max_ratio[icase] {
            self.max_ratio[icase] = ratio;
        }
    }

    pub fn ndraw(&self, icase: usize) -> u64 {
        self.ndraw[icase]
    }

    pub fn max_ratio(&self, icase: usize) -> f64 {
        self.max_ratio[icase]
    }

    /// Combine two loggers over the same cases.
    pub fn merge(mut self, other: Self) -> Self {
        assert_eq!(self.ncase(), other.ncase(), "merging loggers over different case sets");
        for icase in 0..self.ncase() {
            self.ndraw[icase] += other.ndraw[icase];
            self.max_ratio[icase] = self.max_ratio[icase].max(other.max_ratio[icase]);
        }
        self
    }

    pub fn reset(&mut self) {
        self.ndraw.iter_mut().for_each(|n| *n = 0);
        self.max_ratio.iter_mut().for_each(|r| *r = 0.0);
    }

    /// New case probabilities proportional to `p_case * max_ratio`, with no
    /// case below `min_prob`. `None` until every case with non-zero
    /// probability has at least `ndraw_min` draws, or if nothing coupled.
    pub fn suggest_weights(&self, registry: &CaseRegistry, min_prob: f64, ndraw_min: u64) -> Option<Vec<f64>> {
        let ncase = self.ncase();
        assert_eq!(ncase, registry.ncase(), "logger and registry disagree on the number of cases");
        let sampled = (0..ncase).all(|icase| registry.prob(icase) == 0.0 || self.ndraw[icase] >= ndraw_min);
        if !sampled {
            return None;
        }
        if min_prob * ncase as f64 >= 1.0 {
            return Some(vec![1.0 / ncase as f64; ncase]);
        }
        let raw: Vec<f64> = (0..ncase).map(|icase| registry.prob(icase) * self.max_ratio[icase]).collect();
        if raw.iter().sum::<f64>() <= 0.0 {
            return None;
        }

        // pin cases at the floor until the rest stay above it
        let mut pinned = vec![false; ncase];
        loop {
            let npinned = pinned.iter().filter(|&&p| p).count();
            let free_mass = 1.0 - npinned as f64 * min_prob;
            let free_sum: f64 = (0..ncase).filter(|&i| !pinned[i]).map(|i| raw[i]).sum();
            let weights: Vec<f64> = (0..ncase)
                .map(|i| if pinned[i] { min_prob } else { free_mass * raw[i] / free_sum })
                .collect();
            let below: Vec<usize> = (0..ncase).filter(|&i| !pinned[i] && weights[i] < min_prob).collect();
            if below.is_empty() {
                return Some(weights);
            }
            for i in below {
                pinned[i] = true;
            }
        }
    }
}
