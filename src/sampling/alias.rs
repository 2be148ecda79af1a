//! Walker/Vose alias table for O(1) draws from a discrete distribution.
//!
//! Each bucket `i` stores a threshold and an alias index. A draw picks a
//! bucket uniformly and keeps it if a uniform float falls below the
//! threshold, otherwise it returns the alias. Construction is O(n).

use super::prng::Prng;
use crate::error::SamplerError;

/// Default minimum weight sum below which a distribution is degenerate.
pub const DEFAULT_FLOOR: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    threshold: f64,
    alias: usize,
}

/// Alias-method sampler over indices `0..n`.
///
/// The normalized probability vector lives inside the sampler, so the
/// probabilities and the sampling table are always built together.
#[derive(Debug, Clone)]
pub struct WeightedSampler {
    probs: Vec<f64>,
    buckets: Vec<Bucket>,
}

impl WeightedSampler {
    /// Build from non-negative weights.
    ///
    /// # Errors
    /// * [`SamplerError::InvalidWeight`] for a negative or non-finite weight
    /// * [`SamplerError::DegenerateDistribution`] if the sum is below `floor`
    ///   (this includes the empty vector)
    pub fn build(weights: &[f64], floor: f64) -> Result<Self, SamplerError> {
        let mut sum = 0.0;
        for (index, &value) in weights.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(SamplerError::InvalidWeight { index, value });
            }
            sum += value;
        }
        if weights.is_empty() || sum < floor {
            return Err(SamplerError::DegenerateDistribution { sum, floor });
        }

        let n = weights.len();
        let probs: Vec<f64> = weights.iter().map(|w| w / sum).collect();
        // scale so that the average bucket holds exactly 1
        let mut scaled: Vec<f64> = probs.iter().map(|p| p * n as f64).collect();
        let mut buckets: Vec<Bucket> = (0..n).map(|i| Bucket { threshold: 1.0, alias: i }).collect();

        let mut small = Vec::with_capacity(n);
        let mut large = Vec::with_capacity(n);
        for (i, &s) in scaled.iter().enumerate() {
            if s < 1.0 {
                small.push(i);
            } else {
                large.push(i);
            }
        }

        while let Some(s) = small.pop() {
            let Some(&l) = large.last() else {
                small.push(s);
                break;
            };
            buckets[s] = Bucket { threshold: scaled[s], alias: l };
            scaled[l] = (scaled[l] + scaled[s]) - 1.0;
            if scaled[l] < 1.0 {
                large.pop();
                small.push(l);
            }
        }

        // anything left is 1 up to rounding, except that a zero-weight
        // bucket must never keep itself
        let fallback = probs
            .iter()
            .enumerate()
            .fold(0, |best, (i, &p)| if p > probs[best] { i } else { best });
        for i in small.into_iter().chain(large) {
            buckets[i] = if weights[i] > 0.0 {
                Bucket { threshold: 1.0, alias: i }
            } else {
                Bucket { threshold: 0.0, alias: fallback }
            };
        }

        Ok(Self { probs, buckets })
    }

    /// Draw an index with probability `probability(index)`. O(1).
    #[inline]
    pub fn draw(&self, rng: &mut Prng) -> usize {
        let ibucket = rng.draw_uint(self.buckets.len());
        let bucket = &self.buckets[ibucket];
        if rng.draw_float() < bucket.threshold {
            ibucket
        } else {
            bucket.alias
        }
    }

    /// Normalized weight of `index`.
    #[inline]
    pub fn probability(&self, index: usize) -> f64 {
        self.probs[index]
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probs
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }
}
