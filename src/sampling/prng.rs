//! Per-thread random stream.
//!
//! Every draw in this crate takes an explicit `&mut Prng`; there is no
//! global generator. Workers derive independent streams from one base seed
//! with [`Prng::for_thread`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Distribution;

/// Golden-ratio increment used to decorrelate per-thread seeds.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seeded, reproducible uniform random stream.
#[derive(Debug, Clone)]
pub struct Prng {
    inner: StdRng,
    seed: u64,
}

impl Prng {
    /// Create a stream from a 64-bit seed. Equal seeds give equal streams.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Stream for worker `ithread` derived from a shared base seed.
    pub fn for_thread(seed: u64, ithread: usize) -> Self {
        let mixed = seed ^ SEED_STRIDE.wrapping_mul(ithread as u64 + 1);
        Self::from_seed(mixed)
    }

    /// Seed used to initialise this stream.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform float in [0, 1).
    #[inline]
    pub fn draw_float(&mut self) -> f64 {
        self.inner.gen()
    }

    /// Uniform integer in [0, bound). `bound` must be non-zero.
    #[inline]
    pub fn draw_uint(&mut self, bound: usize) -> usize {
        assert!(bound > 0, "cannot draw from an empty integer range");
        self.inner.gen_range(0..bound)
    }

    /// Uniform integer in [min, max). The range must be non-empty.
    #[inline]
    pub fn draw_uint_in(&mut self, min: usize, max: usize) -> usize {
        assert!(min < max, "cannot draw from the empty range [{min}, {max})");
        self.inner.gen_range(min..max)
    }

    /// Sample from any `rand_distr` distribution using this stream.
    pub fn sample<T, D: Distribution<T>>(&mut self, dist: &D) -> T {
        dist.sample(&mut self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = Prng::from_seed(14);
        let mut b = Prng::from_seed(14);
        for _ in 0..100 {
            assert_eq!(a.draw_uint(1000), b.draw_uint(1000));
            assert_eq!(a.draw_float(), b.draw_float());
        }
    }

    #[test]
    fn test_thread_streams_differ() {
        let mut a = Prng::for_thread(14, 0);
        let mut b = Prng::for_thread(14, 1);
        assert_ne!(a.seed(), b.seed());
        let da: Vec<usize> = (0..16).map(|_| a.draw_uint(1 << 20)).collect();
        let db: Vec<usize> = (0..16).map(|_| b.draw_uint(1 << 20)).collect();
        assert_ne!(da, db);
    }

    #[test]
    fn test_ranges() {
        let mut rng = Prng::from_seed(1);
        for _ in 0..10_000 {
            let f = rng.draw_float();
            assert!((0.0..1.0).contains(&f));
            assert!(rng.draw_uint(7) < 7);
            let x = rng.draw_uint_in(3, 5);
            assert!(x == 3 || x == 4);
        }
    }

    #[test]
    fn test_sample_distribution() {
        let mut rng = Prng::from_seed(7);
        let normal = rand_distr::Normal::new(2.0, 0.5).unwrap();
        let n = 100_000;
        let mean = (0..n).map(|_| rng.sample(&normal)).sum::<f64>() / n as f64;
        assert!((mean - 2.0).abs() < 0.01);
    }

    #[test]
    #[should_panic]
    fn test_empty_range_panics() {
        let mut rng = Prng::from_seed(1);
        rng.draw_uint(0);
    }
}
