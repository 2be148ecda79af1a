//! Sampling module - random streams and the alias-method weighted sampler.

mod alias;
mod prng;

pub use alias::{WeightedSampler, DEFAULT_FLOOR};
pub use prng::Prng;
