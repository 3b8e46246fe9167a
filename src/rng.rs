//! Random sources for the outcome engine and the background loops.
//!
//! Every resolver takes its randomness through [`RandomSource`], so a round can
//! be replayed exactly by handing it the same source again.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// A stream of uniform floats in `[0, 1)`.
pub trait RandomSource {
    fn next_float(&mut self) -> f64;
}

impl<R: RngCore> RandomSource for R {
    fn next_float(&mut self) -> f64 {
        self.gen_range(0.0..1.0)
    }
}

/// Replays a fixed list of draws, wrapping around when it runs out.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(draws: impl Into<Vec<f64>>) -> Self {
        let draws: Vec<f64> = draws
            .into()
            .into_iter()
            .map(|d| d.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { draws, cursor: 0 }
    }

    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn next_float(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let value = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        value
    }
}

/// Derives a session generator from a seed phrase. Equal phrases replay equal sessions.
pub fn seeded(phrase: &str) -> StdRng {
    let digest = blake3::hash(phrase.as_bytes());
    StdRng::from_seed(*digest.as_bytes())
}

pub fn from_entropy() -> StdRng {
    StdRng::from_entropy()
}

/// Uniform index into a collection of `len` items. `len` must be non-zero.
pub fn pick_index<R: RandomSource + ?Sized>(rng: &mut R, len: usize) -> usize {
    let idx = (rng.next_float() * len as f64) as usize;
    idx.min(len.saturating_sub(1))
}

/// Uniform integer in `lo..=hi`.
pub fn uniform_int<R: RandomSource + ?Sized>(rng: &mut R, lo: u32, hi: u32) -> u32 {
    let span = (hi - lo + 1) as usize;
    lo + pick_index(rng, span) as u32
}

/// Index into a cumulative weight table using a single draw.
pub fn weighted_index<R: RandomSource + ?Sized>(rng: &mut R, weights: &[u32]) -> usize {
    let total: u32 = weights.iter().sum();
    let mut target = rng.next_float() * total as f64;
    for (idx, weight) in weights.iter().enumerate() {
        let weight = *weight as f64;
        if target < weight {
            return idx;
        }
        target -= weight;
    }
    weights.len().saturating_sub(1)
}
