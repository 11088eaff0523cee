//! Random source used by every generation step.
//!
//! Generation never touches a global generator. Callers pass a `RandomSource`
//! handle down through the assembler, measure generator and partitioner, so a
//! fixed seed always reproduces the same score. Any `rand::Rng` is a
//! `RandomSource`; the batch runner uses PCG32 seeded per piece.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// The three kinds of draw generation needs.
pub trait RandomSource {
    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize;

    /// `true` with the given probability.
    fn chance(&mut self, probability: f64) -> bool;

    /// Uniform integer in `low..=high`.
    fn int_in(&mut self, low: i64, high: i64) -> i64;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn pick_index(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.gen::<f64>() < probability
    }

    fn int_in(&mut self, low: i64, high: i64) -> i64 {
        self.gen_range(low..=high)
    }
}

/// Creates a PCG32 generator from a 64-bit seed.
pub fn create_rng(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

/// Derives the seed for one piece of a batch.
///
/// Hashes the base seed with the piece index using BLAKE3, so each piece gets an
/// independent stream that doesn't depend on how many draws earlier pieces made.
pub fn derive_piece_seed(base_seed: u64, piece_index: u32) -> u64 {
    let mut input = Vec::with_capacity(12);
    input.extend_from_slice(&base_seed.to_le_bytes());
    input.extend_from_slice(&piece_index.to_le_bytes());

    let hash = blake3::hash(&input);

    // First 8 bytes, little-endian
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Creates the generator for one piece of a batch.
pub fn create_piece_rng(base_seed: u64, piece_index: u32) -> Pcg32 {
    create_rng(derive_piece_seed(base_seed, piece_index))
}

/// Fresh seed from OS entropy, for runs without an explicit seed.
pub fn entropy_seed() -> u64 {
    rand::random()
}

/// Replays fixed draws, for forcing exact generation paths in tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedSource {
    pub picks: std::collections::VecDeque<usize>,
    pub chances: std::collections::VecDeque<bool>,
    pub ints: std::collections::VecDeque<i64>,
}

#[cfg(test)]
impl ScriptedSource {
    pub fn with_picks(picks: &[usize]) -> Self {
        Self {
            picks: picks.iter().copied().collect(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedSource {
    fn pick_index(&mut self, len: usize) -> usize {
        let index = self.picks.pop_front().expect("scripted picks exhausted");
        assert!(index < len, "scripted pick {} out of range 0..{}", index, len);
        index
    }

    fn chance(&mut self, _probability: f64) -> bool {
        self.chances.pop_front().expect("scripted chances exhausted")
    }

    fn int_in(&mut self, low: i64, high: i64) -> i64 {
        let value = self.ints.pop_front().expect("scripted ints exhausted");
        assert!((low..=high).contains(&value));
        value
    }
}
