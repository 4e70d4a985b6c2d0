//! Deterministic train/test partitioning

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Source of uniform numbers in `[0, 1)` driving the shuffle.
///
/// Swappable so tests can pin an exact permutation.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

/// Seeded xorshift-family generator; identical seeds give identical streams.
pub struct SeededRandom {
    rng: Xoshiro256PlusPlus,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of draws, cycling when exhausted
pub struct FixedSequence {
    values: Vec<f64>,
    pos: usize,
}

impl FixedSequence {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, pos: 0 }
    }
}

impl RandomSource for FixedSequence {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Row indices assigned to each partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Shuffle `[0..row_count)` with a seeded generator and cut at
/// `floor(train_fraction * row_count)`.
pub fn split(row_count: usize, train_fraction: f64, seed: u64) -> Split {
    split_with(row_count, train_fraction, &mut SeededRandom::new(seed))
}

/// Same as [`split`] with an explicit random source
pub fn split_with<R: RandomSource + ?Sized>(
    row_count: usize,
    train_fraction: f64,
    source: &mut R,
) -> Split {
    let mut indices: Vec<usize> = (0..row_count).collect();
    shuffle_in_place(&mut indices, source);

    let fraction = if train_fraction.is_finite() {
        train_fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cut = ((fraction * row_count as f64).floor() as usize).min(row_count);
    let test_indices = indices.split_off(cut);

    Split {
        train_indices: indices,
        test_indices,
    }
}

/// Fisher-Yates, swapping from the back toward the front
fn shuffle_in_place<T, R: RandomSource + ?Sized>(items: &mut [T], source: &mut R) {
    let mut m = items.len();
    while m > 1 {
        let i = ((source.next_f64() * m as f64).floor() as usize).min(m - 1);
        m -= 1;
        items.swap(m, i);
    }
}
