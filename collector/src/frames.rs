use ndarray::{Array1, Array2, Array3};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::error::CollectError;

pub const DEFAULT_SEED: u64 = 0;
pub const MAX_BITS: u32 = 16;

/// Deterministic source of `bits`-wide unsigned samples.
///
/// Arrays are filled in row-major order from a single stream, so the same
/// seed and the same sequence of requests always produce the same data.
pub struct Sampler {
    rng: Xoshiro256PlusPlus,
    bits: u32,
}

impl Sampler {
    pub fn new(seed: u64, bits: u32) -> Result<Self, CollectError> {
        if bits == 0 || bits > MAX_BITS {
            return Err(CollectError::InvalidBitDepth(bits));
        }
        Ok(Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            bits,
        })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Exclusive upper bound of generated samples.
    pub fn limit(&self) -> u32 {
        1 << self.bits
    }

    pub fn sample(&mut self) -> u16 {
        let limit = self.limit();
        self.rng.random_range(0..limit) as u16
    }

    pub fn vector(&mut self, len: usize) -> Array1<u16> {
        Array1::from_shape_simple_fn(len, || self.sample())
    }

    pub fn matrix(&mut self, rows: usize, cols: usize) -> Array2<u16> {
        Array2::from_shape_simple_fn((rows, cols), || self.sample())
    }

    /// `(n_frames, rows_per_frame, row_width)` block of frames.
    pub fn frames(
        &mut self,
        n_frames: usize,
        rows_per_frame: usize,
        row_width: usize,
    ) -> Array3<u16> {
        Array3::from_shape_simple_fn((n_frames, rows_per_frame, row_width), || {
            self.sample()
        })
    }
}
