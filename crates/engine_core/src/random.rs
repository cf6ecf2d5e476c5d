//! Deterministic pseudo-random sequence (Park-Miller minimal standard LCG).
//!
//! Used wherever a repeatable choice is needed (decal selection, rotation
//! jitter). Two sequences created with the same seed produce the same values.

const MULTIPLIER: u64 = 16_807;
const MODULUS: u64 = 2_147_483_647;

/// Linear-congruential generator with a 31-bit state.
#[derive(Debug, Clone)]
pub struct RandomSequence {
    state: u64,
}

impl Default for RandomSequence {
    fn default() -> Self {
        Self::new(1)
    }
}

impl RandomSequence {
    pub fn new(seed: u32) -> Self {
        let mut seq = Self { state: 1 };
        seq.set_seed(seed);
        seq
    }

    /// Restart the sequence. A state of 0 would lock the generator at 0, so
    /// seeds that reduce to it are remapped to 1.
    pub fn set_seed(&mut self, seed: u32) {
        let state = seed as u64 % MODULUS;
        self.state = if state == 0 { 1 } else { state };
    }

    /// Next raw value in `[1, 2^31 - 2]`.
    pub fn next_u32(&mut self) -> u32 {
        self.state = (self.state * MULTIPLIER) % MODULUS;
        self.state as u32
    }

    /// Next value in `[0, 1)`.
    pub fn value(&mut self) -> f32 {
        let v = (self.next_u32() - 1) as f64 / (MODULUS - 1) as f64;
        // Large states round up to 1.0 in f32.
        (v as f32).min(1.0 - f32::EPSILON / 2.0)
    }

    /// Float in `[min, max]`. Returns `min` when the range is empty.
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.value()
    }

    /// Integer in `[min, max]` inclusive. Returns `min` when the range is empty.
    pub fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max as i64 - min as i64 + 1) as u64;
        (min as i64 + (self.next_u32() as u64 % span) as i64) as i32
    }
}
