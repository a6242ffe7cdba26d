//! Random Replacement Policy.
//!
//! This policy evicts a uniformly chosen evictable way. It uses a xorshift
//! generator seeded from the engine settings, so a given seed and request
//! stream always produce the same evictions.

use super::ReplacementPolicy;

/// Fallback state when the configured seed is zero (xorshift's fixed point).
const NONZERO_SEED: u64 = 123_456_789;

/// Random Policy state.
#[derive(Debug)]
pub struct RandomPolicy {
    /// Internal state for the pseudo-random number generator.
    state: u64,
}

impl RandomPolicy {
    /// Creates a new Random policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets (unused in this policy but required by interface).
    /// * `ways` - The associativity (unused in this policy but required by interface).
    /// * `seed` - Generator seed; zero is replaced by a fixed non-zero value.
    pub const fn new(_sets: usize, _ways: usize, seed: u64) -> Self {
        Self {
            state: if seed == 0 { NONZERO_SEED } else { seed },
        }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

impl ReplacementPolicy for RandomPolicy {
    /// Access patterns do not affect random replacement.
    fn on_install(&mut self, _set: usize, _way: usize) {}

    /// Access patterns do not affect random replacement.
    fn on_access(&mut self, _set: usize, _way: usize) {}

    /// Maps the next pseudo-random number onto the evictable ways.
    fn get_victim(&mut self, _set: usize, evictable: &[bool]) -> Option<usize> {
        let candidates: Vec<usize> = evictable
            .iter()
            .enumerate()
            .filter_map(|(way, &ok)| ok.then_some(way))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let pick = (self.next() % candidates.len() as u64) as usize;
        Some(candidates[pick])
    }
}
