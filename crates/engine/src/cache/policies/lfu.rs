//! Least Frequently Used (LFU) Replacement Policy.
//!
//! This policy evicts the way with the fewest accesses since its block was
//! installed. Ties go to the block installed longest ago, so a set of equally
//! cold blocks degrades to FIFO.

use super::ReplacementPolicy;

/// LFU Policy state.
#[derive(Debug)]
pub struct LfuPolicy {
    /// Accesses per way since install, flattened `set * ways + way`.
    counts: Vec<u64>,
    /// Install timestamp per way, flattened like `counts`.
    installed: Vec<u64>,
    ways: usize,
    clock: u64,
}

impl LfuPolicy {
    /// Creates a new LFU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            counts: vec![0; sets * ways],
            installed: vec![0; sets * ways],
            ways,
            clock: 0,
        }
    }
}

impl ReplacementPolicy for LfuPolicy {
    /// Restarts the counter for the new block and stamps its install time.
    fn on_install(&mut self, set: usize, way: usize) {
        self.clock += 1;
        let slot = set * self.ways + way;
        self.counts[slot] = 1;
        self.installed[slot] = self.clock;
    }

    fn on_access(&mut self, set: usize, way: usize) {
        let slot = set * self.ways + way;
        self.counts[slot] = self.counts[slot].saturating_add(1);
    }

    /// Returns the evictable way with the lowest `(count, install time)`.
    fn get_victim(&mut self, set: usize, evictable: &[bool]) -> Option<usize> {
        let base = set * self.ways;
        (0..self.ways)
            .filter(|&way| evictable[way])
            .min_by_key(|&way| (self.counts[base + way], self.installed[base + way]))
    }
}
