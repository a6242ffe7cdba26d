//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! This policy evicts the block installed longest ago, regardless of how recently
//! it was accessed. Each set keeps its ways in install order; hits do not reorder.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `on_install()`: O(W) where W is the number of ways
//!   - `get_victim()`: O(W)
//! - **Space Complexity:** O(S × W) where S is the number of sets
//! - **Best Case:** Streaming accesses where all blocks have equal importance
//! - **Worst Case:** Workloads with strong temporal locality (may evict hot blocks)

use super::ReplacementPolicy;

/// FIFO Policy state.
#[derive(Debug)]
pub struct FifoPolicy {
    /// Install order per set; index 0 is the oldest block.
    order: Vec<Vec<usize>>,
}

impl FifoPolicy {
    /// Creates a new FIFO policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            order: (0..sets).map(|_| (0..ways).collect()).collect(),
        }
    }
}

impl ReplacementPolicy for FifoPolicy {
    /// Moves the freshly installed way to the young end of the queue.
    fn on_install(&mut self, set: usize, way: usize) {
        let queue = &mut self.order[set];
        if let Some(pos) = queue.iter().position(|&x| x == way) {
            let _ = queue.remove(pos);
        }
        queue.push(way);
    }

    /// Hits do not change install order.
    fn on_access(&mut self, _set: usize, _way: usize) {}

    /// Returns the oldest evictable way.
    fn get_victim(&mut self, set: usize, evictable: &[bool]) -> Option<usize> {
        self.order[set].iter().copied().find(|&way| evictable[way])
    }
}
