//! Least Recently Used (LRU) Replacement Policy.
//!
//! This policy evicts the way that has not been accessed for the longest time.
//! It maintains a usage stack for each set. When a way is installed or hit, it is
//! moved to the top (Most Recently Used position). The bottom of the stack
//! represents the Least Recently Used way.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `on_access()`: O(W) where W is the number of ways (associativity)
//!   - `get_victim()`: O(W) in the worst case, when pending ways sit at the bottom
//! - **Space Complexity:** O(S × W) where S is the number of sets
//! - **Worst Case:** Scanning patterns larger than cache capacity (thrashing)

use super::ReplacementPolicy;

/// LRU Policy state.
#[derive(Debug)]
pub struct LruPolicy {
    /// A vector of usage stacks (one per set).
    /// Index 0 is MRU, last index is LRU.
    usage: Vec<Vec<usize>>,
}

impl LruPolicy {
    /// Creates a new LRU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(sets: usize, ways: usize) -> Self {
        let mut usage = Vec::with_capacity(sets);
        for _ in 0..sets {
            usage.push((0..ways).collect());
        }
        Self { usage }
    }

    fn promote(&mut self, set: usize, way: usize) {
        let stack = &mut self.usage[set];
        if let Some(pos) = stack.iter().position(|&x| x == way) {
            let _ = stack.remove(pos);
        }
        stack.insert(0, way);
    }
}

impl ReplacementPolicy for LruPolicy {
    /// An install counts as a use.
    fn on_install(&mut self, set: usize, way: usize) {
        self.promote(set, way);
    }

    /// Moves the accessed `way` to the front of the usage stack (MRU position).
    fn on_access(&mut self, set: usize, way: usize) {
        self.promote(set, way);
    }

    /// Returns the evictable way closest to the bottom of the usage stack.
    fn get_victim(&mut self, set: usize, evictable: &[bool]) -> Option<usize> {
        self.usage[set].iter().rev().copied().find(|&way| evictable[way])
    }
}
