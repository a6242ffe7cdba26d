//! Cache Replacement Policies.
//!
//! Implements the algorithms for selecting victim ways in a full set. Each policy
//! owns its per-way metadata and refreshes it on every install and every hit, not
//! only on eviction.
//!
//! # Policies
//!
//! - `Random`: uniform pick among evictable ways.
//! - `Fifo`: First-In, First-Out.
//! - `Lfu`: Least Frequently Used, oldest install on ties.
//! - `Lru`: Least Recently Used.
//!
//! A way waiting for a fill (`MISS_PENDING`) is never a candidate: callers pass an
//! `evictable` mask and a policy returns `None` when the mask is empty.

use std::fmt;

use crate::config::ReplacementPolicy as PolicyType;

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Frequently Used replacement policy.
pub mod lfu;

/// Least Recently Used replacement policy.
pub mod lru;

/// Random replacement policy.
pub mod random;

pub use fifo::FifoPolicy;
pub use lfu::LfuPolicy;
pub use lru::LruPolicy;
pub use random::RandomPolicy;

/// Trait for cache replacement policies.
///
/// Defines the interface for updating usage state and selecting victim ways.
pub trait ReplacementPolicy: Send + Sync + fmt::Debug {
    /// Records that a new block was installed in `way` of `set`.
    fn on_install(&mut self, set: usize, way: usize);

    /// Records a hit on `way` of `set`.
    fn on_access(&mut self, set: usize, way: usize);

    /// Selects a victim way in `set`.
    ///
    /// # Arguments
    ///
    /// * `set` - The cache set index.
    /// * `evictable` - One flag per way; only flagged ways may be chosen.
    ///
    /// # Returns
    ///
    /// The way to evict, or `None` if no way is evictable.
    fn get_victim(&mut self, set: usize, evictable: &[bool]) -> Option<usize>;
}

/// Builds the policy named by the configuration.
///
/// # Arguments
///
/// * `kind` - Configured replacement policy.
/// * `sets` - Number of sets in the cache.
/// * `ways` - Associativity of the cache.
/// * `seed` - Seed for the random policy; ignored by the others.
pub fn build(kind: PolicyType, sets: usize, ways: usize, seed: u64) -> Box<dyn ReplacementPolicy> {
    match kind {
        PolicyType::Random => Box::new(RandomPolicy::new(sets, ways, seed)),
        PolicyType::Fifo => Box::new(FifoPolicy::new(sets, ways)),
        PolicyType::Lfu => Box::new(LfuPolicy::new(sets, ways)),
        PolicyType::Lru => Box::new(LruPolicy::new(sets, ways)),
    }
}
