//! Set Store.
//!
//! Owns every line of the cache and the replacement policy that ranks their ways.
//! Lookup and free-way search are read-only; install, evict, state changes and data
//! updates are the only mutations and are reachable only from the request processor.

use crate::cache::geometry::Geometry;
use crate::cache::line::{Line, LineSnapshot, LineState, PendingAccess, Way};
use crate::cache::policies::{self, ReplacementPolicy};
use crate::common::data::Word;
use crate::config::ReplacementPolicy as PolicyType;

/// A block removed from the cache to make room for another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evicted {
    /// Tag of the removed block.
    pub tag: u64,
    /// State the way was in before eviction.
    pub state: LineState,
    /// Block contents at eviction time.
    pub data: Vec<Word>,
}

/// The per-line array of ways.
#[derive(Debug)]
pub struct SetStore {
    lines: Vec<Line>,
    ways: usize,
    policy: Box<dyn ReplacementPolicy>,
}

impl SetStore {
    /// Creates a store of invalid ways sized by `geometry`.
    ///
    /// # Arguments
    ///
    /// * `geometry` - Validated cache dimensions.
    /// * `kind` - Replacement policy to rank ways with.
    /// * `seed` - Seed for the random policy.
    pub fn new(geometry: &Geometry, kind: PolicyType, seed: u64) -> Self {
        let words = geometry.words_per_block();
        Self {
            lines: (0..geometry.num_lines)
                .map(|_| Line::new(geometry.ways, words))
                .collect(),
            ways: geometry.ways,
            policy: policies::build(kind, geometry.num_lines, geometry.ways, seed),
        }
    }

    /// Every line, in index order.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// The way at `(index, way)`.
    pub fn way(&self, index: usize, way: usize) -> &Way {
        &self.lines[index].ways()[way]
    }

    /// Finds the way of line `index` holding `tag` in any non-invalid state.
    ///
    /// Tags are unique among non-invalid ways of a line, so at most one way matches.
    pub fn lookup(&self, index: usize, tag: u64) -> Option<usize> {
        self.lines[index].ways().iter().position(|w| w.holds(tag))
    }

    /// First `INVALID` way of line `index`.
    pub fn find_free_way(&self, index: usize) -> Option<usize> {
        self.lines[index]
            .ways()
            .iter()
            .position(|w| w.state() == LineState::Invalid)
    }

    /// First `MISS_PENDING` way of line `index`, if any.
    pub fn find_pending_way(&self, index: usize) -> Option<usize> {
        self.lines[index]
            .ways()
            .iter()
            .position(|w| w.state() == LineState::MissPending)
    }

    /// Asks the replacement policy for a victim among the resident ways of `index`.
    ///
    /// Returns `None` when every way is waiting for a fill.
    pub fn select_victim(&mut self, index: usize) -> Option<usize> {
        let evictable: Vec<bool> = self.lines[index]
            .ways()
            .iter()
            .map(|w| w.state().is_resident())
            .collect();
        let victim = self.policy.get_victim(index, &evictable);
        tracing::trace!(index, ?evictable, ?victim, "victim selection");
        victim
    }

    /// Installs `tag` in `(index, way)` as `MISS_PENDING` and records the install.
    pub(crate) fn install(&mut self, index: usize, way: usize, tag: u64, pending: PendingAccess) {
        self.lines[index].way_mut(way).begin_fill(tag, pending);
        self.policy.on_install(index, way);
    }

    /// Clears `(index, way)` and returns what it held.
    ///
    /// Returns `None` if the way was already invalid.
    pub(crate) fn evict(&mut self, index: usize, way: usize) -> Option<Evicted> {
        let slot = self.lines[index].way_mut(way);
        let evicted = slot.tag().map(|tag| Evicted {
            tag,
            state: slot.state(),
            data: slot.data().to_vec(),
        });
        slot.clear();
        evicted
    }

    /// Sets the FSM state of `(index, way)`.
    pub(crate) fn mark_state(&mut self, index: usize, way: usize, state: LineState) {
        self.lines[index].way_mut(way).set_state(state);
    }

    /// Records a hit on `(index, way)` with the replacement policy.
    pub(crate) fn touch(&mut self, index: usize, way: usize) {
        self.policy.on_access(index, way);
    }

    /// Overwrites one word of `(index, way)`.
    pub(crate) fn write_word(&mut self, index: usize, way: usize, word: usize, value: Word) {
        self.lines[index].way_mut(way).data_mut()[word] = value;
    }

    /// Stores a filled block and resolves the pending state.
    pub(crate) fn resolve(&mut self, index: usize, way: usize, block: &[Word], state: LineState) {
        self.lines[index].way_mut(way).complete_fill(block, state);
    }

    /// Associativity of every line.
    pub const fn ways(&self) -> usize {
        self.ways
    }

    /// Display copy of every line.
    pub fn snapshot(&self) -> Vec<LineSnapshot> {
        self.lines
            .iter()
            .enumerate()
            .map(|(index, line)| LineSnapshot::capture(index, line))
            .collect()
    }
}
