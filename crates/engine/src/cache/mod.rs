//! Single-Level Cache Model.
//!
//! This module implements the building blocks of the cache: geometry and address
//! decoding, the set store with its ways, the replacement and write policies, and
//! the per-way FSM. The request processor in [`crate::sim`] composes them.

/// Per-way finite state machine and transition tables.
pub mod fsm;

/// Geometry calculator and address decoder.
pub mod geometry;

/// Lines, ways and FSM states.
pub mod line;

/// Cache replacement policy implementations (Random, FIFO, LFU, LRU).
pub mod policies;

/// Set store owning every line.
pub mod store;

/// Write-hit / write-miss policy decisions.
pub mod write_policy;

pub use fsm::{CacheEvent, FsmAction, TableKind, TransitionArc, TransitionTable};
pub use geometry::Geometry;
pub use line::{LineSnapshot, LineState, WaySnapshot};
pub use store::SetStore;
pub use write_policy::{WriteDecision, WritePolicy};
