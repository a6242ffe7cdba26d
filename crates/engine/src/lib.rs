//! Single-level cache simulator library.
//!
//! This crate models one cache in front of a small main memory, with a per-way miss
//! FSM and delayed fills. It provides:
//! 1. **Cache:** Geometry and address decoding, the set store, replacement and write
//!    policies, and the `INVALID` / `MISS_PENDING` / `VALID` / `MODIFIED` FSM.
//! 2. **Memory:** A 64-word backing store with traffic counters.
//! 3. **Simulation:** The request processor, timed fills, and fill event delivery.
//! 4. **Configuration:** Serde-backed cache and engine settings.
//! 5. **Statistics:** Hit, miss, fill, and write-back counters.

/// Cache building blocks (geometry, lines, policies, FSM, set store).
pub mod cache;
/// Common types and constants (addresses, access types, errors).
pub mod common;
/// Cache and engine configuration.
pub mod config;
/// Main memory.
pub mod memory;
/// Request processor, fill scheduler, and service facade.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Cache configuration; use `CacheConfiguration::default()` or deserialize from JSON.
pub use crate::config::{CacheConfiguration, EngineConfig};
/// Error types surfaced by the engine.
pub use crate::common::error::{CacheError, ConfigError, RequestError};
/// Request processor and thread-safe service.
pub use crate::sim::{CacheRequest, CacheService, Simulator};
