//! Tests for request processing.


/// Hit, miss, fill and invalidate paths of the simulator.
pub mod simulator;

/// End-to-end scenarios on small caches.
pub mod scenarios;

/// Timed fill delivery.
pub mod scheduler;

/// Threaded service, generations and event delivery.
pub mod service;
