//! Request processing and fill delivery.
//!
//! [`Simulator`] is the single-threaded request processor. [`CacheService`] wraps it
//! for concurrent callers, times fills on a worker thread, and publishes fill events.

/// Fill event fan-out.
pub mod events;

/// Records returned by the simulator.
pub mod records;

/// Request intake and validation.
pub mod request;

/// Deadline-ordered worker thread.
pub mod scheduler;

/// Thread-safe service facade.
pub mod service;

/// Request processor.
pub mod simulator;

pub use events::{EventBus, FillSink};
pub use records::{
    CacheResponse, CacheSnapshot, ConfigureResponse, FillEvent, FillTicket, InvalidateOutcome,
    MemoryWrite, RequestOutcome,
};
pub use request::{CacheRequest, RawRequest};
pub use scheduler::FillScheduler;
pub use service::CacheService;
pub use simulator::Simulator;
