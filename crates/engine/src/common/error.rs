//! Error definitions.
//!
//! This module defines the error taxonomy of the engine. It provides:
//! 1. **Configuration Errors:** Geometry violations and unreadable configuration input,
//!    fatal to the configure call only.
//! 2. **Validation Errors:** Malformed raw request input, rejected before decoding.
//! 3. **Cache Errors:** Recoverable per-request conditions (`NoEvictableWay`, `SetBusy`)
//!    and FSM misuse, each leaving all cache state unchanged.

use thiserror::Error;

use crate::cache::fsm::CacheEvent;
use crate::cache::line::LineState;

/// Reason a cache geometry was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GeometryFault {
    /// A size field was zero.
    #[error("{field} must be non-zero")]
    Zero {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A size field was not a power of two.
    #[error("{field} = {value} is not a power of two")]
    NotPowerOfTwo {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: usize,
    },

    /// The block cannot hold a single word.
    #[error("block size {block} is smaller than word size {word}")]
    BlockSmallerThanWord {
        /// Block size in bytes.
        block: usize,
        /// Word size in bytes.
        word: usize,
    },

    /// The cache cannot hold a single block.
    #[error("cache size {cache} is smaller than block size {block}")]
    CacheSmallerThanBlock {
        /// Cache size in bytes.
        cache: usize,
        /// Block size in bytes.
        block: usize,
    },

    /// A set-associative cache was configured without a way count.
    #[error("set-associative cache requires a non-zero way count")]
    MissingWays,

    /// The way count does not split the blocks into a power-of-two number of lines.
    #[error("{ways} ways do not evenly partition {blocks} blocks into a power-of-two line count")]
    WaysDoNotDivide {
        /// Requested associativity.
        ways: usize,
        /// Total number of blocks in the cache.
        blocks: usize,
    },

    /// A direct-mapped or fully associative cache was given a conflicting way count.
    #[error("{kind} cache requires {expected} ways, got {got}")]
    WaysMismatch {
        /// Cache organisation name.
        kind: &'static str,
        /// Way count implied by the organisation.
        expected: usize,
        /// Way count supplied by the caller.
        got: usize,
    },

    /// Main memory of this word size does not fit the host address width.
    #[error("word size {word} makes main memory larger than the address space")]
    WordTooLarge {
        /// Word size in bytes.
        word: usize,
    },

    /// The cache holds more bytes than main memory.
    #[error("cache size {cache} exceeds main memory capacity {memory}")]
    CacheLargerThanMemory {
        /// Cache size in bytes.
        cache: usize,
        /// Main memory capacity in bytes.
        memory: usize,
    },
}

/// Errors raised while building a configured simulation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The cache geometry violates a sizing invariant.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryFault),

    /// The configuration document could not be deserialized.
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Io {
        /// Path that failed to load.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Malformed raw request input, rejected before address decoding.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The address is not a non-negative integer.
    #[error("address `{0}` is not a non-negative integer")]
    InvalidAddress(String),

    /// The action is neither READ nor WRITE.
    #[error("unknown action `{0}` (expected READ or WRITE)")]
    UnknownAction(String),

    /// A write did not carry exactly one data word.
    #[error("write requests carry exactly one data word, got {0}")]
    WriteDataArity(usize),

    /// A data word is not a non-negative integer.
    #[error("data `{0}` is not a non-negative integer")]
    InvalidData(String),
}

/// Per-request engine conditions.
///
/// `NoEvictableWay` and `SetBusy` are recoverable: the request is rejected, no state
/// changes, and the caller may resubmit once the pending fill resolves.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Every way of the set is waiting for a fill.
    #[error("no evictable way in set {index}: all {ways} ways are pending")]
    NoEvictableWay {
        /// Set index of the rejected request.
        index: usize,
        /// Associativity of the set.
        ways: usize,
    },

    /// The request conflicts with a pending fill in its set.
    #[error("set {index} is busy with a pending fill for tag {pending_tag:#x}")]
    SetBusy {
        /// Set index of the rejected request.
        index: usize,
        /// Tag of the block whose fill is outstanding.
        pending_tag: u64,
    },

    /// The active transition table has no arc for this pair.
    #[error("illegal transition: {event} in state {state}")]
    IllegalTransition {
        /// State the way was in.
        state: LineState,
        /// Event that was applied.
        event: CacheEvent,
    },

    /// A fill ticket no longer matches the way it was issued for.
    #[error("stale fill for set {index} way {way}")]
    StaleFill {
        /// Set index named by the ticket.
        index: usize,
        /// Way named by the ticket.
        way: usize,
    },

    /// No configuration has been applied yet.
    #[error("cache is not configured")]
    NotConfigured,

    /// Configuration failure surfaced through the service facade.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Validation failure surfaced through the service facade.
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl CacheError {
    /// Returns `true` if the caller may resubmit the same request later.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NoEvictableWay { .. } | Self::SetBusy { .. })
    }
}
