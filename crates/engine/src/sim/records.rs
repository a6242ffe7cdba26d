//! Records returned by the simulator.
//!
//! Every record serializes with camelCase keys; absent tags, ways and memory
//! indices are written as `-1` so a presentation layer can render them directly.

use serde::Serialize;

use crate::cache::fsm::TransitionArc;
use crate::cache::geometry::Geometry;
use crate::cache::line::{LineSnapshot, LineState};
use crate::cache::write_policy::WriteDecision;
use crate::common::addr::Address;
use crate::common::data::{AccessType, Word};
use crate::common::wire;

/// A block or word written to main memory as a side effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryWrite {
    /// First main-memory word written.
    pub memory_index: usize,
    /// Words written, in order.
    pub memory_data: Vec<Word>,
}

/// Synchronous answer to a CPU request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheResponse {
    /// Requested address.
    pub address: Address,
    /// Requested access.
    pub action: AccessType,
    /// Whether the block was resident.
    pub hit: bool,
    /// How the write policy classified the request.
    pub decision: WriteDecision,
    /// State of the touched way before the request (`INVALID` on a miss).
    pub old_state: LineState,
    /// State of the touched way after the request.
    pub new_state: LineState,
    /// Set index.
    pub index: usize,
    /// Tag of the requested block.
    pub tag: u64,
    /// Byte offset within the block.
    pub offset: usize,
    /// Tag displaced to make room, or `-1`.
    #[serde(serialize_with = "wire::tag_or_sentinel")]
    pub removed_tag: Option<u64>,
    /// Way touched, or `-1` when the cache was bypassed.
    #[serde(serialize_with = "wire::index_or_sentinel")]
    pub block: Option<usize>,
    /// Word read or written; `None` for a read miss, which is answered by the fill.
    pub data: Option<Word>,
    /// Contents of the touched way after the request.
    pub block_data: Vec<Word>,
    /// Main-memory word written synchronously, or `-1`.
    #[serde(serialize_with = "wire::index_or_sentinel")]
    pub memory_index: Option<usize>,
    /// Values written at `memory_index`.
    pub memory_data: Vec<Word>,
    /// Dirty block written back while evicting.
    pub write_back: Option<MemoryWrite>,
    /// `true` when a fill has been scheduled.
    pub pending: bool,
    /// Arcs taken, in order (eviction first, then the requested block).
    pub transitions: Vec<TransitionArc>,
}

/// Handle for a scheduled fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillTicket {
    /// Unique per simulator.
    pub ticket: u64,
    /// Set index of the pending way.
    pub index: usize,
    /// Pending way.
    pub way: usize,
}

/// A response plus the fill it scheduled, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestOutcome {
    /// The synchronous answer.
    pub response: CacheResponse,
    /// Fill to complete once the memory latency has elapsed.
    pub fill: Option<FillTicket>,
}

/// Asynchronous notification that a pending way has been filled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillEvent {
    /// Ticket the fill was scheduled under.
    pub ticket: u64,
    /// Address of the access that caused the miss.
    pub address: Address,
    /// Set index.
    pub index: usize,
    /// Filled way.
    pub way: usize,
    /// Tag of the filled block.
    pub tag: u64,
    /// Always `MISS_PENDING`.
    pub old_state: LineState,
    /// `VALID` or `MODIFIED`.
    pub new_state: LineState,
    /// Way contents after the fill, including any merged write.
    pub cache_final: Vec<Word>,
    /// First main-memory word of the block.
    pub memory_index: usize,
    /// Main-memory contents of the block after the fill.
    pub memory_data: Vec<Word>,
    /// Access that caused the miss.
    #[serde(rename = "type")]
    pub access: AccessType,
    /// Word delivered to (read) or merged from (write) the CPU.
    pub data: Option<Word>,
    /// Arc taken.
    pub transition: TransitionArc,
}

/// Result of invalidating one block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateOutcome {
    /// Set index.
    pub index: usize,
    /// Tag of the block.
    pub tag: u64,
    /// Way that held it, or `-1` when absent.
    #[serde(serialize_with = "wire::index_or_sentinel")]
    pub way: Option<usize>,
    /// State before invalidation.
    pub old_state: LineState,
    /// Always `INVALID`.
    pub new_state: LineState,
    /// Dirty data written back.
    pub write_back: Option<MemoryWrite>,
    /// Arc taken.
    pub transition: TransitionArc,
}

/// Answer to a configure call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureResponse {
    /// Human-readable summary.
    pub message: String,
    /// Initial main-memory contents.
    pub memory: Vec<Word>,
    /// Derived geometry.
    pub geometry: Geometry,
    /// Active transition table.
    pub transitions: Vec<TransitionArc>,
}

/// Point-in-time copy of the cache and main memory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    /// Every line.
    pub lines: Vec<LineSnapshot>,
    /// Main memory.
    pub memory: Vec<Word>,
}
