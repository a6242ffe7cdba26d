//! Write Policy.
//!
//! Combines the write-hit policy (write-through / write-back) with the write-miss
//! policy (write-allocate / write-no-allocate) and decides what a request does to
//! the way and to main memory. Reads are covered too so the request processor has
//! a single decision point.

use serde::Serialize;
use std::fmt;

use crate::common::data::AccessType;
use crate::config::{WriteHitPolicy, WriteMissPolicy};

/// What a request does to the cache and main memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteDecision {
    /// Read hit: serve from the way, no memory interaction.
    ServeFromCache,
    /// Read miss: fetch the block.
    AllocateThenRead,
    /// Write-through hit: update the way and issue a synchronous memory write.
    UpdateCacheAndMemory,
    /// Write-back hit: update the way and mark it `MODIFIED`.
    UpdateCacheOnlyMarkDirty,
    /// Write-no-allocate miss: write memory, leave the cache untouched.
    BypassCacheWriteMemoryDirectly,
    /// Write-allocate miss: fetch the block, then apply the hit policy.
    AllocateThenWrite,
}

impl WriteDecision {
    /// `true` when the decision installs a block and schedules a fill.
    pub const fn allocates(self) -> bool {
        matches!(self, Self::AllocateThenRead | Self::AllocateThenWrite)
    }
}

/// The configured write-hit / write-miss pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WritePolicy {
    /// Policy for write hits.
    pub on_hit: WriteHitPolicy,
    /// Policy for write misses.
    pub on_miss: WriteMissPolicy,
}

impl WritePolicy {
    /// Pairs a hit policy with a miss policy.
    pub const fn new(on_hit: WriteHitPolicy, on_miss: WriteMissPolicy) -> Self {
        Self { on_hit, on_miss }
    }

    /// `true` under write-back, where ways can become dirty.
    pub const fn is_write_back(self) -> bool {
        matches!(self.on_hit, WriteHitPolicy::WriteBack)
    }

    /// `true` under write-allocate, where write misses fetch the block.
    pub const fn is_write_allocate(self) -> bool {
        matches!(self.on_miss, WriteMissPolicy::WriteAllocate)
    }

    /// Decides how a request is handled.
    ///
    /// # Arguments
    ///
    /// * `access` - Read or write.
    /// * `hit` - Whether the block is resident (`VALID` or `MODIFIED`).
    pub const fn decide(self, access: AccessType, hit: bool) -> WriteDecision {
        match (access, hit) {
            (AccessType::Read, true) => WriteDecision::ServeFromCache,
            (AccessType::Read, false) => WriteDecision::AllocateThenRead,
            (AccessType::Write, true) => match self.on_hit {
                WriteHitPolicy::WriteThrough => WriteDecision::UpdateCacheAndMemory,
                WriteHitPolicy::WriteBack => WriteDecision::UpdateCacheOnlyMarkDirty,
            },
            (AccessType::Write, false) => match self.on_miss {
                WriteMissPolicy::WriteAllocate => WriteDecision::AllocateThenWrite,
                WriteMissPolicy::WriteNoAllocate => WriteDecision::BypassCacheWriteMemoryDirectly,
            },
        }
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.on_hit, self.on_miss)
    }
}
