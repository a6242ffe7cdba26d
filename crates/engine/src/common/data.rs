//! Memory Access Types.
//!
//! This module defines the classification of CPU-issued accesses used throughout the engine.
//! These types are used for the following:
//! 1. **Write Policy:** Choosing between serving, writing through, or allocating.
//! 2. **FSM Events:** Mapping a request onto the `CPURead`/`CPUWrite` events.
//! 3. **Statistics Tracking:** Categorizing requests for hit-rate reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single word of cache or main-memory data.
pub type Word = u64;

/// Type of CPU access carried by a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessType {
    /// Data read access.
    ///
    /// Served from the way on a hit; always allocates on a miss.
    #[serde(alias = "read", alias = "Read")]
    Read,

    /// Data write access.
    ///
    /// Handled according to the configured write-hit and write-miss policies.
    #[serde(alias = "write", alias = "Write")]
    Write,
}

impl AccessType {
    /// Returns `true` for [`AccessType::Write`].
    #[inline]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
        })
    }
}
