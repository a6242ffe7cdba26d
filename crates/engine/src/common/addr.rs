//! Address types.
//!
//! This module defines strong types for CPU-issued addresses. It provides the following:
//! 1. **Type Safety:** Distinguishes raw byte addresses from decoded tag/index/offset triples.
//! 2. **Decoded Fields:** Carries the derived word offset and main-memory word index alongside
//!    the bit-fields so callers never repeat the arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A byte address issued by the CPU.
///
/// Addresses are never range-checked: decoding masks them into the physical
/// address space defined by main memory capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub u64);

impl Address {
    /// Creates a new address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Address {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// An address split into its cache bit-fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedAddress {
    /// The address after masking into the physical address space.
    pub physical: u64,
    /// High-order bits identifying the block within its set.
    pub tag: u64,
    /// Set (line) index.
    pub index: usize,
    /// Byte offset within the block.
    pub offset: usize,
    /// Word offset within the block (`offset / word_size`).
    pub word: usize,
    /// Index of the addressed word in main memory.
    pub memory_word: usize,
    /// Index in main memory of the first word of the addressed block.
    pub block_base_word: usize,
}
