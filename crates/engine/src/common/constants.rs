//! Global Engine Constants.
//!
//! This module defines engine-wide constants. It includes:
//! 1. **Memory Constants:** The fixed main-memory word count.
//! 2. **Wire Constants:** The sentinel used for absent indices in serialized records.

/// Number of words in main memory, independent of cache size.
///
/// Main memory capacity in bytes is `MEMORY_WORDS * word_size_bytes`, which also
/// bounds the physical address space.
pub const MEMORY_WORDS: usize = 64;

/// Wire value for an absent tag, way, or memory index.
pub const NONE_SENTINEL: i64 = -1;

/// Widest word the engine stores, in bytes.
pub const MAX_WORD_BYTES: usize = 8;
