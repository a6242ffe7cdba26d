//! Main Memory.
//!
//! This module implements the fixed-size backing store behind the cache. It provides:
//! 1. **Storage:** A flat array of `MEMORY_WORDS` words, created with the configuration.
//! 2. **Access:** Word and block reads/writes, with traffic counters for statistics.
//! 3. **Display:** Chunking of the flat word sequence into block-sized rows.
//!
//! Indices wrap modulo the memory size; decoded addresses are already masked, so
//! wrapping only matters for callers indexing memory directly.

use crate::common::constants::MEMORY_WORDS;
use crate::common::data::Word;
use crate::config::MemoryInit;

/// Word-addressed main memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MainMemory {
    words: Vec<Word>,
    reads: u64,
    writes: u64,
}

impl MainMemory {
    /// Creates main memory with the requested initial contents.
    ///
    /// # Arguments
    ///
    /// * `init` - Initial contents.
    /// * `word_mask` - Mask truncating values to the configured word width.
    /// * `seed` - Seed for [`MemoryInit::Random`].
    pub fn new(init: MemoryInit, word_mask: Word, seed: u64) -> Self {
        let words = match init {
            MemoryInit::Zero => vec![0; MEMORY_WORDS],
            MemoryInit::Sequential => (0..MEMORY_WORDS as Word).map(|i| i & word_mask).collect(),
            MemoryInit::Random => {
                let mut x = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
                (0..MEMORY_WORDS)
                    .map(|_| {
                        x ^= x << 13;
                        x ^= x >> 7;
                        x ^= x << 17;
                        (x % 256) & word_mask
                    })
                    .collect()
            }
        };
        Self {
            words,
            reads: 0,
            writes: 0,
        }
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always `false`; memory has a fixed non-zero size.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The flat word sequence.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Number of read operations served (word or block).
    pub const fn reads(&self) -> u64 {
        self.reads
    }

    /// Number of write operations performed (word or block).
    pub const fn writes(&self) -> u64 {
        self.writes
    }

    /// Reads one word.
    pub fn read_word(&mut self, index: usize) -> Word {
        self.reads += 1;
        self.words[index % MEMORY_WORDS]
    }

    /// Reads `len` consecutive words starting at `base`.
    pub fn read_block(&mut self, base: usize, len: usize) -> Vec<Word> {
        self.reads += 1;
        (0..len).map(|i| self.words[(base + i) % MEMORY_WORDS]).collect()
    }

    /// Copies `len` consecutive words starting at `base` without counting a read.
    pub fn peek_block(&self, base: usize, len: usize) -> Vec<Word> {
        (0..len).map(|i| self.words[(base + i) % MEMORY_WORDS]).collect()
    }

    /// Writes one word.
    pub fn write_word(&mut self, index: usize, value: Word) {
        self.writes += 1;
        self.words[index % MEMORY_WORDS] = value;
    }

    /// Writes a whole block starting at `base`.
    pub fn write_block(&mut self, base: usize, block: &[Word]) {
        self.writes += 1;
        for (i, &value) in block.iter().enumerate() {
            self.words[(base + i) % MEMORY_WORDS] = value;
        }
    }
}

/// Splits a flat word sequence into rows of `width` words.
///
/// A `width` of zero yields a single row.
pub fn rows(words: &[Word], width: usize) -> Vec<Vec<Word>> {
    if width == 0 {
        return vec![words.to_vec()];
    }
    words.chunks(width).map(<[Word]>::to_vec).collect()
}
