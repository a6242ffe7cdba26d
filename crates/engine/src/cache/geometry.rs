//! Cache Geometry and Address Decoding.
//!
//! Derives the line count, associativity and address bit-fields from a
//! [`CacheConfiguration`], and splits byte addresses into tag, index and offset.
//!
//! The physical address space is main memory: `address_bits = log2(64 * word_size)`.
//! Addresses wider than that are masked rather than rejected, matching a fixed-width
//! physical bus where upper bits are simply not wired.

use serde::Serialize;

use crate::common::addr::{Address, DecodedAddress};
use crate::common::constants::{MAX_WORD_BYTES, MEMORY_WORDS};
use crate::common::data::Word;
use crate::common::error::GeometryFault;
use crate::config::{CacheConfiguration, CacheType};

/// Derived cache dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    /// Cache organisation the geometry was derived for.
    pub cache_type: CacheType,
    /// Total cache capacity in bytes.
    pub cache_size: usize,
    /// Block size in bytes.
    pub block_size: usize,
    /// Word size in bytes.
    pub word_size: usize,
    /// Ways per set.
    pub ways: usize,
    /// Number of sets (lines).
    pub num_lines: usize,
    /// Width of the byte-offset field.
    pub offset_bits: u32,
    /// Width of the set-index field.
    pub index_bits: u32,
    /// Width of the tag field.
    pub tag_bits: u32,
    /// Width of the physical address space.
    pub address_bits: u32,
}

/// Checks that a size field is a non-zero power of two.
fn require_pow2(field: &'static str, value: usize) -> Result<(), GeometryFault> {
    if value == 0 {
        return Err(GeometryFault::Zero { field });
    }
    if !value.is_power_of_two() {
        return Err(GeometryFault::NotPowerOfTwo { field, value });
    }
    Ok(())
}

impl Geometry {
    /// Computes the geometry for a configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryFault`] if any size is zero or not a power of two, if a
    /// block cannot hold a word, if main memory would not fit the address width, if
    /// the cache cannot hold a block or exceeds main memory, or if the way count does not partition the blocks into a
    /// power-of-two number of lines.
    pub fn from_config(config: &CacheConfiguration) -> Result<Self, GeometryFault> {
        let cache = config.cache_size_bytes;
        let block = config.block_size_bytes;
        let word = config.word_size_bytes;

        require_pow2("cacheSizeBytes", cache)?;
        require_pow2("blockSizeBytes", block)?;
        require_pow2("wordSizeBytes", word)?;

        if block < word {
            return Err(GeometryFault::BlockSmallerThanWord { block, word });
        }
        if cache < block {
            return Err(GeometryFault::CacheSmallerThanBlock { cache, block });
        }
        let memory = MEMORY_WORDS
            .checked_mul(word)
            .ok_or(GeometryFault::WordTooLarge { word })?;
        if cache > memory {
            return Err(GeometryFault::CacheLargerThanMemory { cache, memory });
        }

        let blocks = cache / block;
        let requested = config.ways.filter(|&w| w != 0);
        let ways = match config.cache_type {
            CacheType::Direct => match requested {
                None | Some(1) => 1,
                Some(got) => {
                    return Err(GeometryFault::WaysMismatch {
                        kind: CacheType::Direct.name(),
                        expected: 1,
                        got,
                    });
                }
            },
            CacheType::Associative => match requested {
                None => blocks,
                Some(got) if got == blocks => blocks,
                Some(got) => {
                    return Err(GeometryFault::WaysMismatch {
                        kind: CacheType::Associative.name(),
                        expected: blocks,
                        got,
                    });
                }
            },
            CacheType::SetAssociative => requested.ok_or(GeometryFault::MissingWays)?,
        };

        if blocks % ways != 0 || !(blocks / ways).is_power_of_two() {
            return Err(GeometryFault::WaysDoNotDivide { ways, blocks });
        }
        let num_lines = blocks / ways;

        let offset_bits = block.trailing_zeros();
        let index_bits = num_lines.trailing_zeros();
        let address_bits = memory.trailing_zeros();

        Ok(Self {
            cache_type: config.cache_type,
            cache_size: cache,
            block_size: block,
            word_size: word,
            ways,
            num_lines,
            offset_bits,
            index_bits,
            tag_bits: address_bits - index_bits - offset_bits,
            address_bits,
        })
    }

    /// Words held by one block.
    #[inline]
    pub const fn words_per_block(&self) -> usize {
        self.block_size / self.word_size
    }

    /// Main memory capacity in bytes.
    #[inline]
    pub const fn memory_bytes(&self) -> usize {
        MEMORY_WORDS * self.word_size
    }

    /// Mask selecting the physical address bits.
    #[inline]
    pub const fn address_mask(&self) -> u64 {
        (1u64 << self.address_bits) - 1
    }

    /// Mask truncating a value to the configured word width.
    pub const fn word_mask(&self) -> Word {
        if self.word_size >= MAX_WORD_BYTES {
            Word::MAX
        } else {
            (1 << (self.word_size * 8)) - 1
        }
    }

    /// Splits an address into tag, index and offset.
    ///
    /// Total over all inputs: the address is first masked into the physical space.
    pub const fn decode(&self, addr: Address) -> DecodedAddress {
        let physical = addr.val() & self.address_mask();
        let offset = (physical & (self.block_size as u64 - 1)) as usize;
        let index = ((physical >> self.offset_bits) & (self.num_lines as u64 - 1)) as usize;
        let tag = physical >> (self.offset_bits + self.index_bits);
        let word = offset / self.word_size;
        let memory_word = physical as usize / self.word_size;
        DecodedAddress {
            physical,
            tag,
            index,
            offset,
            word,
            memory_word,
            block_base_word: memory_word - word,
        }
    }

    /// Reassembles an address from its bit-fields.
    ///
    /// Inverse of [`Geometry::decode`] modulo the physical address space.
    pub const fn compose(&self, tag: u64, index: usize, offset: usize) -> Address {
        let line = (tag << self.index_bits) | index as u64;
        Address::new(((line << self.offset_bits) | offset as u64) & self.address_mask())
    }

    /// Main-memory index of the first word of the block `(tag, index)`.
    pub const fn block_base_word(&self, tag: u64, index: usize) -> usize {
        self.compose(tag, index, 0).val() as usize / self.word_size
    }
}
