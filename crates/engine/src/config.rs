//! Configuration system for the cache engine.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the engine. It provides:
//! 1. **Defaults:** Baseline cache geometry and engine timing constants.
//! 2. **Structures:** The immutable `CacheConfiguration` and the `EngineConfig` settings.
//! 3. **Enums:** Cache organisation, write policies, replacement policy and memory contents.
//!
//! Configuration is supplied as JSON by the presentation layer or via `Default` for the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::common::error::ConfigError;

/// Default configuration constants for the engine.
mod defaults {
    /// Default cache size in bytes (four 8-byte blocks).
    pub const CACHE_SIZE: usize = 32;

    /// Default block size in bytes.
    pub const BLOCK_SIZE: usize = 8;

    /// Default word size in bytes.
    pub const WORD_SIZE: usize = 4;

    /// Simulated main-memory latency before a fill completes.
    pub const FILL_LATENCY_MS: u64 = 750;

    /// Seed for the random replacement policy and random memory contents.
    pub const SEED: u64 = 123_456_789;
}

/// Cache organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum CacheType {
    /// One way per set.
    #[default]
    #[serde(alias = "Direct Mapped", alias = "DIRECT-MAPPED")]
    Direct,
    /// User-supplied ways per set.
    #[serde(alias = "Set Associative")]
    SetAssociative,
    /// A single set holding every block.
    #[serde(alias = "Fully Associative", alias = "FULLY-ASSOCIATIVE")]
    Associative,
}

impl CacheType {
    /// Human-readable organisation name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Direct => "direct-mapped",
            Self::SetAssociative => "set-associative",
            Self::Associative => "fully associative",
        }
    }
}

/// Policy applied when a write hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum WriteHitPolicy {
    /// Update the way and main memory together.
    #[default]
    WriteThrough,
    /// Update the way only and mark it dirty.
    WriteBack,
}

/// Policy applied when a write misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum WriteMissPolicy {
    /// Fill the block, then apply the hit policy.
    #[default]
    WriteAllocate,
    /// Write main memory directly and leave the cache untouched.
    WriteNoAllocate,
}

/// Cache replacement policy algorithms.
///
/// Specifies the algorithm used to select which way to evict when a new block
/// must be installed in a set with no free way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Uniform pick among evictable ways.
    #[default]
    #[serde(alias = "Random")]
    Random,
    /// Evicts the way installed longest ago.
    #[serde(alias = "Fifo")]
    Fifo,
    /// Evicts the way with the fewest accesses, oldest install first on ties.
    #[serde(alias = "Lfu")]
    Lfu,
    /// Evicts the way accessed least recently.
    #[serde(alias = "Lru")]
    Lru,
}

/// Initial main-memory contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemoryInit {
    /// Every word is zero.
    Zero,
    /// Word `i` holds `i`.
    #[default]
    Sequential,
    /// Seeded pseudo-random words.
    Random,
}

macro_rules! display_as_serde_name {
    ($($ty:ty => { $($variant:ident => $name:literal),+ $(,)? }),+ $(,)?) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(match self { $(Self::$variant => $name),+ })
            }
        })+
    };
}

display_as_serde_name! {
    CacheType => { Direct => "DIRECT", SetAssociative => "SET-ASSOCIATIVE", Associative => "ASSOCIATIVE" },
    WriteHitPolicy => { WriteThrough => "WRITE-THROUGH", WriteBack => "WRITE-BACK" },
    WriteMissPolicy => { WriteAllocate => "WRITE-ALLOCATE", WriteNoAllocate => "WRITE-NO-ALLOCATE" },
    ReplacementPolicy => { Random => "RANDOM", Fifo => "FIFO", Lfu => "LFU", Lru => "LRU" },
}

/// User-facing cache configuration.
///
/// Immutable once a simulation is built from it; reconfiguration replaces the whole
/// simulation rather than mutating fields.
///
/// # Examples
///
/// ```
/// use cachesim_core::config::{CacheConfiguration, CacheType, WriteHitPolicy};
///
/// let json = r#"{
///     "cacheType": "SET-ASSOCIATIVE",
///     "cacheSizeBytes": 64,
///     "blockSizeBytes": 8,
///     "wordSizeBytes": 4,
///     "ways": 2,
///     "writePolicyOnHit": "WRITE-BACK",
///     "writePolicyOnMiss": "WRITE-ALLOCATE",
///     "replacementPolicy": "LRU"
/// }"#;
///
/// let config = CacheConfiguration::from_json(json).unwrap();
/// assert_eq!(config.cache_type, CacheType::SetAssociative);
/// assert_eq!(config.write_policy_on_hit, WriteHitPolicy::WriteBack);
/// assert_eq!(config.ways, Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfiguration {
    /// Cache organisation.
    #[serde(default)]
    pub cache_type: CacheType,

    /// Total cache capacity in bytes.
    #[serde(default = "CacheConfiguration::default_cache_size", alias = "cacheSize")]
    pub cache_size_bytes: usize,

    /// Block (line) size in bytes.
    #[serde(default = "CacheConfiguration::default_block_size", alias = "blockSize")]
    pub block_size_bytes: usize,

    /// Word size in bytes.
    #[serde(default = "CacheConfiguration::default_word_size", alias = "wordSize")]
    pub word_size_bytes: usize,

    /// Ways per set; required for set-associative caches, implied otherwise.
    #[serde(default, alias = "associativity")]
    pub ways: Option<usize>,

    /// Write-hit policy.
    #[serde(default, alias = "writePolicyHit")]
    pub write_policy_on_hit: WriteHitPolicy,

    /// Write-miss policy.
    #[serde(default, alias = "writePolicyMiss")]
    pub write_policy_on_miss: WriteMissPolicy,

    /// Replacement policy.
    #[serde(default)]
    pub replacement_policy: ReplacementPolicy,
}

impl CacheConfiguration {
    /// Returns the default cache size in bytes.
    fn default_cache_size() -> usize {
        defaults::CACHE_SIZE
    }

    /// Returns the default block size in bytes.
    fn default_block_size() -> usize {
        defaults::BLOCK_SIZE
    }

    /// Returns the default word size in bytes.
    fn default_word_size() -> usize {
        defaults::WORD_SIZE
    }

    /// Parses a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is malformed or names an unknown
    /// enum variant. Geometry is not validated here; see
    /// [`Geometry::from_config`](crate::cache::geometry::Geometry::from_config).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its contents are malformed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }
}

impl Default for CacheConfiguration {
    /// Direct-mapped, 32-byte cache of 8-byte blocks and 4-byte words,
    /// write-through/write-allocate with random replacement.
    fn default() -> Self {
        Self {
            cache_type: CacheType::default(),
            cache_size_bytes: defaults::CACHE_SIZE,
            block_size_bytes: defaults::BLOCK_SIZE,
            word_size_bytes: defaults::WORD_SIZE,
            ways: None,
            write_policy_on_hit: WriteHitPolicy::default(),
            write_policy_on_miss: WriteMissPolicy::default(),
            replacement_policy: ReplacementPolicy::default(),
        }
    }
}

/// Engine settings that are not part of the cache's architectural description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Delay between a miss being admitted and its fill completing.
    #[serde(default = "EngineConfig::default_fill_latency_ms")]
    pub fill_latency_ms: u64,

    /// Initial main-memory contents.
    #[serde(default)]
    pub memory_init: MemoryInit,

    /// Seed for random replacement and random memory contents.
    #[serde(default = "EngineConfig::default_seed")]
    pub seed: u64,
}

impl EngineConfig {
    /// Returns the default fill latency in milliseconds.
    fn default_fill_latency_ms() -> u64 {
        defaults::FILL_LATENCY_MS
    }

    /// Returns the default RNG seed.
    fn default_seed() -> u64 {
        defaults::SEED
    }

    /// Fill latency as a [`Duration`].
    pub const fn fill_latency(&self) -> Duration {
        Duration::from_millis(self.fill_latency_ms)
    }

    /// Parses engine settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fill_latency_ms: defaults::FILL_LATENCY_MS,
            memory_init: MemoryInit::default(),
            seed: defaults::SEED,
        }
    }
}
