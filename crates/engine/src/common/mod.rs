//! Common utilities and types used throughout the cache engine.
//!
//! This module provides fundamental building blocks shared across all components. It includes:
//! 1. **Address Types:** Raw byte addresses and decoded tag/index/offset triples.
//! 2. **Constants:** Main memory capacity and wire sentinels.
//! 3. **Access Types:** Read/write classification of CPU requests.
//! 4. **Error Handling:** Configuration, validation and per-request error enums.

/// Address type definitions.
pub mod addr;

/// Common constants used throughout the engine.
pub mod constants;

/// Access type definitions.
pub mod data;

/// Error types.
pub mod error;

/// Serialization helpers for external records.
pub mod wire;

pub use addr::{Address, DecodedAddress};
pub use constants::MEMORY_WORDS;
pub use data::{AccessType, Word};
pub use error::{CacheError, ConfigError, GeometryFault, RequestError};
