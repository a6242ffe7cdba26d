//! Serialization helpers for the external record formats.
//!
//! Absent tags, ways and memory indices cross the boundary as `-1` rather than `null`.

use serde::Serializer;

use super::constants::NONE_SENTINEL;

/// Serializes `Option<u64>` as the value or `-1`.
#[allow(clippy::ref_option, clippy::trivially_copy_pass_by_ref)]
pub fn tag_or_sentinel<S: Serializer>(value: &Option<u64>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => s.serialize_u64(*v),
        None => s.serialize_i64(NONE_SENTINEL),
    }
}

/// Serializes `Option<usize>` as the value or `-1`.
#[allow(clippy::ref_option, clippy::trivially_copy_pass_by_ref)]
pub fn index_or_sentinel<S: Serializer>(value: &Option<usize>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => s.serialize_u64(*v as u64),
        None => s.serialize_i64(NONE_SENTINEL),
    }
}
