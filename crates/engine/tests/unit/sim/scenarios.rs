//! End-to-end Scenarios.
//!
//! Short request sequences on small caches, checked step by step against the
//! state diagram.

use pretty_assertions::assert_eq;
use rstest::rstest;

use cachesim_core::cache::line::LineState;
use cachesim_core::common::addr::Address;
use cachesim_core::common::error::CacheError;
use cachesim_core::config::{MemoryInit, ReplacementPolicy};
use cachesim_core::sim::CacheRequest;

use crate::common::CacheBuilder;

// ══════════════════════════════════════════════════════════
// 1. Direct-mapped, write-through / write-allocate
// ══════════════════════════════════════════════════════════

/// Read miss, fill, then a hit on the same block.
#[test]
fn read_miss_fill_hit() {
    let mut sim = CacheBuilder::new().build();

    let first = sim.handle(&CacheRequest::read(0)).expect("miss");
    assert_eq!(
        (first.response.old_state, first.response.new_state),
        (LineState::Invalid, LineState::MissPending)
    );
    let event = sim
        .complete_fill(first.fill.expect("fill scheduled"))
        .expect("fill");
    assert_eq!(event.new_state, LineState::Valid);
    assert_eq!(event.data, Some(0));

    let second = sim.handle(&CacheRequest::read(0)).expect("hit").response;
    assert!(second.hit);
    assert_eq!(
        (second.old_state, second.new_state),
        (LineState::Valid, LineState::Valid)
    );
    assert_eq!(second.data, Some(0));
}

/// Conflicting blocks take turns in the single way of their line.
#[test]
fn conflict_misses_alternate() {
    let mut sim = CacheBuilder::new().build();
    for (round, address) in [0_u64, 32, 0, 32].into_iter().enumerate() {
        let outcome = sim.handle(&CacheRequest::read(address)).expect("miss");
        assert!(!outcome.response.hit, "round {round}");
        if round > 0 {
            assert!(outcome.response.removed_tag.is_some(), "round {round}");
        }
        let _ = sim.complete_fill(outcome.fill.expect("fill")).expect("fill");
    }
    assert_eq!(sim.stats().evictions, 3);
    assert_eq!(sim.stats().misses, 4);
}

// ══════════════════════════════════════════════════════════
// 2. Write-back / write-allocate
// ══════════════════════════════════════════════════════════

/// Write miss resolves to MODIFIED; invalidation writes the block back.
#[test]
fn write_miss_then_invalidate_writes_back() {
    let mut sim = CacheBuilder::new()
        .write_back()
        .memory(MemoryInit::Zero)
        .build();

    let outcome = sim.handle(&CacheRequest::write(0, 42)).expect("miss");
    assert_eq!(outcome.response.new_state, LineState::MissPending);
    let event = sim.complete_fill(outcome.fill.expect("fill")).expect("fill");
    assert_eq!(event.new_state, LineState::Modified);
    assert_eq!(event.cache_final, vec![42, 0]);
    assert_eq!(sim.memory().words()[0], 0);

    let invalidated = sim.invalidate(Address::new(0)).expect("invalidate");
    assert_eq!(invalidated.old_state, LineState::Modified);
    assert_eq!(invalidated.new_state, LineState::Invalid);
    let write_back = invalidated.write_back.expect("dirty block written back");
    assert_eq!(write_back.memory_index, 0);
    assert_eq!(write_back.memory_data, vec![42, 0]);
    assert_eq!(sim.memory().words()[0], 42);
    assert_eq!(sim.store().way(0, 0).state(), LineState::Invalid);
}

/// Repeated writes to a dirty block stay in the cache until it is evicted.
#[test]
fn repeated_writes_coalesce() {
    let mut sim = CacheBuilder::new().write_back().build();
    let outcome = sim.handle(&CacheRequest::write(0, 1)).expect("miss");
    let _ = sim.complete_fill(outcome.fill.expect("fill")).expect("fill");
    for value in 2..6 {
        let response = sim.handle(&CacheRequest::write(0, value)).expect("hit").response;
        assert_eq!(response.new_state, LineState::Modified);
    }
    let writes = sim.memory().writes();
    assert_eq!(writes, 0);

    let evict = sim.handle(&CacheRequest::read(32)).expect("conflict miss");
    let write_back = evict.response.write_back.expect("written back");
    assert_eq!(write_back.memory_data, vec![5, 1]);
    assert_eq!(sim.memory().writes(), 1);
}

// ══════════════════════════════════════════════════════════
// 3. Set-associative
// ══════════════════════════════════════════════════════════

/// Two write misses claim both ways of a set; a third miss finds no evictable way.
#[rstest]
#[case(ReplacementPolicy::Random)]
#[case(ReplacementPolicy::Lru)]
#[case(ReplacementPolicy::Fifo)]
#[case(ReplacementPolicy::Lfu)]
fn all_ways_pending(#[case] policy: ReplacementPolicy) {
    let mut sim = CacheBuilder::new().set_associative(2).policy(policy).build();

    let a = sim.handle(&CacheRequest::write(0, 1)).expect("first miss");
    let b = sim.handle(&CacheRequest::write(16, 2)).expect("second miss");
    assert_eq!(a.response.block, Some(0));
    assert_eq!(b.response.block, Some(1));

    let before = sim.snapshot();
    let err = sim.handle(&CacheRequest::write(32, 3)).expect_err("set full");
    assert!(matches!(err, CacheError::NoEvictableWay { index: 0, ways: 2 }));
    assert_eq!(sim.snapshot(), before);

    // The other set is unaffected.
    assert!(sim.handle(&CacheRequest::read(8)).is_ok());

    // Once a fill lands, the retry succeeds by evicting the filled way.
    let _ = sim.complete_fill(a.fill.expect("fill")).expect("fill");
    let retry = sim.handle(&CacheRequest::write(32, 3)).expect("retry");
    assert_eq!(retry.response.block, Some(0));
    assert_eq!(retry.response.removed_tag, Some(0));
}

/// A fully associative cache places any block in any way.
#[test]
fn fully_associative_uses_every_way() {
    let mut sim = CacheBuilder::new()
        .fully_associative()
        .policy(ReplacementPolicy::Fifo)
        .build();
    assert_eq!(sim.geometry().num_lines, 1);
    assert_eq!(sim.geometry().ways, 4);

    for (i, address) in [0_u64, 8, 64, 128].into_iter().enumerate() {
        let outcome = sim.handle(&CacheRequest::read(address)).expect("miss");
        assert_eq!(outcome.response.block, Some(i));
        let _ = sim.complete_fill(outcome.fill.expect("fill")).expect("fill");
    }
    let fifth = sim.handle(&CacheRequest::read(192)).expect("miss").response;
    assert_eq!(fifth.block, Some(0));
    assert_eq!(fifth.removed_tag, Some(0));
}

// ══════════════════════════════════════════════════════════
// 4. Wire format
// ══════════════════════════════════════════════════════════

/// Fill events carry the access type under `type` and state names in full.
#[test]
fn fill_event_wire_format() {
    let mut sim = CacheBuilder::new().build();
    let outcome = sim.handle(&CacheRequest::write(4, 9)).expect("miss");
    let event = sim.complete_fill(outcome.fill.expect("fill")).expect("fill");

    let value = serde_json::to_value(&event).expect("serializes");
    assert_eq!(value["type"], "WRITE");
    assert_eq!(value["oldState"], "MISS_PENDING");
    assert_eq!(value["newState"], "VALID");
    assert_eq!(value["cacheFinal"], serde_json::json!([0, 9]));
    assert_eq!(value["memoryIndex"], 0);
    assert_eq!(value["transition"]["event"], "MEM_RESP_AFTER_WRITE");
    assert_eq!(value["transition"]["action"], "MEM_WRITE");
}

/// An absent block's invalidation reports way -1.
#[test]
fn invalidate_wire_format() {
    let mut sim = CacheBuilder::new().build();
    let outcome = sim.invalidate(Address::new(40)).expect("no-op");
    let value = serde_json::to_value(&outcome).expect("serializes");
    assert_eq!(value["way"], -1);
    assert_eq!(value["writeBack"], serde_json::Value::Null);
}
