//! Simulator Tests.
//!
//! Exercises the request processor directly, completing fills by hand so every
//! intermediate state can be inspected.

use pretty_assertions::assert_eq;

use cachesim_core::cache::fsm::FsmAction;
use cachesim_core::cache::line::LineState;
use cachesim_core::cache::write_policy::WriteDecision;
use cachesim_core::common::addr::Address;
use cachesim_core::common::data::AccessType;
use cachesim_core::common::error::CacheError;
use cachesim_core::config::{MemoryInit, ReplacementPolicy};
use cachesim_core::sim::{CacheRequest, FillTicket, MemoryWrite};
use cachesim_core::Simulator;

use crate::common::CacheBuilder;

fn fill(sim: &mut Simulator, request: CacheRequest) -> cachesim_core::sim::FillEvent {
    let outcome = sim.handle(&request).expect("miss admitted");
    sim.complete_fill(outcome.fill.expect("fill scheduled"))
        .expect("fill completes")
}

// ══════════════════════════════════════════════════════════
// 1. Hits
// ══════════════════════════════════════════════════════════

/// A read hit returns the word at its offset and touches no memory.
#[test]
fn read_hit_serves_word() {
    let mut sim = CacheBuilder::new().build();
    let _ = fill(&mut sim, CacheRequest::read(8));
    let reads = sim.memory().reads();

    let response = sim.handle(&CacheRequest::read(12)).expect("hit").response;
    assert!(response.hit);
    assert_eq!(response.decision, WriteDecision::ServeFromCache);
    assert_eq!(response.data, Some(3));
    assert_eq!(response.block, Some(0));
    assert_eq!(response.block_data, vec![2, 3]);
    assert_eq!(response.memory_index, None);
    assert_eq!(sim.memory().reads(), reads);
}

/// Under write-through a write hit writes exactly one word to memory.
#[test]
fn write_through_hit_writes_memory() {
    let mut sim = CacheBuilder::new().build();
    let _ = fill(&mut sim, CacheRequest::read(0));
    let writes = sim.memory().writes();

    let response = sim.handle(&CacheRequest::write(4, 77)).expect("hit").response;
    assert_eq!(response.new_state, LineState::Valid);
    assert_eq!(response.memory_index, Some(1));
    assert_eq!(response.memory_data, vec![77]);
    assert_eq!(sim.memory().words()[1], 77);
    assert_eq!(sim.memory().writes(), writes + 1);
}

/// Under write-back a write hit dirties the way and a later read sees the value
/// with no memory traffic.
#[test]
fn write_back_hit_stays_in_cache() {
    let mut sim = CacheBuilder::new().write_back().build();
    let _ = fill(&mut sim, CacheRequest::read(0));
    let (reads, writes) = (sim.memory().reads(), sim.memory().writes());

    let write = sim.handle(&CacheRequest::write(0, 55)).expect("hit").response;
    assert_eq!(write.old_state, LineState::Valid);
    assert_eq!(write.new_state, LineState::Modified);
    assert_eq!(write.memory_index, None);

    let read = sim.handle(&CacheRequest::read(0)).expect("hit").response;
    assert_eq!(read.data, Some(55));
    assert_eq!(read.new_state, LineState::Modified);
    assert_eq!(sim.memory().words()[0], 0);
    assert_eq!((sim.memory().reads(), sim.memory().writes()), (reads, writes));
}

/// Written values are truncated to the word width.
#[test]
fn write_value_is_masked_to_word() {
    let mut sim = CacheBuilder::new().sizes(16, 4, 1).build();
    let _ = fill(&mut sim, CacheRequest::read(0));
    let response = sim.handle(&CacheRequest::write(0, 0x1ff)).expect("hit").response;
    assert_eq!(response.data, Some(0xff));
}

// ══════════════════════════════════════════════════════════
// 2. Misses and fills
// ══════════════════════════════════════════════════════════

/// A read miss installs the tag as pending and answers through the fill.
#[test]
fn read_miss_then_fill() {
    let mut sim = CacheBuilder::new().build();
    let outcome = sim.handle(&CacheRequest::read(0x1c)).expect("miss");
    let response = outcome.response;
    assert!(!response.hit);
    assert!(response.pending);
    assert_eq!(response.old_state, LineState::Invalid);
    assert_eq!(response.new_state, LineState::MissPending);
    assert_eq!((response.index, response.tag, response.offset), (3, 0, 4));
    assert_eq!(response.removed_tag, None);
    assert_eq!(response.data, None);
    assert_eq!(response.transitions.len(), 1);
    assert_eq!(response.transitions[0].action, FsmAction::MemRead);

    let ticket = outcome.fill.expect("fill scheduled");
    assert_eq!((ticket.index, ticket.way), (3, 0));
    assert_eq!(sim.pending_fills(), vec![ticket]);

    let event = sim.complete_fill(ticket).expect("fill");
    assert_eq!(event.old_state, LineState::MissPending);
    assert_eq!(event.new_state, LineState::Valid);
    assert_eq!(event.access, AccessType::Read);
    assert_eq!(event.data, Some(7));
    assert_eq!(event.cache_final, vec![6, 7]);
    assert_eq!(event.memory_index, 6);
    assert_eq!(event.memory_data, vec![6, 7]);
    assert_eq!(event.address, Address::new(0x1c));
    assert!(sim.pending_fills().is_empty());
}

/// A write-allocate miss under write-through merges the value and writes it
/// through when the fill lands.
#[test]
fn write_allocate_write_through_fill() {
    let mut sim = CacheBuilder::new().build();
    let outcome = sim.handle(&CacheRequest::write(4, 40)).expect("miss");
    assert_eq!(outcome.response.decision, WriteDecision::AllocateThenWrite);
    assert_eq!(sim.memory().words()[1], 1);

    let event = sim.complete_fill(outcome.fill.expect("fill")).expect("fill");
    assert_eq!(event.new_state, LineState::Valid);
    assert_eq!(event.transition.action, FsmAction::MemWrite);
    assert_eq!(event.cache_final, vec![0, 40]);
    assert_eq!(event.memory_data, vec![0, 40]);
    assert_eq!(sim.memory().words()[1], 40);
}

/// A write-no-allocate miss writes memory and leaves the cache untouched.
#[test]
fn write_no_allocate_bypasses_cache() {
    let mut sim = CacheBuilder::new().no_allocate().build();
    let outcome = sim.handle(&CacheRequest::write(8, 99)).expect("bypass");
    assert!(outcome.fill.is_none());
    let response = outcome.response;
    assert_eq!(response.decision, WriteDecision::BypassCacheWriteMemoryDirectly);
    assert_eq!(response.block, None);
    assert_eq!(response.new_state, LineState::Invalid);
    assert_eq!(response.memory_index, Some(2));
    assert_eq!(sim.memory().words()[2], 99);
    assert_eq!(sim.store().lookup(1, 0), None);
}

/// A ticket only completes once.
#[test]
fn fill_ticket_is_single_use() {
    let mut sim = CacheBuilder::new().build();
    let outcome = sim.handle(&CacheRequest::read(0)).expect("miss");
    let ticket = outcome.fill.expect("fill");
    let _ = sim.complete_fill(ticket).expect("first completion");
    assert!(matches!(
        sim.complete_fill(ticket),
        Err(CacheError::StaleFill { index: 0, way: 0 })
    ));
    assert!(matches!(
        sim.complete_fill(FillTicket { ticket: 0, index: 99, way: 0 }),
        Err(CacheError::StaleFill { .. })
    ));
}

/// Dirty victims are written back to their own block before reuse.
#[test]
fn dirty_eviction_writes_back_before_reuse() {
    let mut sim = CacheBuilder::new().write_back().build();
    let _ = fill(&mut sim, CacheRequest::write(4, 44));

    let outcome = sim.handle(&CacheRequest::read(32)).expect("conflict miss");
    let response = outcome.response;
    assert_eq!(response.removed_tag, Some(0));
    assert_eq!(response.old_state, LineState::Invalid);
    assert_eq!(response.new_state, LineState::MissPending);
    assert_eq!(
        (response.transitions[0].from, response.transitions[0].to),
        (LineState::Modified, LineState::Invalid)
    );
    assert_eq!(
        response.write_back,
        Some(MemoryWrite {
            memory_index: 0,
            memory_data: vec![0, 44]
        })
    );
    assert_eq!(response.transitions[0].action, FsmAction::WriteBack);
    assert_eq!(response.transitions[1].action, FsmAction::MemRead);
    assert_eq!(sim.memory().words()[1], 44);

    let event = sim.complete_fill(outcome.fill.expect("fill")).expect("fill");
    assert_eq!(event.cache_final, vec![8, 9]);
}

/// Write-through never writes back on eviction.
#[test]
fn clean_eviction_has_no_write_back() {
    let mut sim = CacheBuilder::new().build();
    let _ = fill(&mut sim, CacheRequest::write(4, 44));
    let writes = sim.memory().writes();

    let response = sim.handle(&CacheRequest::read(32)).expect("conflict miss").response;
    assert_eq!(response.removed_tag, Some(0));
    assert_eq!(response.old_state, LineState::Invalid);
    assert_eq!(response.transitions[0].from, LineState::Valid);
    assert_eq!(response.write_back, None);
    assert_eq!(response.transitions[0].action, FsmAction::None);
    assert_eq!(sim.memory().writes(), writes);
}

/// LRU picks the least recently used way of a full set.
#[test]
fn lru_victim_in_full_set() {
    let mut sim = CacheBuilder::new()
        .set_associative(2)
        .policy(ReplacementPolicy::Lru)
        .build();
    let _ = fill(&mut sim, CacheRequest::read(0));
    let _ = fill(&mut sim, CacheRequest::read(16));
    let _ = sim.handle(&CacheRequest::read(0)).expect("hit");

    let response = sim.handle(&CacheRequest::read(32)).expect("miss").response;
    assert_eq!(response.block, Some(1));
    assert_eq!(response.removed_tag, Some(1));
}

// ══════════════════════════════════════════════════════════
// 3. Rejections leave state unchanged
// ══════════════════════════════════════════════════════════

/// A second access to a pending block is rejected and changes nothing.
#[test]
fn pending_block_is_busy() {
    let mut sim = CacheBuilder::new().build();
    let _ = sim.handle(&CacheRequest::read(0)).expect("miss");
    let before = sim.snapshot();

    let err = sim.handle(&CacheRequest::write(4, 1)).expect_err("busy");
    assert!(matches!(err, CacheError::SetBusy { index: 0, pending_tag: 0 }));
    assert!(err.is_retryable());
    assert_eq!(sim.snapshot(), before);
}

/// A direct-mapped line holding a pending fill rejects conflicting tags as busy.
#[test]
fn direct_mapped_conflict_with_pending_is_busy() {
    let mut sim = CacheBuilder::new().build();
    let _ = sim.handle(&CacheRequest::read(0)).expect("miss");
    let before = sim.snapshot();
    let err = sim.handle(&CacheRequest::read(32)).expect_err("busy");
    assert!(matches!(err, CacheError::SetBusy { index: 0, pending_tag: 0 }));
    assert_eq!(sim.snapshot(), before);
}

/// A write without data never reaches the cache.
#[test]
fn write_without_data_is_rejected() {
    let mut sim = CacheBuilder::new().build();
    let request = CacheRequest {
        data: None,
        ..CacheRequest::write(0, 0)
    };
    assert!(matches!(sim.handle(&request), Err(CacheError::Request(_))));
    assert!(sim.pending_fills().is_empty());
}

// ══════════════════════════════════════════════════════════
// 4. Invalidate and flush
// ══════════════════════════════════════════════════════════

/// Invalidating an absent block takes the I -> I arc.
#[test]
fn invalidate_absent_block() {
    let mut sim = CacheBuilder::new().build();
    let outcome = sim.invalidate(Address::new(8)).expect("no-op");
    assert_eq!(outcome.way, None);
    assert_eq!(outcome.old_state, LineState::Invalid);
    assert_eq!(outcome.new_state, LineState::Invalid);
    assert_eq!(outcome.transition.action, FsmAction::None);
}

/// A pending block cannot be invalidated.
#[test]
fn invalidate_pending_block_is_busy() {
    let mut sim = CacheBuilder::new().build();
    let _ = sim.handle(&CacheRequest::read(8)).expect("miss");
    assert!(matches!(
        sim.invalidate(Address::new(8)),
        Err(CacheError::SetBusy { index: 1, .. })
    ));
    assert_eq!(sim.store().way(1, 0).state(), LineState::MissPending);
}

/// Flush writes back dirty ways, clears resident ones, and leaves pending ones.
#[test]
fn flush_skips_pending_ways() {
    let mut sim = CacheBuilder::new()
        .write_back()
        .memory(MemoryInit::Zero)
        .build();
    let _ = fill(&mut sim, CacheRequest::write(0, 1));
    let _ = fill(&mut sim, CacheRequest::read(8));
    let _ = sim.handle(&CacheRequest::read(16)).expect("miss");

    let outcomes = sim.flush().expect("flush");
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].write_back.is_some());
    assert!(outcomes[1].write_back.is_none());
    assert_eq!(sim.memory().words()[0], 1);
    assert_eq!(sim.store().way(0, 0).state(), LineState::Invalid);
    assert_eq!(sim.store().way(1, 0).state(), LineState::Invalid);
    assert_eq!(sim.store().way(2, 0).state(), LineState::MissPending);
    assert_eq!(sim.stats().invalidations, 2);
}

// ══════════════════════════════════════════════════════════
// 5. Records
// ══════════════════════════════════════════════════════════

/// Absent indices serialize as -1 and states by name.
#[test]
fn response_wire_format() {
    let mut sim = CacheBuilder::new().build();
    let response = sim.handle(&CacheRequest::read(0)).expect("miss").response;
    let value = serde_json::to_value(&response).expect("serializes");
    assert_eq!(value["removedTag"], -1);
    assert_eq!(value["memoryIndex"], -1);
    assert_eq!(value["block"], 0);
    assert_eq!(value["oldState"], "INVALID");
    assert_eq!(value["newState"], "MISS_PENDING");
    assert_eq!(value["action"], "READ");
    assert_eq!(value["transitions"][0]["action"], "MEM_READ");
}

/// The configure record carries the initial memory and the active table.
#[test]
fn configure_response() {
    let sim = CacheBuilder::new().build();
    let configured = sim.configure_response();
    assert_eq!(configured.memory.len(), 64);
    assert_eq!(configured.memory[5], 5);
    assert_eq!(configured.geometry.num_lines, 4);
    assert_eq!(configured.transitions, sim.table().arcs());
    assert!(configured.message.contains("DIRECT"));
}
