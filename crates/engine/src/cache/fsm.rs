//! Per-Way Finite State Machine.
//!
//! Each way moves between `INVALID`, `MISS_PENDING`, `VALID` and `MODIFIED` in
//! response to CPU requests, memory responses and invalidations. The arcs depend on
//! the write-policy pair, so one [`TransitionTable`] is built per configuration and
//! consulted for every step.
//!
//! Pairs with no arc are errors, never silent no-ops: the request processor looks
//! up every arc it needs before mutating anything, so a rejected step leaves the
//! way untouched.

use serde::Serialize;
use std::fmt;

use crate::cache::line::LineState;
use crate::cache::write_policy::WritePolicy;
use crate::common::error::CacheError;

/// Input to the per-way FSM.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheEvent {
    /// Drop the block, writing it back if dirty.
    Invalidate,
    /// CPU store to the block.
    CpuWrite,
    /// CPU load from the block.
    CpuRead,
    /// Fill completed for a miss caused by a read.
    MemRespAfterRead,
    /// Fill completed for a miss caused by a write.
    MemRespAfterWrite,
}

impl CacheEvent {
    /// Every event, in diagram order.
    pub const ALL: [Self; 5] = [
        Self::Invalidate,
        Self::CpuWrite,
        Self::CpuRead,
        Self::MemRespAfterRead,
        Self::MemRespAfterWrite,
    ];

    /// Diagram label of the event.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Invalidate => "Invalidate",
            Self::CpuWrite => "CPUWr",
            Self::CpuRead => "CPURd",
            Self::MemRespAfterRead => "MemResp & wasRd",
            Self::MemRespAfterWrite => "MemResp & wasWr",
        }
    }
}

impl fmt::Display for CacheEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Side effect attached to an arc.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FsmAction {
    /// No memory interaction.
    None,
    /// Fetch the block from main memory.
    MemRead,
    /// Write the accessed word to main memory.
    MemWrite,
    /// Write the dirty block back to main memory.
    WriteBack,
    /// The block is busy; the request must wait.
    Wait,
    /// Answer the CPU from the way.
    CpuResp,
}

impl FsmAction {
    /// Diagram label of the action.
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "-",
            Self::MemRead => "MemRd",
            Self::MemWrite => "MemWr",
            Self::WriteBack => "WriteBack",
            Self::Wait => "Wait",
            Self::CpuResp => "CPUResp",
        }
    }
}

/// One arc of the transition table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionArc {
    /// Source state.
    pub from: LineState,
    /// Triggering event.
    pub event: CacheEvent,
    /// Destination state.
    pub to: LineState,
    /// Side effect.
    pub action: FsmAction,
}

impl TransitionArc {
    const fn new(from: LineState, event: CacheEvent, to: LineState, action: FsmAction) -> Self {
        Self {
            from,
            event,
            to,
            action,
        }
    }

    /// Diagram label, e.g. `CPUWr / MemRd`.
    pub fn label(&self) -> String {
        format!("{} / {}", self.event.label(), self.action.label())
    }
}

impl fmt::Display for TransitionArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [{}]",
            self.from.short(),
            self.to.short(),
            self.label()
        )
    }
}

/// Which family of arcs the write-miss policy selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableKind {
    /// Write misses fetch the block (`I -> MP` on `CPUWr`).
    Allocate,
    /// Write misses bypass the cache (`I -> I` on `CPUWr`).
    NoAllocate,
}

/// The transition table active for one configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionTable {
    policy: WritePolicy,
    kind: TableKind,
    arcs: Vec<TransitionArc>,
}

impl TransitionTable {
    /// Builds the table for a write-policy pair.
    ///
    /// `MODIFIED` rows exist only under write-back; the `MemResp & wasWr` arc exists
    /// only under write-allocate, resolving to `MODIFIED` under write-back and to
    /// `VALID` with a memory write under write-through.
    pub fn for_policy(policy: WritePolicy) -> Self {
        use CacheEvent::{CpuRead, CpuWrite, Invalidate, MemRespAfterRead, MemRespAfterWrite};
        use LineState::{Invalid, MissPending, Modified, Valid};

        let allocate = policy.is_write_allocate();
        let write_back = policy.is_write_back();
        let mut arcs = Vec::with_capacity(13);

        arcs.push(TransitionArc::new(Invalid, Invalidate, Invalid, FsmAction::None));
        if allocate {
            arcs.push(TransitionArc::new(Invalid, CpuWrite, MissPending, FsmAction::MemRead));
        } else {
            arcs.push(TransitionArc::new(Invalid, CpuWrite, Invalid, FsmAction::MemWrite));
        }
        arcs.push(TransitionArc::new(Invalid, CpuRead, MissPending, FsmAction::MemRead));

        arcs.push(TransitionArc::new(MissPending, CpuWrite, MissPending, FsmAction::Wait));
        arcs.push(TransitionArc::new(MissPending, CpuRead, MissPending, FsmAction::Wait));
        arcs.push(TransitionArc::new(MissPending, MemRespAfterRead, Valid, FsmAction::CpuResp));
        if allocate {
            arcs.push(if write_back {
                TransitionArc::new(MissPending, MemRespAfterWrite, Modified, FsmAction::None)
            } else {
                TransitionArc::new(MissPending, MemRespAfterWrite, Valid, FsmAction::MemWrite)
            });
        }

        arcs.push(TransitionArc::new(Valid, CpuRead, Valid, FsmAction::CpuResp));
        arcs.push(TransitionArc::new(Valid, Invalidate, Invalid, FsmAction::None));
        arcs.push(if write_back {
            TransitionArc::new(Valid, CpuWrite, Modified, FsmAction::None)
        } else {
            TransitionArc::new(Valid, CpuWrite, Valid, FsmAction::MemWrite)
        });

        if write_back {
            arcs.push(TransitionArc::new(Modified, CpuWrite, Modified, FsmAction::None));
            arcs.push(TransitionArc::new(Modified, CpuRead, Modified, FsmAction::CpuResp));
            arcs.push(TransitionArc::new(Modified, Invalidate, Invalid, FsmAction::WriteBack));
        }

        Self {
            policy,
            kind: if allocate {
                TableKind::Allocate
            } else {
                TableKind::NoAllocate
            },
            arcs,
        }
    }

    /// The write-policy pair this table was built for.
    pub const fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Allocate or no-allocate family.
    pub const fn kind(&self) -> TableKind {
        self.kind
    }

    /// Every arc, in diagram order.
    pub fn arcs(&self) -> &[TransitionArc] {
        &self.arcs
    }

    /// Looks up the arc for `(state, event)`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::IllegalTransition`] if the table has no such arc.
    pub fn next(&self, state: LineState, event: CacheEvent) -> Result<TransitionArc, CacheError> {
        self.arcs
            .iter()
            .find(|arc| arc.from == state && arc.event == event)
            .copied()
            .ok_or(CacheError::IllegalTransition { state, event })
    }
}
