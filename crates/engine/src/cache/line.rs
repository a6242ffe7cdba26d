//! Cache lines and ways.
//!
//! A line (set) is a fixed-length sequence of ways; each way holds one block, its tag,
//! and its FSM state. The dirty bit is not stored: a way is dirty exactly when it is
//! `MODIFIED`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::addr::Address;
use crate::common::data::{AccessType, Word};
use crate::common::wire;

/// Per-way FSM state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineState {
    /// Holds no block.
    #[default]
    Invalid,
    /// Tag installed, waiting for main memory.
    MissPending,
    /// Holds a block identical to main memory.
    Valid,
    /// Holds a block newer than main memory.
    Modified,
}

impl LineState {
    /// Every state, in diagram order.
    pub const ALL: [Self; 4] = [Self::Invalid, Self::MissPending, Self::Valid, Self::Modified];

    /// Short diagram label (`I`, `MP`, `V`, `M`).
    pub const fn short(self) -> &'static str {
        match self {
            Self::Invalid => "I",
            Self::MissPending => "MP",
            Self::Valid => "V",
            Self::Modified => "M",
        }
    }

    /// `true` when the way's data can serve a hit.
    #[inline]
    pub const fn is_resident(self) -> bool {
        matches!(self, Self::Valid | Self::Modified)
    }

    /// `true` when the way's data must be written back before reuse.
    #[inline]
    pub const fn is_dirty(self) -> bool {
        matches!(self, Self::Modified)
    }
}

impl fmt::Display for LineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Invalid => "INVALID",
            Self::MissPending => "MISS_PENDING",
            Self::Valid => "VALID",
            Self::Modified => "MODIFIED",
        })
    }
}

/// The CPU access a pending way will complete once its fill arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingAccess {
    /// Access that caused the miss.
    pub access: AccessType,
    /// Address of the access.
    pub address: Address,
    /// Word offset within the block.
    pub word: usize,
    /// Value to merge for a write-allocate miss.
    pub value: Option<Word>,
    /// Identifier of the fill that resolves this way.
    pub ticket: u64,
}

/// One storage slot within a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Way {
    tag: Option<u64>,
    state: LineState,
    data: Vec<Word>,
    pending: Option<PendingAccess>,
}

impl Way {
    /// Creates an invalid, zero-filled way holding `words` words.
    pub fn new(words: usize) -> Self {
        Self {
            tag: None,
            state: LineState::Invalid,
            data: vec![0; words],
            pending: None,
        }
    }

    /// Installed tag, or `None` when invalid.
    #[inline]
    pub const fn tag(&self) -> Option<u64> {
        self.tag
    }

    /// Current FSM state.
    #[inline]
    pub const fn state(&self) -> LineState {
        self.state
    }

    /// Block contents; meaningful only when the state is not `INVALID`.
    #[inline]
    pub fn data(&self) -> &[Word] {
        &self.data
    }

    /// Dirty flag, derived from the state.
    #[inline]
    pub const fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    /// Outstanding access awaiting a fill.
    #[inline]
    pub const fn pending(&self) -> Option<&PendingAccess> {
        self.pending.as_ref()
    }

    /// `true` if this way currently holds (or is fetching) `tag`.
    #[inline]
    pub fn holds(&self, tag: u64) -> bool {
        self.state != LineState::Invalid && self.tag == Some(tag)
    }

    pub(crate) const fn set_state(&mut self, state: LineState) {
        self.state = state;
    }

    pub(crate) fn data_mut(&mut self) -> &mut [Word] {
        &mut self.data
    }

    pub(crate) fn begin_fill(&mut self, tag: u64, pending: PendingAccess) {
        self.tag = Some(tag);
        self.state = LineState::MissPending;
        self.pending = Some(pending);
    }

    pub(crate) fn complete_fill(&mut self, block: &[Word], state: LineState) {
        self.data.copy_from_slice(block);
        self.state = state;
        self.pending = None;
    }

    pub(crate) fn clear(&mut self) {
        self.tag = None;
        self.state = LineState::Invalid;
        self.pending = None;
        self.data.fill(0);
    }
}

/// A set of ways selected by the index bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    ways: Vec<Way>,
}

impl Line {
    /// Creates a line of `ways` invalid ways, each `words` words long.
    pub fn new(ways: usize, words: usize) -> Self {
        Self {
            ways: (0..ways).map(|_| Way::new(words)).collect(),
        }
    }

    /// The ways of this line.
    #[inline]
    pub fn ways(&self) -> &[Way] {
        &self.ways
    }

    pub(crate) fn way_mut(&mut self, way: usize) -> &mut Way {
        &mut self.ways[way]
    }
}

/// Display copy of one way.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaySnapshot {
    /// Way index within its line.
    pub way: usize,
    /// Installed tag, `-1` when invalid.
    #[serde(serialize_with = "wire::tag_or_sentinel")]
    pub tag: Option<u64>,
    /// FSM state.
    pub state: LineState,
    /// Dirty flag.
    pub dirty: bool,
    /// Block contents.
    pub data: Vec<Word>,
}

/// Display copy of one line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSnapshot {
    /// Set index.
    pub index: usize,
    /// Ways in order.
    pub ways: Vec<WaySnapshot>,
}

impl LineSnapshot {
    pub(crate) fn capture(index: usize, line: &Line) -> Self {
        Self {
            index,
            ways: line
                .ways
                .iter()
                .enumerate()
                .map(|(way, w)| WaySnapshot {
                    way,
                    tag: w.tag,
                    state: w.state,
                    dirty: w.is_dirty(),
                    data: w.data.clone(),
                })
                .collect(),
        }
    }
}
