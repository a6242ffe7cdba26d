//! Simulator: owns the cache, main memory and the active transition table.
//!
//! Requests are processed one at a time. Each one is classified as a hit or a miss,
//! every FSM arc it needs is looked up before the first mutation, and only then are
//! the way, the replacement metadata and main memory updated. A rejected request
//! (`SetBusy`, `NoEvictableWay`, an illegal transition) therefore leaves all state as
//! it was.
//!
//! Fills are not timed here. A miss returns a [`FillTicket`]; whoever owns the clock
//! hands it back through [`Simulator::complete_fill`] once the latency has elapsed.

use tracing::{debug, trace, warn};

use crate::cache::fsm::{CacheEvent, FsmAction, TransitionArc, TransitionTable};
use crate::cache::geometry::Geometry;
use crate::cache::line::{LineState, PendingAccess};
use crate::cache::store::SetStore;
use crate::cache::write_policy::WritePolicy;
use crate::common::addr::{Address, DecodedAddress};
use crate::common::data::{AccessType, Word};
use crate::common::error::{CacheError, ConfigError, RequestError};
use crate::config::{CacheConfiguration, EngineConfig};
use crate::memory::MainMemory;
use crate::sim::records::{
    CacheResponse, CacheSnapshot, ConfigureResponse, FillEvent, FillTicket, InvalidateOutcome,
    MemoryWrite, RequestOutcome,
};
use crate::sim::request::CacheRequest;
use crate::stats::CacheStats;

const fn cpu_event(access: AccessType) -> CacheEvent {
    match access {
        AccessType::Read => CacheEvent::CpuRead,
        AccessType::Write => CacheEvent::CpuWrite,
    }
}

/// A configured cache in front of main memory.
#[derive(Debug)]
pub struct Simulator {
    config: CacheConfiguration,
    geometry: Geometry,
    policy: WritePolicy,
    table: TransitionTable,
    store: SetStore,
    memory: MainMemory,
    stats: CacheStats,
    next_ticket: u64,
}

impl Simulator {
    /// Validates `config` and builds an empty cache with fresh main memory.
    ///
    /// # Arguments
    ///
    /// * `config` - Architectural description of the cache.
    /// * `engine` - Memory initialisation and replacement seed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGeometry`] if the sizes are inconsistent.
    pub fn new(config: CacheConfiguration, engine: &EngineConfig) -> Result<Self, ConfigError> {
        let geometry = Geometry::from_config(&config)?;
        let policy = WritePolicy::new(config.write_policy_on_hit, config.write_policy_on_miss);
        let table = TransitionTable::for_policy(policy);
        let store = SetStore::new(&geometry, config.replacement_policy, engine.seed);
        let memory = MainMemory::new(engine.memory_init, geometry.word_mask(), engine.seed);
        debug!(
            lines = geometry.num_lines,
            ways = geometry.ways,
            %policy,
            replacement = %config.replacement_policy,
            "simulator built"
        );
        Ok(Self {
            config,
            geometry,
            policy,
            table,
            store,
            memory,
            stats: CacheStats::default(),
            next_ticket: 0,
        })
    }

    /// One-line description of the configuration.
    pub fn summary(&self) -> String {
        let g = &self.geometry;
        format!(
            "{} cache, {} B total, {} B blocks, {} B words, {} lines x {} ways, {}, {} replacement",
            g.cache_type,
            g.cache_size,
            g.block_size,
            g.word_size,
            g.num_lines,
            g.ways,
            self.policy,
            self.config.replacement_policy
        )
    }

    /// The record returned to a configure call.
    pub fn configure_response(&self) -> ConfigureResponse {
        ConfigureResponse {
            message: format!("Cache configured: {}", self.summary()),
            memory: self.memory.words().to_vec(),
            geometry: self.geometry,
            transitions: self.table.arcs().to_vec(),
        }
    }

    /// The configuration this simulator was built from.
    pub const fn config(&self) -> &CacheConfiguration {
        &self.config
    }

    /// Derived geometry.
    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Active transition table.
    pub const fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// The set store.
    pub const fn store(&self) -> &SetStore {
        &self.store
    }

    /// Main memory.
    pub const fn memory(&self) -> &MainMemory {
        &self.memory
    }

    /// Counters, including main-memory traffic.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_reads: self.memory.reads(),
            memory_writes: self.memory.writes(),
            ..self.stats.clone()
        }
    }

    /// Copy of every line and of main memory.
    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            lines: self.store.snapshot(),
            memory: self.memory.words().to_vec(),
        }
    }

    /// Tickets of every fill still outstanding.
    pub fn pending_fills(&self) -> Vec<FillTicket> {
        let mut tickets = Vec::new();
        for (index, line) in self.store.lines().iter().enumerate() {
            for (way, slot) in line.ways().iter().enumerate() {
                if let Some(pending) = slot.pending() {
                    tickets.push(FillTicket {
                        ticket: pending.ticket,
                        index,
                        way,
                    });
                }
            }
        }
        tickets
    }

    /// Processes one CPU request.
    ///
    /// A read or write-allocate miss installs the block as `MISS_PENDING` and returns
    /// a [`FillTicket`] in the outcome; the request is answered again by the
    /// [`FillEvent`] produced when that ticket is completed.
    ///
    /// # Errors
    ///
    /// * [`CacheError::SetBusy`] if the block is still being fetched, or if a
    ///   direct-mapped line is occupied by a pending fill.
    /// * [`CacheError::NoEvictableWay`] if every way of an associative set is pending.
    /// * [`CacheError::Request`] if a write carries no data.
    pub fn handle(&mut self, request: &CacheRequest) -> Result<RequestOutcome, CacheError> {
        let decoded = self.geometry.decode(request.address);
        let value = match request.access {
            AccessType::Read => None,
            AccessType::Write => {
                let raw = request.data.ok_or(RequestError::WriteDataArity(0))?;
                Some(raw & self.geometry.word_mask())
            }
        };

        let result = match self.store.lookup(decoded.index, decoded.tag) {
            Some(way) if self.store.way(decoded.index, way).state() == LineState::MissPending => {
                let arc = self
                    .table
                    .next(LineState::MissPending, cpu_event(request.access))?;
                trace!(%arc, "request waits on pending fill");
                Err(CacheError::SetBusy {
                    index: decoded.index,
                    pending_tag: decoded.tag,
                })
            }
            Some(way) => Ok(RequestOutcome {
                response: self.hit(request, &decoded, way, value)?,
                fill: None,
            }),
            None => self.miss(request, &decoded, value),
        };

        if let Err(err) = &result {
            if err.is_retryable() {
                self.stats.rejected += 1;
            }
            warn!(address = %request.address, access = %request.access, %err, "request rejected");
        }
        result
    }

    fn hit(
        &mut self,
        request: &CacheRequest,
        decoded: &DecodedAddress,
        way: usize,
        value: Option<Word>,
    ) -> Result<CacheResponse, CacheError> {
        let index = decoded.index;
        let old_state = self.store.way(index, way).state();
        let arc = self.table.next(old_state, cpu_event(request.access))?;
        let decision = self.policy.decide(request.access, true);

        let mut memory_index = None;
        let mut memory_data = Vec::new();
        let data = if let Some(v) = value {
            self.store.write_word(index, way, decoded.word, v);
            if arc.action == FsmAction::MemWrite {
                self.memory.write_word(decoded.memory_word, v);
                memory_index = Some(decoded.memory_word);
                memory_data.push(v);
            }
            self.stats.writes += 1;
            self.stats.write_hits += 1;
            v
        } else {
            self.stats.reads += 1;
            self.stats.read_hits += 1;
            self.store.way(index, way).data()[decoded.word]
        };
        self.store.touch(index, way);
        self.store.mark_state(index, way, arc.to);

        debug!(address = %request.address, index, way, %arc, "hit");
        Ok(CacheResponse {
            address: request.address,
            action: request.access,
            hit: true,
            decision,
            old_state,
            new_state: arc.to,
            index,
            tag: decoded.tag,
            offset: decoded.offset,
            removed_tag: None,
            block: Some(way),
            data: Some(data),
            block_data: self.store.way(index, way).data().to_vec(),
            memory_index,
            memory_data,
            write_back: None,
            pending: false,
            transitions: vec![arc],
        })
    }

    fn miss(
        &mut self,
        request: &CacheRequest,
        decoded: &DecodedAddress,
        value: Option<Word>,
    ) -> Result<RequestOutcome, CacheError> {
        let index = decoded.index;
        let event = cpu_event(request.access);
        let decision = self.policy.decide(request.access, false);
        let install = self.table.next(LineState::Invalid, event)?;

        if !decision.allocates() {
            let Some(v) = value else {
                return Err(RequestError::WriteDataArity(0).into());
            };
            self.memory.write_word(decoded.memory_word, v);
            self.stats.writes += 1;
            self.stats.misses += 1;
            self.stats.bypassed_writes += 1;
            debug!(address = %request.address, memory_word = decoded.memory_word, "write bypasses cache");
            return Ok(RequestOutcome {
                response: CacheResponse {
                    address: request.address,
                    action: request.access,
                    hit: false,
                    decision,
                    old_state: install.from,
                    new_state: install.to,
                    index,
                    tag: decoded.tag,
                    offset: decoded.offset,
                    removed_tag: None,
                    block: None,
                    data: Some(v),
                    block_data: Vec::new(),
                    memory_index: Some(decoded.memory_word),
                    memory_data: vec![v],
                    write_back: None,
                    pending: false,
                    transitions: vec![install],
                },
                fill: None,
            });
        }

        let (way, eviction) = match self.store.find_free_way(index) {
            Some(way) => (way, None),
            None => {
                let Some(victim) = self.store.select_victim(index) else {
                    return Err(self.full_set(index));
                };
                let state = self.store.way(index, victim).state();
                (victim, Some(self.table.next(state, CacheEvent::Invalidate)?))
            }
        };

        let mut transitions: Vec<TransitionArc> = Vec::with_capacity(2);
        let mut removed_tag = None;
        let mut write_back = None;
        if let Some(arc) = eviction {
            if let Some(evicted) = self.store.evict(index, way) {
                removed_tag = Some(evicted.tag);
                if arc.action == FsmAction::WriteBack {
                    write_back = Some(self.write_back(index, evicted.tag, &evicted.data));
                }
                self.stats.evictions += 1;
                debug!(index, way, tag = evicted.tag, state = %evicted.state, "evicted");
            }
            transitions.push(arc);
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.store.install(
            index,
            way,
            decoded.tag,
            PendingAccess {
                access: request.access,
                address: request.address,
                word: decoded.word,
                value,
                ticket,
            },
        );
        transitions.push(install);
        match request.access {
            AccessType::Read => self.stats.reads += 1,
            AccessType::Write => self.stats.writes += 1,
        }
        self.stats.misses += 1;

        debug!(address = %request.address, index, way, ticket, "miss, fill scheduled");
        Ok(RequestOutcome {
            response: CacheResponse {
                address: request.address,
                action: request.access,
                hit: false,
                decision,
                old_state: install.from,
                new_state: install.to,
                index,
                tag: decoded.tag,
                offset: decoded.offset,
                removed_tag,
                block: Some(way),
                data: value,
                block_data: self.store.way(index, way).data().to_vec(),
                memory_index: None,
                memory_data: Vec::new(),
                write_back,
                pending: true,
                transitions,
            },
            fill: Some(FillTicket { ticket, index, way }),
        })
    }

    /// Error for a miss whose set has no free and no evictable way.
    fn full_set(&self, index: usize) -> CacheError {
        let ways = self.store.ways();
        let pending_tag = self
            .store
            .find_pending_way(index)
            .and_then(|way| self.store.way(index, way).tag());
        match pending_tag {
            Some(pending_tag) if ways == 1 => CacheError::SetBusy { index, pending_tag },
            _ => CacheError::NoEvictableWay { index, ways },
        }
    }

    fn write_back(&mut self, index: usize, tag: u64, data: &[Word]) -> MemoryWrite {
        let base = self.geometry.block_base_word(tag, index);
        self.memory.write_block(base, data);
        self.stats.write_backs += 1;
        debug!(index, tag, base, "write-back");
        MemoryWrite {
            memory_index: base,
            memory_data: data.to_vec(),
        }
    }

    /// Completes a fill: reads the block from memory, merges a pending write, and
    /// resolves the way to `VALID` or `MODIFIED`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::StaleFill`] if the way no longer waits on this ticket.
    pub fn complete_fill(&mut self, ticket: FillTicket) -> Result<FillEvent, CacheError> {
        let FillTicket {
            ticket: id,
            index,
            way,
        } = ticket;
        let stale = CacheError::StaleFill { index, way };
        if index >= self.geometry.num_lines || way >= self.geometry.ways {
            return Err(stale);
        }
        let slot = self.store.way(index, way);
        let (Some(pending), Some(tag)) = (slot.pending().copied(), slot.tag()) else {
            return Err(stale);
        };
        if pending.ticket != id || slot.state() != LineState::MissPending {
            return Err(stale);
        }

        let event = if pending.access.is_write() {
            CacheEvent::MemRespAfterWrite
        } else {
            CacheEvent::MemRespAfterRead
        };
        let arc = self.table.next(LineState::MissPending, event)?;

        let base = self.geometry.block_base_word(tag, index);
        let len = self.geometry.words_per_block();
        let mut block = self.memory.read_block(base, len);
        if let Some(v) = pending.value {
            block[pending.word] = v;
            if arc.action == FsmAction::MemWrite {
                self.memory.write_word(base + pending.word, v);
            }
        }
        self.store.resolve(index, way, &block, arc.to);
        self.stats.fills += 1;

        debug!(index, way, tag, ticket = id, %arc, "fill completed");
        Ok(FillEvent {
            ticket: id,
            address: pending.address,
            index,
            way,
            tag,
            old_state: arc.from,
            new_state: arc.to,
            data: Some(pending.value.unwrap_or(block[pending.word])),
            cache_final: block,
            memory_index: base,
            memory_data: self.memory.peek_block(base, len),
            access: pending.access,
            transition: arc,
        })
    }

    /// Invalidates the block containing `address`, writing it back if dirty.
    ///
    /// Invalidating an absent block takes the `INVALID -> INVALID` arc and changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::SetBusy`] if the block is waiting for a fill.
    pub fn invalidate(&mut self, address: Address) -> Result<InvalidateOutcome, CacheError> {
        let decoded = self.geometry.decode(address);
        match self.store.lookup(decoded.index, decoded.tag) {
            Some(way) => self.invalidate_way(decoded.index, way),
            None => {
                let arc = self.table.next(LineState::Invalid, CacheEvent::Invalidate)?;
                Ok(InvalidateOutcome {
                    index: decoded.index,
                    tag: decoded.tag,
                    way: None,
                    old_state: arc.from,
                    new_state: arc.to,
                    write_back: None,
                    transition: arc,
                })
            }
        }
    }

    /// Invalidates every resident way, writing dirty ones back. Pending ways are
    /// left to their fills.
    ///
    /// # Errors
    ///
    /// Propagates the first failure from the transition table.
    pub fn flush(&mut self) -> Result<Vec<InvalidateOutcome>, CacheError> {
        let resident: Vec<(usize, usize)> = self
            .store
            .lines()
            .iter()
            .enumerate()
            .flat_map(|(index, line)| {
                line.ways()
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.state().is_resident())
                    .map(move |(way, _)| (index, way))
            })
            .collect();
        resident
            .into_iter()
            .map(|(index, way)| self.invalidate_way(index, way))
            .collect()
    }

    fn invalidate_way(&mut self, index: usize, way: usize) -> Result<InvalidateOutcome, CacheError> {
        let slot = self.store.way(index, way);
        let old_state = slot.state();
        let tag = slot.tag().unwrap_or_default();
        if old_state == LineState::MissPending {
            self.stats.rejected += 1;
            warn!(index, way, tag, "invalidate rejected: fill pending");
            return Err(CacheError::SetBusy {
                index,
                pending_tag: tag,
            });
        }
        let arc = self.table.next(old_state, CacheEvent::Invalidate)?;
        let write_back = match self.store.evict(index, way) {
            Some(evicted) if arc.action == FsmAction::WriteBack => {
                Some(self.write_back(index, evicted.tag, &evicted.data))
            }
            _ => None,
        };
        self.stats.invalidations += 1;
        debug!(index, way, tag, %arc, "invalidated");
        Ok(InvalidateOutcome {
            index,
            tag,
            way: Some(way),
            old_state,
            new_state: arc.to,
            write_back,
            transition: arc,
        })
    }
}
