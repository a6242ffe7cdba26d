//! Cache service.
//!
//! Thread-safe facade over [`Simulator`]. It owns the fill scheduler and the event
//! bus, serialises requests behind one lock, and tags every scheduled fill with the
//! configuration generation it was issued under. Reconfiguring bumps the generation,
//! so a fill from a previous configuration is dropped when it comes due instead of
//! touching the new cache.

use parking_lot::Mutex;
use std::fmt;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

use crate::common::addr::Address;
use crate::common::error::CacheError;
use crate::config::{CacheConfiguration, EngineConfig};
use crate::sim::events::{EventBus, FillSink};
use crate::sim::records::{
    CacheResponse, CacheSnapshot, ConfigureResponse, FillEvent, FillTicket, InvalidateOutcome,
};
use crate::sim::request::{CacheRequest, RawRequest};
use crate::sim::scheduler::FillScheduler;
use crate::sim::simulator::Simulator;
use crate::stats::CacheStats;

#[derive(Debug, Default)]
struct ServiceState {
    simulator: Option<Simulator>,
    generation: u64,
}

struct Inner {
    state: Mutex<ServiceState>,
    bus: EventBus,
    sinks: Mutex<Vec<Arc<dyn FillSink>>>,
}

impl Inner {
    fn complete_fill(&self, generation: u64, ticket: FillTicket) {
        let event = {
            let mut state = self.state.lock();
            if state.generation != generation {
                warn!(
                    ticket = ticket.ticket,
                    issued = generation,
                    current = state.generation,
                    "dropping fill from previous configuration"
                );
                return;
            }
            let Some(simulator) = state.simulator.as_mut() else {
                return;
            };
            match simulator.complete_fill(ticket) {
                Ok(event) => event,
                Err(err) => {
                    warn!(ticket = ticket.ticket, %err, "fill discarded");
                    return;
                }
            }
        };
        self.publish(&event);
    }

    fn publish(&self, event: &FillEvent) {
        self.bus.deliver(event);
        let sinks: Vec<Arc<dyn FillSink>> = self.sinks.lock().clone();
        for sink in sinks {
            sink.deliver(event);
        }
    }
}

/// The cache engine as seen by a presentation layer.
pub struct CacheService {
    inner: Arc<Inner>,
    engine: EngineConfig,
    scheduler: FillScheduler,
}

impl CacheService {
    /// Creates an unconfigured service.
    pub fn new(engine: EngineConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ServiceState::default()),
                bus: EventBus::new(),
                sinks: Mutex::new(Vec::new()),
            }),
            engine,
            scheduler: FillScheduler::new(),
        }
    }

    /// Engine settings.
    pub const fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Replaces the cache and main memory with a fresh instance built from `config`.
    ///
    /// Fills outstanding against the previous configuration are dropped when due.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] if the geometry is invalid; the previous
    /// configuration, if any, stays active.
    pub fn configure(&self, config: CacheConfiguration) -> Result<ConfigureResponse, CacheError> {
        let simulator = Simulator::new(config, &self.engine).inspect_err(|err| {
            warn!(%err, "configuration rejected");
        })?;
        let response = simulator.configure_response();
        let mut state = self.inner.state.lock();
        state.generation += 1;
        state.simulator = Some(simulator);
        info!(generation = state.generation, "{}", response.message);
        Ok(response)
    }

    /// Validates and processes a raw request.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Request`] for malformed input, otherwise as
    /// [`CacheService::request`].
    pub fn submit(&self, raw: RawRequest) -> Result<CacheResponse, CacheError> {
        let request = CacheRequest::try_from(raw)?;
        self.request(&request)
    }

    /// Processes one request and schedules its fill, if any.
    ///
    /// The fill is scheduled only after the response has been produced, so its
    /// event always follows the response.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotConfigured`] before the first configure call, and
    /// otherwise the errors of [`Simulator::handle`].
    pub fn request(&self, request: &CacheRequest) -> Result<CacheResponse, CacheError> {
        let (outcome, generation) = {
            let mut state = self.inner.state.lock();
            let generation = state.generation;
            let simulator = state.simulator.as_mut().ok_or(CacheError::NotConfigured)?;
            (simulator.handle(request)?, generation)
        };
        if let Some(ticket) = outcome.fill {
            self.schedule_fill(generation, ticket);
        }
        Ok(outcome.response)
    }

    fn schedule_fill(&self, generation: u64, ticket: FillTicket) {
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        debug!(ticket = ticket.ticket, generation, "scheduling fill");
        self.scheduler.schedule(
            self.engine.fill_latency(),
            Box::new(move || {
                if let Some(inner) = inner.upgrade() {
                    inner.complete_fill(generation, ticket);
                }
            }),
        );
    }

    /// Invalidates the block containing `address`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotConfigured`] or the errors of
    /// [`Simulator::invalidate`].
    pub fn invalidate(&self, address: Address) -> Result<InvalidateOutcome, CacheError> {
        self.with_simulator(|simulator| simulator.invalidate(address))
    }

    /// Invalidates every resident way.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotConfigured`] or the errors of [`Simulator::flush`].
    pub fn flush(&self) -> Result<Vec<InvalidateOutcome>, CacheError> {
        self.with_simulator(Simulator::flush)
    }

    /// Copy of the current cache and memory.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotConfigured`] before the first configure call.
    pub fn snapshot(&self) -> Result<CacheSnapshot, CacheError> {
        self.with_simulator(|simulator| Ok(simulator.snapshot()))
    }

    /// Current counters.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotConfigured`] before the first configure call.
    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        self.with_simulator(|simulator| Ok(simulator.stats()))
    }

    /// Subscribes to fill events.
    pub fn subscribe(&self) -> Receiver<FillEvent> {
        self.inner.bus.subscribe()
    }

    /// Channel subscribers still connected as of the last fill event.
    pub fn subscriber_count(&self) -> usize {
        self.inner.bus.subscriber_count()
    }

    /// Registers a callback-style receiver of fill events.
    pub fn add_sink(&self, sink: Arc<dyn FillSink>) {
        self.inner.sinks.lock().push(sink);
    }

    /// Number of successful configure calls so far.
    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    /// Fills scheduled but not yet due.
    pub fn outstanding_fills(&self) -> usize {
        self.scheduler.pending()
    }

    fn with_simulator<T>(
        &self,
        f: impl FnOnce(&mut Simulator) -> Result<T, CacheError>,
    ) -> Result<T, CacheError> {
        let mut state = self.inner.state.lock();
        let simulator = state.simulator.as_mut().ok_or(CacheError::NotConfigured)?;
        f(simulator)
    }
}

impl Default for CacheService {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl fmt::Debug for CacheService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheService")
            .field("engine", &self.engine)
            .field("generation", &self.generation())
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}
