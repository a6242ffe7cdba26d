//! Cache Builder.
//!
//! Starts from the default configuration (direct-mapped, 32 B cache, 8 B blocks,
//! 4 B words, write-through / write-allocate, random replacement) with zeroed or
//! sequential memory, and lets each test override only what it exercises.

use std::time::Duration;

use cachesim_core::config::{
    CacheConfiguration, CacheType, EngineConfig, MemoryInit, ReplacementPolicy, WriteHitPolicy,
    WriteMissPolicy,
};
use cachesim_core::{CacheService, Simulator};

/// Fluent builder for test caches.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    config: CacheConfiguration,
    engine: EngineConfig,
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBuilder {
    /// Default configuration with sequential memory (word `i` holds `i`).
    pub fn new() -> Self {
        Self {
            config: CacheConfiguration::default(),
            engine: EngineConfig {
                memory_init: MemoryInit::Sequential,
                ..EngineConfig::default()
            },
        }
    }

    /// Sets cache, block and word sizes in bytes.
    pub fn sizes(mut self, cache: usize, block: usize, word: usize) -> Self {
        self.config.cache_size_bytes = cache;
        self.config.block_size_bytes = block;
        self.config.word_size_bytes = word;
        self
    }

    /// Set-associative with `ways` ways per set.
    pub fn set_associative(mut self, ways: usize) -> Self {
        self.config.cache_type = CacheType::SetAssociative;
        self.config.ways = Some(ways);
        self
    }

    /// Fully associative.
    pub fn fully_associative(mut self) -> Self {
        self.config.cache_type = CacheType::Associative;
        self.config.ways = None;
        self
    }

    /// Write-back on hit.
    pub fn write_back(mut self) -> Self {
        self.config.write_policy_on_hit = WriteHitPolicy::WriteBack;
        self
    }

    /// Write-no-allocate on miss.
    pub fn no_allocate(mut self) -> Self {
        self.config.write_policy_on_miss = WriteMissPolicy::WriteNoAllocate;
        self
    }

    /// Replacement policy.
    pub fn policy(mut self, policy: ReplacementPolicy) -> Self {
        self.config.replacement_policy = policy;
        self
    }

    /// Initial memory contents.
    pub fn memory(mut self, init: MemoryInit) -> Self {
        self.engine.memory_init = init;
        self
    }

    /// Fill latency.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.engine.fill_latency_ms = latency.as_millis() as u64;
        self
    }

    /// The configuration built so far.
    pub fn config(&self) -> CacheConfiguration {
        self.config.clone()
    }

    /// The engine settings built so far.
    pub fn engine(&self) -> EngineConfig {
        self.engine.clone()
    }

    /// Builds a simulator, panicking on an invalid geometry.
    pub fn build(self) -> Simulator {
        Simulator::new(self.config, &self.engine).expect("test geometry is valid")
    }

    /// Builds and configures a service.
    pub fn service(self) -> CacheService {
        let service = CacheService::new(self.engine);
        let _ = service.configure(self.config).expect("test geometry is valid");
        service
    }
}
