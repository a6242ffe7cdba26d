//! Simulation statistics collection and reporting.
//!
//! This module tracks counters for the cache engine. It provides:
//! 1. **Requests:** Admitted reads and writes, hits, misses, and rejected requests.
//! 2. **Cache activity:** Fills, evictions, write-backs, and invalidations.
//! 3. **Memory traffic:** Main-memory read and write operations.

use serde::Serialize;

/// Counters for one configured cache.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Read requests admitted.
    pub reads: u64,
    /// Write requests admitted.
    pub writes: u64,
    /// Reads served from a resident way.
    pub read_hits: u64,
    /// Writes applied to a resident way.
    pub write_hits: u64,
    /// Admitted requests whose block was not resident.
    pub misses: u64,
    /// Write misses sent straight to memory under write-no-allocate.
    pub bypassed_writes: u64,
    /// Requests rejected with `SetBusy` or `NoEvictableWay`.
    pub rejected: u64,

    /// Fills completed.
    pub fills: u64,
    /// Resident ways displaced to make room for a miss.
    pub evictions: u64,
    /// Dirty blocks written back to memory.
    pub write_backs: u64,
    /// Ways invalidated on request or by a flush.
    pub invalidations: u64,

    /// Main-memory read operations.
    pub memory_reads: u64,
    /// Main-memory write operations.
    pub memory_writes: u64,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"cache"`, `"memory"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "cache", "memory"];

impl CacheStats {
    /// Total hits.
    pub const fn hits(&self) -> u64 {
        self.read_hits + self.write_hits
    }

    /// Total admitted requests.
    pub const fn accesses(&self) -> u64 {
        self.reads + self.writes
    }

    /// Fraction of admitted requests that hit, `0.0` before any request.
    pub fn hit_rate(&self) -> f64 {
        let accesses = self.accesses();
        if accesses == 0 {
            0.0
        } else {
            self.hits() as f64 / accesses as f64
        }
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// # Arguments
    ///
    /// * `sections` - Slice of section names to print, or empty for all.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);

        if want("summary") {
            println!("\n==========================================================");
            println!("CACHE SIMULATION STATISTICS");
            println!("==========================================================");
            println!("requests                 {}", self.accesses());
            println!("requests.rejected        {}", self.rejected);
            println!("hit_rate                 {:.2}%", self.hit_rate() * 100.0);
            println!("----------------------------------------------------------");
        }
        if want("cache") {
            println!("CACHE");
            println!(
                "  reads                  {} (hits {})",
                self.reads, self.read_hits
            );
            println!(
                "  writes                 {} (hits {})",
                self.writes, self.write_hits
            );
            println!("  misses                 {}", self.misses);
            println!("  writes.bypassed        {}", self.bypassed_writes);
            println!("  fills                  {}", self.fills);
            println!("  evictions              {}", self.evictions);
            println!("  write_backs            {}", self.write_backs);
            println!("  invalidations          {}", self.invalidations);
            println!("----------------------------------------------------------");
        }
        if want("memory") {
            println!("MAIN MEMORY");
            println!("  reads                  {}", self.memory_reads);
            println!("  writes                 {}", self.memory_writes);
            println!("==========================================================");
        }
    }

    /// Prints every section.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
