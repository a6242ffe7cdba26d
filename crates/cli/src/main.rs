//! Single-level cache simulator CLI.
//!
//! This binary drives the cache engine from the command line. It performs:
//! 1. **Trace run:** Replay a trace of reads, writes, invalidations and flushes
//!    against a configured cache, completing fills on `WAIT` or with `--eager`.
//! 2. **Live run:** Replay the same trace through the threaded service, with fills
//!    arriving after the configured latency.
//! 3. **Inspection:** Print the derived geometry or the active FSM transition table.

mod trace;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;
use std::{fs, process};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cachesim_core::cache::fsm::TransitionTable;
use cachesim_core::cache::geometry::Geometry;
use cachesim_core::cache::write_policy::WritePolicy;
use cachesim_core::common::addr::Address;
use cachesim_core::config::{WriteHitPolicy, WriteMissPolicy};
use cachesim_core::memory;
use cachesim_core::sim::{CacheResponse, FillEvent, FillTicket, InvalidateOutcome};
use cachesim_core::{CacheConfiguration, CacheService, EngineConfig, Simulator};

use crate::trace::TraceOp;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(
    name = "cachesim",
    author,
    version,
    about = "Single-level cache simulator with a per-line miss FSM",
    long_about = "Replay memory traces against a configurable cache and inspect its geometry and FSM.\n\nExamples:\n  cachesim run -c cache.json -t trace.txt --stats\n  cachesim run -c cache.json -t trace.txt --live --json\n  cachesim fsm --hit WRITE-BACK --miss WRITE-ALLOCATE\n  cachesim geometry -c cache.json --address 0x1c"
)]
struct Cli {
    /// Log filter (e.g. `info`, `cachesim_core=debug`); overrides `RUST_LOG`.
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace file.
    Run(RunArgs),

    /// Print the FSM transition table for a write-policy pair.
    Fsm {
        /// Write-hit policy.
        #[arg(long, default_value = "WRITE-THROUGH", value_parser = parse_enum::<WriteHitPolicy>)]
        hit: WriteHitPolicy,

        /// Write-miss policy.
        #[arg(long, default_value = "WRITE-ALLOCATE", value_parser = parse_enum::<WriteMissPolicy>)]
        miss: WriteMissPolicy,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Print the geometry derived from a configuration.
    Geometry {
        /// Cache configuration (JSON). Defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Also decode this address.
        #[arg(long)]
        address: Option<String>,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Cache configuration (JSON).
    #[arg(short, long)]
    config: PathBuf,

    /// Trace file.
    #[arg(short, long)]
    trace: PathBuf,

    /// Engine settings (JSON): fill latency, memory contents, seed.
    #[arg(short, long)]
    engine: Option<PathBuf>,

    /// Complete each fill immediately after its request.
    #[arg(long, conflicts_with = "live")]
    eager: bool,

    /// Run through the threaded service with real fill latency.
    #[arg(long)]
    live: bool,

    /// Emit one JSON record per line instead of text.
    #[arg(long)]
    json: bool,

    /// Print statistics at the end.
    #[arg(long)]
    stats: bool,

    /// Statistics sections to print (default: all).
    #[arg(long, value_delimiter = ',', value_parser = clap::builder::PossibleValuesParser::new(["summary", "cache", "memory"]))]
    sections: Vec<String>,

    /// Print main memory at the end, one block per row.
    #[arg(long)]
    memory: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    let result = match cli.command {
        Commands::Run(args) => {
            if args.live {
                cmd_live(&args)
            } else {
                cmd_run(&args)
            }
        }
        Commands::Fsm { hit, miss, json } => cmd_fsm(hit, miss, json),
        Commands::Geometry {
            config,
            address,
            json,
        } => cmd_geometry(config.as_deref(), address.as_deref(), json),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_logging(filter: Option<&str>) {
    let filter = filter
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_enum<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).map_err(|e| e.to_string())
}

fn load_engine(path: Option<&Path>) -> Result<EngineConfig, Box<dyn Error>> {
    match path {
        Some(p) => Ok(EngineConfig::from_json(&fs::read_to_string(p)?)?),
        None => Ok(EngineConfig::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn describe_response(r: &CacheResponse) -> String {
    let path: Vec<String> = r.transitions.iter().map(ToString::to_string).collect();
    let way = r.block.map_or_else(|| "-".to_string(), |w| w.to_string());
    let data = r.data.map_or_else(|| "pending".to_string(), |d| d.to_string());
    let mut line = format!(
        "{:<5} {:<8} {:<4} idx={} tag={:#x} way={} data={} {}",
        r.action,
        r.address.to_string(),
        if r.hit { "hit" } else { "miss" },
        r.index,
        r.tag,
        way,
        data,
        path.join(", ")
    );
    if let Some(tag) = r.removed_tag {
        line.push_str(&format!(" evicted={tag:#x}"));
    }
    if let Some(wb) = &r.write_back {
        line.push_str(&format!(" writeback@{}={:?}", wb.memory_index, wb.memory_data));
    }
    line
}

fn describe_fill(e: &FillEvent) -> String {
    format!(
        "FILL  {:<8} idx={} way={} tag={:#x} {} block={:?} mem@{}={:?}",
        e.address.to_string(),
        e.index, e.way, e.tag, e.transition, e.cache_final, e.memory_index, e.memory_data
    )
}

fn describe_invalidate(o: &InvalidateOutcome) -> String {
    let mut line = format!("INV   idx={} tag={:#x} {}", o.index, o.tag, o.transition);
    if let Some(wb) = &o.write_back {
        line.push_str(&format!(" writeback@{}={:?}", wb.memory_index, wb.memory_data));
    }
    line
}

fn print_memory(words: &[u64], width: usize) {
    println!("MAIN MEMORY");
    for (row, words) in memory::rows(words, width).iter().enumerate() {
        println!("  {:>3}: {:?}", row * width, words);
    }
}

/// Replays a trace against a [`Simulator`], completing fills on `WAIT`, at the end of
/// the trace, or right away with `--eager`.
fn cmd_run(args: &RunArgs) -> CliResult {
    let config = CacheConfiguration::from_path(&args.config)?;
    let engine = load_engine(args.engine.as_deref())?;
    let mut sim = Simulator::new(config, &engine)?;
    let ops = trace::parse(&fs::read_to_string(&args.trace)?)?;
    info!(ops = ops.len(), "{}", sim.summary());
    if !args.json {
        println!("{}", sim.summary());
    }

    let mut fills: VecDeque<FillTicket> = VecDeque::new();
    let drain = |sim: &mut Simulator, fills: &mut VecDeque<FillTicket>| -> CliResult {
        while let Some(ticket) = fills.pop_front() {
            let event = sim.complete_fill(ticket)?;
            if args.json {
                print_json(&event)?;
            } else {
                println!("{}", describe_fill(&event));
            }
        }
        Ok(())
    };

    for (line, op) in ops {
        match op {
            TraceOp::Request(request) => match sim.handle(&request) {
                Ok(outcome) => {
                    if args.json {
                        print_json(&outcome.response)?;
                    } else {
                        println!("{}", describe_response(&outcome.response));
                    }
                    fills.extend(outcome.fill);
                    if args.eager {
                        drain(&mut sim, &mut fills)?;
                    }
                }
                Err(err) if err.is_retryable() => eprintln!("line {line}: {err}"),
                Err(err) => return Err(err.into()),
            },
            TraceOp::Invalidate(address) => match sim.invalidate(address) {
                Ok(outcome) if args.json => print_json(&outcome)?,
                Ok(outcome) => println!("{}", describe_invalidate(&outcome)),
                Err(err) => eprintln!("line {line}: {err}"),
            },
            TraceOp::Flush => {
                for outcome in sim.flush()? {
                    if args.json {
                        print_json(&outcome)?;
                    } else {
                        println!("{}", describe_invalidate(&outcome));
                    }
                }
            }
            TraceOp::Wait => drain(&mut sim, &mut fills)?,
        }
    }
    drain(&mut sim, &mut fills)?;

    if args.memory {
        print_memory(sim.memory().words(), sim.geometry().words_per_block());
    }
    if args.stats {
        sim.stats().print_sections(&args.sections);
    }
    Ok(())
}

/// Replays a trace through a [`CacheService`], printing fill events as they arrive.
fn cmd_live(args: &RunArgs) -> CliResult {
    let config = CacheConfiguration::from_path(&args.config)?;
    let engine = load_engine(args.engine.as_deref())?;
    let ops = trace::parse(&fs::read_to_string(&args.trace)?)?;
    let patience = engine.fill_latency() * 4 + Duration::from_millis(100);
    let service = CacheService::new(engine);
    let events = service.subscribe();
    let configured = service.configure(config)?;
    if args.json {
        print_json(&configured)?;
    } else {
        println!("{}", configured.message);
    }

    let mut outstanding = 0usize;
    let print_event = |event: &FillEvent| -> CliResult {
        if args.json {
            print_json(event)
        } else {
            println!("{}", describe_fill(event));
            Ok(())
        }
    };

    for (line, op) in ops {
        for event in events.try_iter() {
            outstanding = outstanding.saturating_sub(1);
            print_event(&event)?;
        }
        match op {
            TraceOp::Request(request) => match service.request(&request) {
                Ok(response) => {
                    if response.pending {
                        outstanding += 1;
                    }
                    if args.json {
                        print_json(&response)?;
                    } else {
                        println!("{}", describe_response(&response));
                    }
                }
                Err(err) => eprintln!("line {line}: {err}"),
            },
            TraceOp::Invalidate(address) => match service.invalidate(address) {
                Ok(outcome) if args.json => print_json(&outcome)?,
                Ok(outcome) => println!("{}", describe_invalidate(&outcome)),
                Err(err) => eprintln!("line {line}: {err}"),
            },
            TraceOp::Flush => {
                for outcome in service.flush()? {
                    if args.json {
                        print_json(&outcome)?;
                    } else {
                        println!("{}", describe_invalidate(&outcome));
                    }
                }
            }
            TraceOp::Wait => {
                outstanding = wait_for_fills(&events, outstanding, patience, &print_event)?;
            }
        }
    }
    let _ = wait_for_fills(&events, outstanding, patience, &print_event)?;

    let snapshot = service.snapshot()?;
    if args.memory {
        let width = configured.geometry.words_per_block();
        print_memory(&snapshot.memory, width);
    }
    if args.stats {
        service.stats()?.print_sections(&args.sections);
    }
    Ok(())
}

fn wait_for_fills(
    events: &Receiver<FillEvent>,
    mut outstanding: usize,
    patience: Duration,
    print_event: &dyn Fn(&FillEvent) -> CliResult,
) -> Result<usize, Box<dyn Error>> {
    while outstanding > 0 {
        match events.recv_timeout(patience) {
            Ok(event) => {
                outstanding -= 1;
                print_event(&event)?;
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                tracing::warn!(outstanding, "gave up waiting for fills");
                break;
            }
        }
    }
    Ok(outstanding)
}

fn cmd_fsm(hit: WriteHitPolicy, miss: WriteMissPolicy, json: bool) -> CliResult {
    let table = TransitionTable::for_policy(WritePolicy::new(hit, miss));
    if json {
        return print_json(&table.arcs());
    }
    println!("{} ({:?} table)", table.policy(), table.kind());
    for arc in table.arcs() {
        println!(
            "  {:<13} --[{:<26}]--> {}",
            arc.from,
            arc.label(),
            arc.to
        );
    }
    Ok(())
}

fn cmd_geometry(config: Option<&Path>, address: Option<&str>, json: bool) -> CliResult {
    let config = match config {
        Some(path) => CacheConfiguration::from_path(path)?,
        None => CacheConfiguration::default(),
    };
    let geometry = Geometry::from_config(&config)?;
    let decoded = address
        .map(|a| cachesim_core::CacheRequest::parse(a, "READ", None))
        .transpose()?
        .map(|request| geometry.decode(request.address));

    if json {
        print_json(&serde_json::json!({ "geometry": geometry, "decoded": decoded }))?;
        return Ok(());
    }
    println!("{} cache", geometry.cache_type);
    println!("  size        {} B", geometry.cache_size);
    println!("  block       {} B ({} words)", geometry.block_size, geometry.words_per_block());
    println!("  word        {} B", geometry.word_size);
    println!("  lines       {}", geometry.num_lines);
    println!("  ways        {}", geometry.ways);
    println!(
        "  address     {} bits = tag {} | index {} | offset {}",
        geometry.address_bits, geometry.tag_bits, geometry.index_bits, geometry.offset_bits
    );
    if let Some(d) = decoded {
        println!(
            "  {} -> tag {:#x}, index {}, offset {} (word {}, memory word {})",
            Address::new(d.physical),
            d.tag,
            d.index,
            d.offset,
            d.word,
            d.memory_word
        );
    }
    Ok(())
}
