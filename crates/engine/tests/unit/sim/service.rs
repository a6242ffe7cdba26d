//! Cache Service Tests.
//!
//! Verifies the threaded facade: configuration generations, timed fill delivery
//! through subscribers and sinks, and rejection paths.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use cachesim_core::cache::line::LineState;
use cachesim_core::common::addr::Address;
use cachesim_core::common::error::{CacheError, ConfigError, RequestError};
use cachesim_core::config::{CacheConfiguration, EngineConfig};
use cachesim_core::sim::{CacheRequest, RawRequest};
use cachesim_core::CacheService;

use crate::common::mocks::MockSink;
use crate::common::{init_tracing, CacheBuilder};

const FAST: Duration = Duration::from_millis(5);
const RECV: Duration = Duration::from_secs(5);

/// Requests before the first configure call are rejected.
#[test]
fn not_configured() {
    let service = CacheService::default();
    assert_eq!(service.generation(), 0);
    assert!(matches!(
        service.request(&CacheRequest::read(0)),
        Err(CacheError::NotConfigured)
    ));
    assert!(matches!(service.snapshot(), Err(CacheError::NotConfigured)));
    assert!(matches!(service.flush(), Err(CacheError::NotConfigured)));
}

/// A miss is answered at once and its fill arrives on the subscriber channel.
#[test]
fn fill_event_follows_response() {
    init_tracing();
    let service = CacheBuilder::new().latency(FAST).service();
    let events = service.subscribe();

    let response = service.request(&CacheRequest::read(8)).expect("miss");
    assert!(response.pending);

    let event = events.recv_timeout(RECV).expect("fill delivered");
    assert_eq!(event.index, 1);
    assert_eq!(event.new_state, LineState::Valid);
    assert_eq!(event.data, Some(2));

    let hit = service.request(&CacheRequest::read(8)).expect("hit");
    assert!(hit.hit);
    assert_eq!(service.outstanding_fills(), 0);
}

/// Every subscriber receives each event; one that hangs up is dropped on the
/// next publish.
#[test]
fn events_fan_out() {
    let service = CacheBuilder::new().latency(FAST).service();
    let a = service.subscribe();
    let b = service.subscribe();
    assert_eq!(service.subscriber_count(), 2);

    let _ = service.request(&CacheRequest::write(0, 3)).expect("miss");
    let ea = a.recv_timeout(RECV).expect("first subscriber");
    let eb = b.recv_timeout(RECV).expect("second subscriber");
    assert_eq!(ea, eb);

    drop(b);
    assert_eq!(service.subscriber_count(), 2);
    let _ = service.request(&CacheRequest::read(8)).expect("miss");
    let _ = a.recv_timeout(RECV).expect("still subscribed");
    assert_eq!(service.subscriber_count(), 1);
}

/// Registered sinks are called once per fill.
#[test]
fn sink_receives_fill() {
    let service = CacheBuilder::new().latency(FAST).service();
    let events = service.subscribe();

    let mut sink = MockSink::new();
    let _ = sink
        .expect_deliver()
        .withf(|event| event.tag == 0 && event.index == 0)
        .times(1)
        .return_const(());
    service.add_sink(Arc::new(sink));

    let _ = service.request(&CacheRequest::read(0)).expect("miss");
    let _ = events.recv_timeout(RECV).expect("fill delivered");
}

/// Reconfiguring drops fills issued under the previous configuration.
#[test]
fn reconfigure_drops_stale_fills() {
    init_tracing();
    let builder = CacheBuilder::new().latency(Duration::from_millis(50));
    let config = builder.config();
    let service = builder.service();
    let events = service.subscribe();

    let _ = service.request(&CacheRequest::read(0)).expect("miss");
    let _ = service.configure(config).expect("reconfigure");
    assert_eq!(service.generation(), 2);

    assert!(events.recv_timeout(Duration::from_millis(300)).is_err());
    let snapshot = service.snapshot().expect("configured");
    assert!(
        snapshot
            .lines
            .iter()
            .flat_map(|line| line.ways.iter())
            .all(|way| way.state == LineState::Invalid)
    );
}

/// An invalid configuration leaves the previous one active.
#[test]
fn invalid_configure_keeps_previous() {
    let service = CacheBuilder::new().service();
    let bad = CacheConfiguration {
        block_size_bytes: 12,
        ..CacheConfiguration::default()
    };
    assert!(matches!(
        service.configure(bad),
        Err(CacheError::Config(ConfigError::InvalidGeometry(_)))
    ));
    assert_eq!(service.generation(), 1);
    assert!(service.request(&CacheRequest::read(0)).is_ok());
}

/// Raw input is validated before it reaches the cache.
#[test]
fn submit_validates_raw_input() {
    let service = CacheBuilder::new().service();
    let raw: RawRequest =
        serde_json::from_value(json!({"address": "zz", "action": "READ"})).expect("shape");
    assert!(matches!(
        service.submit(raw),
        Err(CacheError::Request(RequestError::InvalidAddress(_)))
    ));

    let raw: RawRequest =
        serde_json::from_value(json!({"address": 4, "action": "WRITE", "data": [6]})).expect("shape");
    let response = service.submit(raw).expect("accepted");
    assert_eq!(response.data, Some(6));
}

/// Invalidate and stats go through the same lock as requests.
#[test]
fn invalidate_and_stats() {
    let service = CacheService::new(EngineConfig {
        fill_latency_ms: 60_000,
        ..EngineConfig::default()
    });
    let _ = service
        .configure(CacheConfiguration::default())
        .expect("configured");
    let _ = service.request(&CacheRequest::read(0)).expect("miss");
    assert_eq!(service.outstanding_fills(), 1);
    assert!(matches!(
        service.invalidate(Address::new(0)),
        Err(CacheError::SetBusy { .. })
    ));
    let stats = service.stats().expect("configured");
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.rejected, 1);
}

/// A huge configured latency parks the fill instead of failing the request.
#[test]
fn huge_fill_latency_is_accepted() {
    let engine = EngineConfig::from_json(&format!(r#"{{"fillLatencyMs": {}}}"#, u64::MAX))
        .expect("parses");
    let service = CacheService::new(engine);
    let _ = service
        .configure(CacheConfiguration::default())
        .expect("configured");
    let response = service.request(&CacheRequest::read(0)).expect("miss");
    assert!(response.pending);
    assert_eq!(service.outstanding_fills(), 1);
}
