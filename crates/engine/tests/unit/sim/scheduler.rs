//! Fill Scheduler Tests.

use std::sync::mpsc;
use std::time::Duration;

use cachesim_core::sim::scheduler::MAX_DELAY;
use cachesim_core::sim::FillScheduler;

const RECV: Duration = Duration::from_secs(5);

/// Handlers run in deadline order regardless of submission order.
#[test]
fn runs_in_deadline_order() {
    let scheduler = FillScheduler::new();
    let (tx, rx) = mpsc::channel();
    for (label, delay) in [("late", 60), ("early", 10), ("middle", 30)] {
        let tx = tx.clone();
        scheduler.schedule(
            Duration::from_millis(delay),
            Box::new(move || {
                let _ = tx.send(label);
            }),
        );
    }
    let order: Vec<&str> = (0..3).map(|_| rx.recv_timeout(RECV).expect("handler ran")).collect();
    assert_eq!(order, ["early", "middle", "late"]);
}

/// Equal deadlines keep submission order.
#[test]
fn equal_deadlines_are_fifo() {
    let scheduler = FillScheduler::new();
    let (tx, rx) = mpsc::channel();
    for i in 0..5 {
        let tx = tx.clone();
        scheduler.schedule(
            Duration::ZERO,
            Box::new(move || {
                let _ = tx.send(i);
            }),
        );
    }
    let order: Vec<i32> = (0..5).map(|_| rx.recv_timeout(RECV).expect("handler ran")).collect();
    assert_eq!(order, [0, 1, 2, 3, 4]);
}

/// Pending counts handlers not yet due; dropping discards them.
#[test]
fn drop_discards_pending() {
    let (tx, rx) = mpsc::channel::<()>();
    {
        let scheduler = FillScheduler::new();
        scheduler.schedule(
            Duration::from_secs(60),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );
        assert_eq!(scheduler.pending(), 1);
    }
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
}

/// Oversized delays are clamped instead of overflowing the deadline.
#[test]
fn oversized_delay_is_clamped() {
    let scheduler = FillScheduler::new();
    scheduler.schedule(Duration::MAX, Box::new(|| {}));
    scheduler.schedule(MAX_DELAY * 2, Box::new(|| {}));
    assert_eq!(scheduler.pending(), 2);
}
