//! Timed fill delivery.
//!
//! A single worker thread owns a deadline-ordered heap of handlers and sleeps on a
//! condition variable until the earliest one is due. Handlers run outside the heap
//! lock, one at a time, so fills scheduled in order complete in order.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Longest delay a handler can be scheduled for.
pub const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

struct Entry {
    due: Instant,
    seq: u64,
    handler: Box<dyn FnOnce() + Send>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: earliest deadline, then earliest submission, on top.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct Queue {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    queue: Mutex<Queue>,
    condvar: Condvar,
}

/// Runs handlers after a delay on a dedicated thread.
///
/// Dropping the scheduler stops the thread; handlers not yet due are discarded.
pub struct FillScheduler {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl FillScheduler {
    /// Starts the worker thread.
    pub fn new() -> Self {
        let shared = Arc::new(Shared::default());
        let worker = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || run(&shared))
        };
        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Queues `handler` to run once `delay` has elapsed.
    ///
    /// Delays beyond [`MAX_DELAY`] are clamped to it.
    pub fn schedule(&self, delay: Duration, handler: Box<dyn FnOnce() + Send>) {
        let now = Instant::now();
        let due = now.checked_add(delay.min(MAX_DELAY)).unwrap_or(now);
        let mut queue = self.shared.queue.lock();
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.heap.push(Entry { due, seq, handler });
        // Wake the worker only if the new entry is now the earliest.
        if queue.heap.peek().is_some_and(|e| e.seq == seq) {
            let _ = self.shared.condvar.notify_one();
        }
    }

    /// Number of handlers not yet run.
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().heap.len()
    }
}

impl Default for FillScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FillScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FillScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

impl Drop for FillScheduler {
    fn drop(&mut self) {
        self.shared.queue.lock().shutdown = true;
        let _ = self.shared.condvar.notify_all();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("fill scheduler thread panicked");
            }
        }
    }
}

fn run(shared: &Shared) {
    let mut queue = shared.queue.lock();
    loop {
        if queue.shutdown {
            return;
        }
        let now = Instant::now();
        match queue.heap.peek().map(|e| e.due) {
            None => shared.condvar.wait(&mut queue),
            Some(due) if due <= now => {
                if let Some(entry) = queue.heap.pop() {
                    MutexGuard::unlocked(&mut queue, entry.handler);
                }
            }
            Some(due) => {
                let _ = shared.condvar.wait_until(&mut queue, due);
            }
        }
    }
}
