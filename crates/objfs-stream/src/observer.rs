//! Instrumentation hooks for store round trips.
//!
//! Streams take a start timestamp before every store call and report the
//! outcome afterwards through an [`IoObserver`]. Nothing is exported to a
//! metrics backend here; an external layer attaches by implementing the
//! trait. [`PoolCounters`] is a simple in-process implementation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// The kind of store call being observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IoOp {
    Read,
    Write,
    Append,
}

impl std::fmt::Display for IoOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Append => "append",
        })
    }
}

/// One completed store call.
#[derive(Clone, Debug)]
pub struct IoEvent<'a> {
    /// Pool the object lives in.
    pub pool: &'a str,
    /// Operation performed.
    pub op: IoOp,
    /// Bytes transferred. Zero for failed calls.
    pub bytes: usize,
    /// Wall-clock time spent in the store call.
    pub elapsed: Duration,
    /// Whether the call succeeded.
    pub ok: bool,
}

/// Receives an event after every observed store call.
pub trait IoObserver: Send + Sync {
    fn observe(&self, event: &IoEvent<'_>);
}

/// Shared observer handle held by streams.
pub type SharedObserver = Arc<dyn IoObserver>;

/// Observer that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpObserver;

impl IoObserver for NoOpObserver {
    fn observe(&self, _event: &IoEvent<'_>) {}
}

/// The default observer for new streams.
pub fn no_op() -> SharedObserver {
    Arc::new(NoOpObserver)
}

/// Start a timed store call.
pub(crate) fn start() -> Instant {
    Instant::now()
}

/// Report a finished store call started at `started`.
pub(crate) fn finish(
    observer: &dyn IoObserver,
    pool: &str,
    op: IoOp,
    started: Instant,
    bytes: usize,
    ok: bool,
) {
    observer.observe(&IoEvent {
        pool,
        op,
        bytes,
        elapsed: started.elapsed(),
        ok,
    });
}

/// Accumulated totals for one `(pool, op)` pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpStats {
    /// Successful calls.
    pub calls: u64,
    /// Bytes moved by successful calls.
    pub bytes: u64,
    /// Failed calls.
    pub errors: u64,
    /// Total latency of successful calls.
    pub latency: Duration,
}

/// Per-pool counters kept in memory.
#[derive(Debug, Default)]
pub struct PoolCounters {
    stats: Mutex<BTreeMap<(String, IoOp), OpStats>>,
}

impl PoolCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Totals for `(pool, op)`; zero if nothing was observed.
    pub fn get(&self, pool: &str, op: IoOp) -> OpStats {
        self.stats
            .lock()
            .ok()
            .and_then(|m| m.get(&(pool.to_string(), op)).copied())
            .unwrap_or_default()
    }

    /// All totals, ordered by pool then operation.
    pub fn snapshot(&self) -> Vec<(String, IoOp, OpStats)> {
        match self.stats.lock() {
            Ok(m) => m
                .iter()
                .map(|((pool, op), stats)| (pool.clone(), *op, *stats))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl IoObserver for PoolCounters {
    fn observe(&self, event: &IoEvent<'_>) {
        let Ok(mut map) = self.stats.lock() else {
            return;
        };
        let entry = map.entry((event.pool.to_string(), event.op)).or_default();
        if event.ok {
            entry.calls += 1;
            entry.bytes += event.bytes as u64;
            entry.latency += event.elapsed;
        } else {
            entry.errors += 1;
        }
    }
}
