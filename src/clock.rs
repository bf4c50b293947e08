//! Monotonic tick sources for cache expiry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic tick counter. Ticks advance at a caller-chosen rate; the cache
/// converts TTL seconds with its configured ticks-per-second.
pub trait Clock: Send + Sync {
    fn ticks(&self) -> u64;
}

/// Ticks derived from `Instant`, starting at zero when constructed.
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
    ticks_per_second: u64,
}

impl SystemClock {
    pub fn new(ticks_per_second: u64) -> Self {
        Self {
            start: Instant::now(),
            ticks_per_second,
        }
    }
}

impl Clock for SystemClock {
    fn ticks(&self) -> u64 {
        let elapsed = self.start.elapsed();
        elapsed.as_secs() * self.ticks_per_second
            + u64::from(elapsed.subsec_nanos()) * self.ticks_per_second / 1_000_000_000
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, ticks: u64) {
        self.now.store(ticks, Ordering::SeqCst);
    }

    pub fn advance(&self, ticks: u64) {
        self.now.fetch_add(ticks, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn ticks(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
