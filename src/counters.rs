//! Per-operation atomic counters.
//!
//! Writers (the call sites performing operations) and the dumper touch these
//! concurrently without any lock. Each field is independently atomic; nothing
//! ties `invocations`, `failures` and `mean_latency` together, so a reader may
//! observe a failure before the matching call, or a mean computed from a
//! different sample count than the one it read.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for one (unit, operation kind) pair.
#[derive(Debug, Default)]
pub struct AtomicCounterSet {
    invocations: AtomicU64,
    failures: AtomicU64,
    latency_samples: AtomicU64,
    // f64 bits; 0 means no samples yet.
    mean_latency: AtomicU64,
}

/// Values read from an [`AtomicCounterSet`], one load per field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CounterReading {
    /// Times the operation was invoked.
    pub invocations: u64,
    /// Times the operation failed.
    pub failures: u64,
    /// Running mean latency; `0.0` when unset.
    pub mean_latency: f64,
}

impl CounterReading {
    /// True when the pair would produce no snapshot lines at all.
    pub fn is_idle(&self) -> bool {
        self.invocations == 0 && self.failures == 0 && self.mean_latency == 0.0
    }
}

impl AtomicCounterSet {
    /// Create a zeroed counter set.
    pub const fn new() -> Self {
        Self {
            invocations: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            latency_samples: AtomicU64::new(0),
            mean_latency: AtomicU64::new(0),
        }
    }

    /// Count one invocation.
    #[inline]
    pub fn record_call(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one failed invocation.
    #[inline]
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold one latency sample into the running mean.
    ///
    /// Lock-free: concurrent samples race on the mean, and the loser retries
    /// against the winner's value. The sample count and the mean are separate
    /// atomics, so a concurrent reader may see them out of step.
    pub fn record_latency(&self, sample: f64) {
        let n = self.latency_samples.fetch_add(1, Ordering::Relaxed) + 1;
        // The closure always yields a value, so the update cannot fail.
        let _ = self
            .mean_latency
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                let mean = f64::from_bits(bits);
                Some((mean + (sample - mean) / n as f64).to_bits())
            });
    }

    /// Overwrite the mean latency; for callers that maintain their own average.
    pub fn set_mean_latency(&self, mean: f64) {
        self.mean_latency.store(mean.to_bits(), Ordering::Relaxed);
    }

    /// Read each field exactly once.
    ///
    /// The three loads are not a consistent cut.
    #[inline]
    pub fn read(&self) -> CounterReading {
        CounterReading {
            invocations: self.invocations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            mean_latency: f64::from_bits(self.mean_latency.load(Ordering::Relaxed)),
        }
    }

    /// Start timing one invocation; the call is counted immediately.
    pub fn begin(&self) -> OpTimer<'_> {
        self.record_call();
        OpTimer {
            counters: self,
            started: Instant::now(),
        }
    }
}

/// An in-flight operation started with [`AtomicCounterSet::begin`].
///
/// Dropping the timer without calling [`OpTimer::finish`] records nothing
/// beyond the invocation.
#[derive(Debug)]
#[must_use = "call finish() to record latency"]
pub struct OpTimer<'a> {
    counters: &'a AtomicCounterSet,
    started: Instant,
}

impl OpTimer<'_> {
    /// Record latency in microseconds, and a failure if `failed`.
    pub fn finish(self, failed: bool) {
        let micros = self.started.elapsed().as_secs_f64() * 1_000_000.0;
        self.counters.record_latency(micros);
        if failed {
            self.counters.record_failure();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn fresh_set_is_idle() {
        let c = AtomicCounterSet::new();
        assert!(c.read().is_idle());
        assert_eq!(c.read(), CounterReading::default());
    }

    #[test]
    fn running_mean_matches_arithmetic_mean() {
        let c = AtomicCounterSet::new();
        for s in [1.0, 2.0, 3.0, 6.0] {
            c.record_latency(s);
        }
        assert!((c.read().mean_latency - 3.0).abs() < 1e-12);
    }

    #[test]
    fn timer_counts_call_and_failure() {
        let c = AtomicCounterSet::new();
        c.begin().finish(false);
        c.begin().finish(true);
        let r = c.read();
        assert_eq!(r.invocations, 2);
        assert_eq!(r.failures, 1);
        assert!(r.mean_latency >= 0.0);
    }

    #[test]
    fn concurrent_calls_are_not_lost() {
        let c = Arc::new(AtomicCounterSet::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    for _ in 0..10_000 {
                        c.record_call();
                        c.record_latency(2.0);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        let r = c.read();
        assert_eq!(r.invocations, 80_000);
        // Racing first samples can skew the early mean; it converges.
        assert!((r.mean_latency - 2.0).abs() < 0.01);
    }
}
