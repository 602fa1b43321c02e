//! Throughput counter shared by the aggregator and its reporter
//!
//! The aggregator is the only writer; the reporter, progress display and
//! final summary read it. The running total is a plain atomic, the rate is
//! kept in ten 100ms buckets covering the last second.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const SLOTS: usize = 10;
const SLOT_WIDTH: Duration = Duration::from_millis(100);

/// Sliding one-second window of event counts
#[derive(Debug)]
struct RateWindow {
    origin: Instant,
    buckets: [u64; SLOTS],
    /// Absolute slot index of the newest bucket
    head: u64,
}

impl RateWindow {
    fn new(origin: Instant) -> Self {
        Self {
            origin,
            buckets: [0; SLOTS],
            head: 0,
        }
    }

    fn slot_of(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.origin);
        (elapsed.as_millis() / SLOT_WIDTH.as_millis()) as u64
    }

    /// Clear every bucket that fell out of the window
    fn advance(&mut self, now: Instant) -> usize {
        let slot = self.slot_of(now);
        if slot > self.head {
            if slot - self.head >= SLOTS as u64 {
                self.buckets = [0; SLOTS];
            } else {
                for s in (self.head + 1)..=slot {
                    self.buckets[(s % SLOTS as u64) as usize] = 0;
                }
            }
            self.head = slot;
        }
        (self.head % SLOTS as u64) as usize
    }

    fn incr(&mut self, now: Instant) {
        let idx = self.advance(now);
        self.buckets[idx] += 1;
    }

    fn rate(&mut self, now: Instant) -> u64 {
        self.advance(now);
        self.buckets.iter().sum()
    }
}

/// Running count of processed results plus a rolling one-second rate
#[derive(Debug)]
pub struct ThroughputCounter {
    processed: AtomicU64,
    window: Mutex<RateWindow>,
}

impl ThroughputCounter {
    /// Create a zeroed counter
    pub fn new() -> Self {
        Self {
            processed: AtomicU64::new(0),
            window: Mutex::new(RateWindow::new(Instant::now())),
        }
    }

    /// Record one processed result
    pub fn record(&self) {
        self.record_at(Instant::now());
    }

    fn record_at(&self, now: Instant) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.window.lock().incr(now);
    }

    /// Total results processed so far
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Results processed during the last second
    pub fn rate(&self) -> u64 {
        self.rate_at(Instant::now())
    }

    fn rate_at(&self, now: Instant) -> u64 {
        self.window.lock().rate(now)
    }
}

impl Default for ThroughputCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counts_and_rate() {
        let counter = ThroughputCounter::new();
        let t0 = Instant::now();

        for _ in 0..5 {
            counter.record_at(t0);
        }

        assert_eq!(counter.processed(), 5);
        assert_eq!(counter.rate_at(t0), 5);
    }

    #[test]
    fn test_rate_rolls_off() {
        let counter = ThroughputCounter::new();
        let t0 = Instant::now();

        counter.record_at(t0);
        counter.record_at(t0 + Duration::from_millis(550));
        assert_eq!(counter.rate_at(t0 + Duration::from_millis(600)), 2);

        // First event has left the window, second has not
        assert_eq!(counter.rate_at(t0 + Duration::from_millis(1150)), 1);

        // Both gone
        assert_eq!(counter.rate_at(t0 + Duration::from_secs(5)), 0);

        // Total never decreases
        assert_eq!(counter.processed(), 2);
    }

    #[test]
    fn test_concurrent_increments_are_exact() {
        let counter = Arc::new(ThroughputCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.record();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.processed(), 8000);
    }
}
