//! Paired-signal latency measurement.
//!
//! The render thread stamps the start and end of each cycle into two shared
//! atomics. Each stamp packs a 32-bit cycle counter with a 32-bit
//! microsecond timestamp, so counter and time are always read together.
//! A cycle tagged `n` at its start is tagged `n + 1` at its end; the next
//! cycle then starts at `n + 1`.
//!
//! The observer accepts a measurement only when `end == start + 1`. Equal
//! counters mean a cycle is still running. Any other combination comes from
//! two different cycles and is discarded, never reported as an outlier.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Accepted measurements kept for statistics.
pub const DEFAULT_WINDOW: usize = 64;

struct Signals {
    start: AtomicU64,
    end: AtomicU64,
    epoch: Instant,
}

#[inline]
fn pack(counter: u32, micros: u32) -> u64 {
    (u64::from(counter) << 32) | u64::from(micros)
}

#[inline]
fn unpack(stamp: u64) -> (u32, u32) {
    ((stamp >> 32) as u32, stamp as u32)
}

/// Render-side stamping handle. Lock-free and allocation-free.
pub struct ClockProbe {
    signals: Arc<Signals>,
    counter: u32,
}

impl ClockProbe {
    /// Stamps the start of a cycle with the current time.
    #[inline]
    pub fn begin(&mut self) {
        let now = self.now();
        self.begin_at(now);
    }

    /// Stamps the end of the current cycle with the current time.
    #[inline]
    pub fn end(&mut self) {
        let now = self.now();
        self.end_at(now);
    }

    /// Stamps a cycle start at an explicit time in microseconds.
    #[inline]
    pub fn begin_at(&mut self, micros: u32) {
        self.signals.start.store(pack(self.counter, micros), Ordering::Release);
    }

    /// Stamps a cycle end at an explicit time in microseconds.
    #[inline]
    pub fn end_at(&mut self, micros: u32) {
        self.counter = self.counter.wrapping_add(1);
        self.signals.end.store(pack(self.counter, micros), Ordering::Release);
    }

    #[inline]
    fn now(&self) -> u32 {
        // Wraps after ~71 minutes; latencies use wrapping subtraction.
        self.signals.epoch.elapsed().as_micros() as u32
    }
}

impl core::fmt::Debug for ClockProbe {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClockProbe").field("counter", &self.counter).finish()
    }
}

/// Rolling latency statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    /// Shortest accepted latency in the window.
    pub min: Duration,
    /// Longest accepted latency in the window.
    pub max: Duration,
    /// Mean over the window.
    pub mean: Duration,
    /// Measurements in the window.
    pub samples: usize,
}

/// Outcome of one [`ClockValidator::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    /// A fresh matched pair.
    Accepted(Duration),
    /// Start and end came from different cycles.
    Discarded,
    /// Nothing new since the last poll, or a cycle is in flight.
    Pending,
}

/// Edit-side observer validating start/end pairs.
pub struct ClockValidator {
    signals: Arc<Signals>,
    window: VecDeque<u32>,
    capacity: usize,
    last_pair: Option<(u64, u64)>,
    accepted: u64,
    discarded: u64,
}

impl ClockValidator {
    /// Validator keeping the last `window` accepted measurements.
    pub fn new(window: usize) -> Self {
        let capacity = window.max(1);
        Self {
            signals: Arc::new(Signals {
                start: AtomicU64::new(pack(0, 0)),
                end: AtomicU64::new(pack(0, 0)),
                epoch: Instant::now(),
            }),
            window: VecDeque::with_capacity(capacity),
            capacity,
            last_pair: None,
            accepted: 0,
            discarded: 0,
        }
    }

    /// Stamping handle for the render thread.
    ///
    /// There must be only one probe per validator; a second probe would
    /// interleave counters and every pair would be discarded.
    pub fn probe(&self) -> ClockProbe {
        ClockProbe {
            signals: Arc::clone(&self.signals),
            counter: unpack(self.signals.end.load(Ordering::Acquire)).0,
        }
    }

    /// Reads the shared stamps once.
    pub fn poll(&mut self) -> Reading {
        let end = self.signals.end.load(Ordering::Acquire);
        let start = self.signals.start.load(Ordering::Acquire);
        if self.last_pair == Some((start, end)) {
            return Reading::Pending;
        }
        let (start_counter, start_time) = unpack(start);
        let (end_counter, end_time) = unpack(end);
        if end_counter == start_counter {
            return Reading::Pending;
        }
        self.last_pair = Some((start, end));
        if end_counter != start_counter.wrapping_add(1) {
            self.discarded += 1;
            return Reading::Discarded;
        }
        let micros = end_time.wrapping_sub(start_time);
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(micros);
        self.accepted += 1;
        Reading::Accepted(Duration::from_micros(u64::from(micros)))
    }

    /// Statistics over the window, `None` before the first measurement.
    pub fn stats(&self) -> Option<LatencyStats> {
        let min = *self.window.iter().min()?;
        let max = *self.window.iter().max()?;
        let total: u64 = self.window.iter().map(|&m| u64::from(m)).sum();
        let mean = total / self.window.len() as u64;
        Some(LatencyStats {
            min: Duration::from_micros(u64::from(min)),
            max: Duration::from_micros(u64::from(max)),
            mean: Duration::from_micros(mean),
            samples: self.window.len(),
        })
    }

    /// Total accepted measurements.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Total discarded pairs.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Window capacity.
    pub fn window(&self) -> usize {
        self.capacity
    }
}

impl Default for ClockValidator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl core::fmt::Debug for ClockValidator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClockValidator")
            .field("window", &self.window.len())
            .field("accepted", &self.accepted)
            .field("discarded", &self.discarded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matched_pair_is_accepted_once() {
        let mut validator = ClockValidator::new(8);
        let mut probe = validator.probe();
        probe.begin_at(1_000);
        assert_eq!(validator.poll(), Reading::Pending);
        probe.end_at(1_250);
        assert_eq!(validator.poll(), Reading::Accepted(Duration::from_micros(250)));
        assert_eq!(validator.poll(), Reading::Pending);
        assert_eq!(validator.accepted(), 1);
    }

    #[test]
    fn mixed_cycles_are_discarded() {
        let mut validator = ClockValidator::new(8);
        let mut probe = validator.probe();
        probe.begin_at(0);
        probe.end_at(100);
        probe.begin_at(200);
        probe.end_at(300);
        probe.begin_at(400);
        // End stamp of cycle 0 read against the start of cycle 2.
        validator.signals.end.store(pack(1, 100), Ordering::Release);
        assert_eq!(validator.poll(), Reading::Discarded);
        assert_eq!(validator.discarded(), 1);
        assert!(validator.stats().is_none());
    }

    #[test]
    fn stats_cover_rolling_window() {
        let mut validator = ClockValidator::new(3);
        let mut probe = validator.probe();
        let mut t = 0;
        for latency in [100, 400, 200, 300] {
            probe.begin_at(t);
            probe.end_at(t + latency);
            assert!(matches!(validator.poll(), Reading::Accepted(_)));
            t += 1_000;
        }
        let stats = validator.stats().unwrap();
        assert_eq!(stats.samples, 3);
        assert_eq!(stats.min, Duration::from_micros(200));
        assert_eq!(stats.max, Duration::from_micros(400));
        assert_eq!(stats.mean, Duration::from_micros(300));
    }

    #[test]
    fn timestamps_wrap() {
        let mut validator = ClockValidator::new(4);
        let mut probe = validator.probe();
        probe.begin_at(u32::MAX - 9);
        probe.end_at(10);
        assert_eq!(validator.poll(), Reading::Accepted(Duration::from_micros(20)));
    }

    #[test]
    fn probe_runs_on_another_thread() {
        let mut validator = ClockValidator::default();
        let mut probe = validator.probe();
        std::thread::spawn(move || {
            probe.begin();
            probe.end();
        })
        .join()
        .unwrap();
        assert!(matches!(validator.poll(), Reading::Accepted(_)));
    }
}
