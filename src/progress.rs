//! Progress reporting for the encode and decode loops.
//!
//! A [`ProgressTracker`] counts processed frames and, every `interval` frames
//! and on the last one, hands a [`ProgressInfo`] snapshot to a
//! [`ProgressCallback`]. The default callback, [`LogProgress`], writes a
//! `tracing` line.
//!
//! ```
//! use ooo_codec::progress::{Operation, ProgressCallback, ProgressInfo, ProgressTracker};
//!
//! struct Silent;
//!
//! impl ProgressCallback for Silent {
//!     fn on_progress(&self, _info: &ProgressInfo) {}
//! }
//!
//! let mut tracker = ProgressTracker::new(&Silent, Operation::Decoding, Some(90), 30);
//! for _ in 0..90 {
//!     tracker.advance();
//! }
//! assert_eq!(tracker.reports(), 3);
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use tracing::info;

/// Frames between two progress reports
pub const DEFAULT_INTERVAL: u64 = 30;

/// The loop being measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Encoding,
    Decoding,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Encoding => write!(f, "Encoding"),
            Operation::Decoding => write!(f, "Decoding"),
        }
    }
}

/// A snapshot of loop progress
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressInfo {
    pub operation: Operation,
    /// Frames processed so far
    pub current: u64,
    /// Frames expected, when known
    pub total: Option<u64>,
    /// Completion percentage (0.0 - 100.0), when `total` is known
    pub percentage: Option<f64>,
    /// Wall-clock time since the loop started
    pub elapsed: Duration,
    /// Frames per second since the loop started
    pub rate: f64,
    /// Remaining time at the current rate, when `total` is known
    pub estimated_remaining: Option<Duration>,
}

impl ProgressInfo {
    /// Derive percentage, rate and ETA from the raw counters
    pub fn compute(operation: Operation, current: u64, total: Option<u64>, elapsed: Duration) -> Self {
        let total = total.filter(|&t| t > 0);
        let seconds = elapsed.as_secs_f64();

        let percentage = total.map(|t| current as f64 / t as f64 * 100.0);
        let rate = if seconds > 0.0 { current as f64 / seconds } else { 0.0 };
        let estimated_remaining = match total {
            Some(t) if rate > 0.0 => {
                Some(Duration::from_secs_f64(t.saturating_sub(current) as f64 / rate))
            }
            _ => None,
        };

        Self { operation, current, total, percentage, elapsed, rate, estimated_remaining }
    }
}

impl fmt::Display for ProgressInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.percentage, self.total) {
            (Some(percentage), Some(total)) => write!(
                f,
                "{}: {:.1}% ({}/{}) - {:.1} fps",
                self.operation, percentage, self.current, total, self.rate
            )?,
            _ => write!(f, "{}: {} frames - {:.1} fps", self.operation, self.current, self.rate)?,
        }
        if let Some(eta) = self.estimated_remaining {
            write!(f, " - ETA: {:.0}s", eta.as_secs_f64())?;
        }
        Ok(())
    }
}

/// Receives progress snapshots; observes but cannot stop the loop
pub trait ProgressCallback {
    fn on_progress(&self, info: &ProgressInfo);
}

/// Default callback: one `info!` line per report
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressCallback for LogProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        info!("{}", info);
    }
}

/// Counts processed frames and fires the callback on cadence
pub struct ProgressTracker<'a> {
    callback: &'a dyn ProgressCallback,
    operation: Operation,
    total: Option<u64>,
    interval: u64,
    current: u64,
    reports: u64,
    last_reported: u64,
    start_time: Instant,
}

impl<'a> ProgressTracker<'a> {
    /// Start measuring now
    pub fn new(
        callback: &'a dyn ProgressCallback,
        operation: Operation,
        total: Option<u64>,
        interval: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total: total.filter(|&t| t > 0),
            interval: interval.max(1),
            current: 0,
            reports: 0,
            last_reported: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one processed frame
    pub fn advance(&mut self) {
        self.current += 1;
        let on_cadence = self.current % self.interval == 0;
        let is_last = self.total == Some(self.current);
        if on_cadence || is_last {
            self.report();
        }
    }

    /// Emit a closing report unless the last frame was already reported
    pub fn finish(&mut self) {
        if self.current > 0 && self.last_reported != self.current {
            self.report();
        }
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    /// Number of reports emitted so far
    pub fn reports(&self) -> u64 {
        self.reports
    }

    fn report(&mut self) {
        let info = ProgressInfo::compute(self.operation, self.current, self.total, self.start_time.elapsed());
        self.callback.on_progress(&info);
        self.reports += 1;
        self.last_reported = self.current;
    }
}
