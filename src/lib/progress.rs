//! Progress tracking utilities.
//!
//! A thread-safe counter that logs progress each time the count crosses an
//! interval boundary.

use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe progress tracker for logging progress at regular intervals.
///
/// # Example
/// ```
/// use readsim_lib::progress::ProgressTracker;
///
/// let tracker = ProgressTracker::new("Wrote read pairs").with_interval(100);
/// for _ in 0..250 {
///     tracker.log_if_needed(1); // logs at 100 and 200
/// }
/// tracker.log_final(); // logs "Wrote read pairs 250 (complete)"
/// ```
pub struct ProgressTracker {
    interval: u64,
    message: String,
    count: AtomicU64,
}

impl ProgressTracker {
    /// Creates a tracker with a count of 0 and a default interval of 10,000.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { interval: 10_000, message: message.into(), count: AtomicU64::new(0) }
    }

    /// Sets the logging interval.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        assert!(interval > 0, "progress interval must be positive");
        self.interval = interval;
        self
    }

    /// Adds to the count and logs once per interval boundary crossed.
    pub fn log_if_needed(&self, additional: u64) {
        if additional == 0 {
            return;
        }
        let prev = self.count.fetch_add(additional, Ordering::Relaxed);
        let new_count = prev + additional;

        for i in (prev / self.interval + 1)..=(new_count / self.interval) {
            info!("{} {}", self.message, i * self.interval);
        }
    }

    /// Logs the final count unless it landed exactly on an interval.
    pub fn log_final(&self) {
        let count = self.count.load(Ordering::Relaxed);
        if count % self.interval != 0 {
            info!("{} {} (complete)", self.message, count);
        }
    }

    /// Current count.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
