//! Progress reporting and cancellation.
//!
//! Long operations report an integer percentage through a
//! [`ProgressCallback`] and poll a [`CancellationToken`] between units of
//! work. Percentages delivered to one callback never decrease, and a
//! successful export always finishes with 100.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gifcut::{BuildOptions, CancellationToken, ProgressInfo};
//!
//! let token = CancellationToken::new();
//! let options = BuildOptions::new()
//!     .with_progress(Arc::new(|info: &ProgressInfo| {
//!         println!("[{:?}] {}%", info.operation, info.percentage);
//!     }))
//!     .with_cancellation(token.clone());
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The kind of work being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Decoding and transforming sampled frames.
    FrameSampling,
    /// Writing the animated GIF.
    GifEncoding,
    /// Decoding timeline thumbnails.
    ThumbnailGeneration,
}

/// A progress snapshot.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What is being done.
    pub operation: OperationType,
    /// Overall completion, 0 to 100.
    pub percentage: u8,
    /// Work items finished in the current phase.
    pub current: u64,
    /// Work items planned for the current phase, if known.
    pub total: Option<u64>,
    /// Time since the operation started.
    pub elapsed: Duration,
    /// Remaining time extrapolated from throughput so far.
    pub estimated_remaining: Option<Duration>,
    /// Effective segment currently being sampled.
    pub segment_index: Option<usize>,
}

/// Receives progress updates.
///
/// Callbacks observe but cannot stop an operation; use
/// [`CancellationToken`] for that.
pub trait ProgressCallback: Send + Sync {
    /// Called as work completes.
    fn on_progress(&self, info: &ProgressInfo);
}

impl<F> ProgressCallback for F
where
    F: Fn(&ProgressInfo) + Send + Sync,
{
    fn on_progress(&self, info: &ProgressInfo) {
        self(info)
    }
}

/// Discards every update. The default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation flag shared between threads.
///
/// ```
/// use gifcut::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker_view = token.clone();
/// token.cancel();
/// assert!(worker_view.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps per-item progress of one phase onto a percentage band and keeps the
/// emitted values non-decreasing.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: u64,
    current: u64,
    band: (u8, u8),
    batch_size: u64,
    items_since_last_report: u64,
    last_percentage: Option<u8>,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: u64,
        band: (u8, u8),
        batch_size: u64,
    ) -> Self {
        let low = band.0.min(100);
        let high = band.1.clamp(low, 100);
        Self {
            callback,
            operation,
            total,
            current: 0,
            band: (low, high),
            batch_size: batch_size.max(1),
            items_since_last_report: 0,
            last_percentage: None,
            start_time: Instant::now(),
        }
    }

    /// Record one finished item; reports every `batch_size` items.
    pub(crate) fn advance(&mut self, segment_index: Option<usize>) {
        self.current += 1;
        self.items_since_last_report += 1;
        if self.items_since_last_report >= self.batch_size {
            self.items_since_last_report = 0;
            let percentage = self.band_percentage();
            self.report(percentage, segment_index);
        }
    }

    /// Report the end of the band.
    pub(crate) fn finish_band(&mut self) {
        self.current = self.total.max(self.current);
        self.report(self.band.1, None);
    }

    /// Switch to a new phase, keeping the timer and the monotonic floor.
    pub(crate) fn enter_phase(&mut self, operation: OperationType, total: u64, band: (u8, u8)) {
        let low = band.0.min(100);
        self.operation = operation;
        self.total = total;
        self.current = 0;
        self.items_since_last_report = 0;
        self.band = (low, band.1.clamp(low, 100));
    }

    /// Report an explicit percentage.
    pub(crate) fn report_percentage(&mut self, percentage: u8) {
        self.report(percentage.min(100), None);
    }

    fn band_percentage(&self) -> u8 {
        let (low, high) = self.band;
        if self.total == 0 {
            return high;
        }
        let span = (high - low) as u64;
        let done = self.current.min(self.total);
        low + (span * done / self.total) as u8
    }

    fn report(&mut self, percentage: u8, segment_index: Option<usize>) {
        let percentage = self
            .last_percentage
            .map_or(percentage, |last| last.max(percentage));
        self.last_percentage = Some(percentage);

        let elapsed = self.start_time.elapsed();
        let estimated_remaining = (self.current > 0 && self.total > 0).then(|| {
            let remaining = self.total.saturating_sub(self.current);
            elapsed.mul_f64(remaining as f64 / self.current as f64)
        });

        let info = ProgressInfo {
            operation: self.operation,
            percentage,
            current: self.current,
            total: Some(self.total),
            elapsed,
            estimated_remaining,
            segment_index,
        };
        self.callback.on_progress(&info);
    }
}
