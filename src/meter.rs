//! Throughput meter: transmissions per second, averaged over a fixed interval.
//!
//! Purely observational. Nothing reads the figure back to throttle producers.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

/// Default reporting interval.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
pub struct ThroughputMeter {
    count: AtomicU64,
    /// Last reported FPS, stored as `f32` bits
    last_fps: AtomicU32,
    total: AtomicU64,
}

impl ThroughputMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one successful transmission.
    pub fn record(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Average FPS over `interval`; resets the counter to zero.
    pub fn report(&self, interval: Duration) -> f32 {
        let count = self.count.swap(0, Ordering::Relaxed);
        let secs = interval.as_secs_f32();
        let fps = if secs > 0.0 { count as f32 / secs } else { 0.0 };
        self.last_fps.store(fps.to_bits(), Ordering::Relaxed);
        fps
    }

    /// Report and log the FPS for `interval`.
    pub fn log_report(&self, interval: Duration) -> f32 {
        let fps = self.report(interval);
        log::info!("FPS: {:.2} (avg over {}s)", fps, interval.as_secs_f32());
        fps
    }

    /// Transmissions counted since the last report.
    pub fn pending(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// FPS from the most recent report.
    pub fn last_fps(&self) -> f32 {
        f32::from_bits(self.last_fps.load(Ordering::Relaxed))
    }

    /// Transmissions counted since creation.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}
