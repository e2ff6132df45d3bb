//! Microphone input level metering.

use crate::media::LevelTap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Samples read per poll (half of a 512-point analyser window).
pub const SAMPLE_WINDOW: usize = 256;

/// Shortest polling period; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Converts 8-bit time-domain samples centred on 128 into a 0..=100 level.
pub fn rms_level(samples: &[u8]) -> u8 {
    if samples.is_empty() {
        return 0;
    }
    let sum: f64 = samples
        .iter()
        .map(|&sample| {
            let v = (f64::from(sample) - 128.0) / 128.0;
            v * v
        })
        .sum();
    let rms = (sum / samples.len() as f64).sqrt();
    (rms * 150.0).round().min(100.0) as u8
}

/// A polling task that keeps the latest input level.
///
/// The task is aborted when the meter is stopped or dropped.
#[derive(Debug)]
pub struct LevelMeter {
    level: Arc<AtomicU8>,
    task: JoinHandle<()>,
}

impl LevelMeter {
    /// Starts polling `tap` every `interval`, at least every millisecond.
    /// Must be called inside a tokio runtime.
    pub fn start(mut tap: Box<dyn LevelTap>, interval: Duration) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        let level = Arc::new(AtomicU8::new(0));
        let shared = level.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut samples = vec![128u8; SAMPLE_WINDOW];

            loop {
                ticker.tick().await;
                tap.read(&mut samples);
                shared.store(rms_level(&samples), Ordering::Relaxed);
            }
        });

        tracing::debug!(interval_ms = interval.as_millis() as u64, "level meter started");
        Self { level, task }
    }

    pub fn level(&self) -> u8 {
        self.level.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        self.task.abort();
        tracing::debug!("level meter stopped");
    }
}

impl Drop for LevelMeter {
    fn drop(&mut self) {
        self.task.abort();
    }
}
