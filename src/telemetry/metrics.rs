//! Output frame-rate metrics
//!
//! The pipeline marks every emitted frame; the status API reads the
//! aggregated numbers through [`StreamStats`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Frame interval statistics
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    /// Average interval between emitted frames in milliseconds
    pub avg_ms: f64,
    /// Minimum interval in milliseconds
    pub min_ms: f64,
    /// Maximum interval in milliseconds
    pub max_ms: f64,
    /// 95th percentile interval
    pub p95_ms: f64,
    /// Number of samples in the statistics
    pub sample_count: usize,
}

/// Rolling window of emit timestamps
pub struct FrameRateMeter {
    /// Intervals between consecutive emits
    intervals: VecDeque<Duration>,
    /// Emit times for FPS calculation
    emits: VecDeque<Instant>,
    /// Maximum samples to keep
    max_samples: usize,
}

impl Default for FrameRateMeter {
    fn default() -> Self {
        Self::new(90)
    }
}

impl FrameRateMeter {
    pub fn new(max_samples: usize) -> Self {
        let max_samples = max_samples.max(2);
        Self {
            intervals: VecDeque::with_capacity(max_samples),
            emits: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    /// Record that a frame left the pipeline now
    pub fn mark_emitted(&mut self) {
        self.mark_emitted_at(Instant::now());
    }

    pub fn mark_emitted_at(&mut self, now: Instant) {
        if let Some(last) = self.emits.back() {
            self.intervals.push_back(now.saturating_duration_since(*last));
            if self.intervals.len() > self.max_samples {
                self.intervals.pop_front();
            }
        }

        self.emits.push_back(now);
        if self.emits.len() > self.max_samples {
            self.emits.pop_front();
        }
    }

    /// Frames per second over the window
    pub fn fps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.emits.front(), self.emits.back()) else {
            return 0.0;
        };
        let duration = last.saturating_duration_since(*first).as_secs_f64();

        if self.emits.len() >= 2 && duration > 0.0 {
            (self.emits.len() - 1) as f64 / duration
        } else {
            0.0
        }
    }

    pub fn stats(&self) -> FrameStats {
        if self.intervals.is_empty() {
            return FrameStats::default();
        }

        let mut times: Vec<f64> = self
            .intervals
            .iter()
            .map(|d| d.as_secs_f64() * 1000.0)
            .collect();
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let sum: f64 = times.iter().sum();

        FrameStats {
            avg_ms: sum / times.len() as f64,
            min_ms: times.first().copied().unwrap_or(0.0),
            max_ms: times.last().copied().unwrap_or(0.0),
            p95_ms: percentile(&times, 0.95),
            sample_count: times.len(),
        }
    }
}

/// Calculate percentile from sorted array
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * p) as usize;
    sorted[idx]
}

/// Counters shared between running pipelines and the status API
#[derive(Debug, Default)]
pub struct StreamStats {
    active_streams: AtomicUsize,
    frames_emitted: AtomicU64,
    /// f32 bit pattern of the most recent measured FPS
    measured_fps: AtomicU32,
}

impl StreamStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stream_started(&self) {
        self.active_streams.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stream_stopped(&self) {
        let _ = self
            .active_streams
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
        if self.active_streams() == 0 {
            self.measured_fps.store(0f32.to_bits(), Ordering::Relaxed);
        }
    }

    pub fn record_frame(&self, fps: f64) {
        self.frames_emitted.fetch_add(1, Ordering::Relaxed);
        self.measured_fps.store((fps as f32).to_bits(), Ordering::Relaxed);
    }

    pub fn active_streams(&self) -> usize {
        self.active_streams.load(Ordering::Relaxed)
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted.load(Ordering::Relaxed)
    }

    pub fn measured_fps(&self) -> f32 {
        f32::from_bits(self.measured_fps.load(Ordering::Relaxed))
    }
}

pub type StreamStatsHandle = Arc<StreamStats>;
