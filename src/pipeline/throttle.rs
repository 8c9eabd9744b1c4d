//! Output rate limiting
//!
//! Enforces a minimum interval between emitted frames by sleeping the
//! pipeline thread for whatever is left of the interval.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_emit: Instant,
}

impl Throttle {
    /// Interval of `1 / target_fps`; the clock starts now
    pub fn new(target_fps: u32) -> Self {
        Self::with_interval(Duration::from_secs_f64(1.0 / target_fps.max(1) as f64))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: Instant::now(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time still to wait at `now` before the next frame may go out
    pub fn remaining(&self, now: Instant) -> Duration {
        self.interval
            .saturating_sub(now.saturating_duration_since(self.last_emit))
    }

    /// Sleep out the rest of the interval, then restart the clock
    ///
    /// Returns how long the caller was suspended.
    pub fn wait(&mut self) -> Duration {
        let remaining = self.remaining(Instant::now());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
        self.last_emit = Instant::now();
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_fps() {
        assert_eq!(Throttle::new(50).interval(), Duration::from_millis(20));
        assert_eq!(Throttle::new(0).interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_remaining_counts_down() {
        let throttle = Throttle::with_interval(Duration::from_millis(100));
        let start = throttle.last_emit;
        assert_eq!(throttle.remaining(start), Duration::from_millis(100));
        assert_eq!(
            throttle.remaining(start + Duration::from_millis(30)),
            Duration::from_millis(70)
        );
        assert_eq!(throttle.remaining(start + Duration::from_millis(250)), Duration::ZERO);
    }

    #[test]
    fn test_wait_enforces_interval() {
        let mut throttle = Throttle::with_interval(Duration::from_millis(20));
        let start = Instant::now();
        for _ in 0..5 {
            throttle.wait();
        }
        assert!(start.elapsed() >= Duration::from_millis(95));
    }

    #[test]
    fn test_wait_skips_sleep_when_late() {
        let mut throttle = Throttle::with_interval(Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(throttle.wait(), Duration::ZERO);
    }
}
