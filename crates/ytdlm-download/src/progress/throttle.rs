//! Progress event throttling.
//!
//! `yt-dlp --newline` prints a progress line for every chunk, often dozens
//! per second. The registry always holds the latest value; only the
//! `JobUpdated` events are rate-limited.

use std::time::{Duration, Instant};

/// Per-job limiter for progress events.
///
/// Emits at most once per `min_interval`, except that reaching 100% is
/// always emitted so listeners see the file finish.
#[derive(Debug)]
pub struct ProgressThrottle {
    last_emit: Option<Instant>,
    min_interval: Duration,
}

impl ProgressThrottle {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

    #[must_use]
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_emit: None,
            min_interval,
        }
    }

    /// Whether a progress event at `percent` should go out at `now`.
    pub fn should_emit(&mut self, now: Instant, percent: f64) -> bool {
        let due = self
            .last_emit
            .is_none_or(|last| now.saturating_duration_since(last) >= self.min_interval);
        if due || percent >= 100.0 {
            self.last_emit = Some(now);
            true
        } else {
            false
        }
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_always_emits() {
        let mut throttle = ProgressThrottle::default();
        assert!(throttle.should_emit(Instant::now(), 1.0));
    }

    #[test]
    fn test_samples_inside_interval_are_dropped() {
        let mut throttle = ProgressThrottle::new(Duration::from_millis(100));
        let t0 = Instant::now();
        assert!(throttle.should_emit(t0, 10.0));
        assert!(!throttle.should_emit(t0 + Duration::from_millis(40), 11.0));
        assert!(!throttle.should_emit(t0 + Duration::from_millis(99), 12.0));
        assert!(throttle.should_emit(t0 + Duration::from_millis(100), 13.0));
    }

    #[test]
    fn test_completion_bypasses_interval() {
        let mut throttle = ProgressThrottle::new(Duration::from_secs(10));
        let t0 = Instant::now();
        assert!(throttle.should_emit(t0, 50.0));
        assert!(throttle.should_emit(t0 + Duration::from_millis(1), 100.0));
    }
}
