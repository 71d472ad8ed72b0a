//! Bounded startup polling

use std::time::Duration;

/// Poll every `interval` until `duration` has elapsed since startup.
///
/// Ticks land on `k * interval` for each `k * interval < duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    interval: Duration,
    duration: Duration,
}

impl PollSchedule {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(2000);

    pub fn new(interval: Duration, duration: Duration) -> Self {
        Self { interval, duration }
    }

    pub fn from_millis(interval_ms: u64, duration_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(interval_ms),
            Duration::from_millis(duration_ms),
        )
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero() && self.interval < self.duration
    }

    /// Number of ticks the window holds
    pub fn tick_count(&self) -> u64 {
        if !self.is_enabled() {
            return 0;
        }
        ((self.duration.as_nanos() - 1) / self.interval.as_nanos()) as u64
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, Self::DEFAULT_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_count() {
        assert_eq!(PollSchedule::default().tick_count(), 3);
        assert_eq!(PollSchedule::from_millis(500, 2001).tick_count(), 4);
        assert_eq!(PollSchedule::from_millis(300, 1000).tick_count(), 3);
    }

    #[test]
    fn test_disabled() {
        assert!(!PollSchedule::disabled().is_enabled());
        assert!(!PollSchedule::from_millis(0, 2000).is_enabled());
        assert!(!PollSchedule::from_millis(2000, 2000).is_enabled());
        assert_eq!(PollSchedule::from_millis(2000, 500).tick_count(), 0);
    }
}
