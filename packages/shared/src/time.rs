//! Time utilities with a clock abstraction for testability.
//!
//! All persisted timestamps in the messaging service are UTC Unix epoch
//! seconds, matching the wire format consumed by the frontend.

use chrono::Utc;

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get the current Unix timestamp in UTC (seconds)
    fn now_epoch_secs(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        now_epoch_secs()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_secs: i64) -> Self {
        Self {
            fixed_time: fixed_time_secs,
        }
    }
}

impl Clock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.fixed_time
    }
}

/// Get the current Unix timestamp in UTC (seconds)
pub fn now_epoch_secs() -> i64 {
    Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_returns_non_zero_timestamp() {
        let clock = SystemClock;

        let timestamp = clock.now_epoch_secs();

        assert!(timestamp > 0);
    }

    #[test]
    fn test_system_clock_returns_monotonic_timestamps() {
        let clock = SystemClock;

        let timestamp1 = clock.now_epoch_secs();
        let timestamp2 = clock.now_epoch_secs();

        assert!(timestamp2 >= timestamp1);
    }

    #[test]
    fn test_fixed_clock_returns_fixed_timestamp() {
        let fixed_time = 1_700_000_000;
        let clock = FixedClock::new(fixed_time);

        assert_eq!(clock.now_epoch_secs(), fixed_time);
    }

    #[test]
    fn test_fixed_clock_returns_consistent_timestamp() {
        let fixed_time = 1_234_567_890;
        let clock = FixedClock::new(fixed_time);

        assert_eq!(clock.now_epoch_secs(), fixed_time);
        assert_eq!(clock.now_epoch_secs(), fixed_time);
    }

}
