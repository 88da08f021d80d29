use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Fixed-window rate limiter keyed by username.
pub struct RateLimiter {
    /// Map from key to (window_start, attempt_count)
    attempts: DashMap<String, (Instant, u32)>,
    max_attempts: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            attempts: DashMap::new(),
            max_attempts,
            window,
        }
    }

    /// Record an attempt for `key`.
    /// Returns Err(remaining_wait_time) once the window's budget is spent.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        let now = Instant::now();

        let mut entry = self.attempts.entry(key.to_string()).or_insert((now, 0));
        let (started, count) = entry.value_mut();

        // A new window starts with this attempt
        if now.duration_since(*started) >= self.window {
            *started = now;
            *count = 1;
            return Ok(());
        }

        if *count >= self.max_attempts {
            return Err(self.window - now.duration_since(*started));
        }

        *count += 1;
        Ok(())
    }

    /// Drop entries whose window ended long ago.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.attempts
            .retain(|_, (started, _)| now.duration_since(*started) < self.window * 2);
    }
}
