use std::time::Duration;

/// Backoff schedule for reconnection attempts.
///
/// Delays start at `initial` and double per attempt up to `max`. After
/// `max_attempts` delays have been handed out the timer is exhausted until
/// [`reset`](Self::reset) is called.
#[derive(Debug, Clone)]
pub struct ReconnectTimer {
    attempts: u32,
    initial: Duration,
    max: Duration,
    max_attempts: u32,
}

impl ReconnectTimer {
    pub fn new(initial: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            initial,
            max: max.max(initial),
            max_attempts,
        }
    }

    /// Delay before the next attempt, or `None` once attempts are used up
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }

        let mut delay = self.initial;
        for _ in 0..self.attempts {
            delay = delay.saturating_mul(2).min(self.max);
        }

        self.attempts += 1;
        Some(delay)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
