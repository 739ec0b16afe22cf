use std::time::Duration;

pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_millis(10_000);

/// Doubling reconnect delay with an upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: DEFAULT_INITIAL_BACKOFF,
            max: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl Backoff {
    /// Delay before reconnect attempt number `attempt` (zero based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial.saturating_mul(factor).min(self.max)
    }
}
