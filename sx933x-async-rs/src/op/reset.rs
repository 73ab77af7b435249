//! Soft reset retry policy.

use embassy_time::Duration;

/// A bounded retry policy with a fixed back-off between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    pub attempts: u8,
    /// Delay between two consecutive attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Creates a new policy.
    pub const fn new(attempts: u8, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }
}

impl Default for RetryPolicy {
    /// Ten attempts, 10 ms apart.
    fn default() -> Self {
        Self::new(10, Duration::from_millis(10))
    }
}

/// The result of a best-effort soft reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetOutcome {
    /// Number of reset writes issued.
    pub attempts: u8,
    /// `true` if one of the writes was accepted by the bus.
    pub acknowledged: bool,
}
