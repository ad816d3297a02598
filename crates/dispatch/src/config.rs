use std::time::Duration;

/// Pacing and retry parameters for a [`crate::DispatchQueue`].
///
/// Fixed at construction time; only the retry limit can be overridden per
/// submission.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum executions started per second.
    pub requests_per_second: u32,

    /// Default retry ceiling for a failed operation.
    pub max_retries: u32,

    /// Cooldown before a failed, retryable operation becomes eligible again.
    pub retry_delay: Duration,
}

impl DispatchConfig {
    pub fn new(requests_per_second: u32, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            requests_per_second,
            max_retries,
            retry_delay,
        }
    }

    /// Minimum time between the start of two consecutive executions.
    ///
    /// A `requests_per_second` of zero is treated as one request per second.
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.requests_per_second.max(1)))
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 1,
            max_retries: 3,
            retry_delay: Duration::from_millis(5000),
        }
    }
}
