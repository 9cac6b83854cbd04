use std::time::Duration;

/// Calculate the pause before an attempt.
///
/// The first attempt (`attempt == 0`) starts immediately; every later attempt
/// waits the same fixed `sleep`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use odc_fetch::core::retry_delay;
///
/// assert_eq!(retry_delay(0, Duration::from_secs(5)), Duration::ZERO);
/// assert_eq!(retry_delay(1, Duration::from_secs(5)), Duration::from_secs(5));
/// assert_eq!(retry_delay(7, Duration::from_secs(5)), Duration::from_secs(5));
/// ```
pub fn retry_delay(attempt: u32, sleep: Duration) -> Duration {
    if attempt == 0 { Duration::ZERO } else { sleep }
}

/// Bounded number of attempts separated by a fixed sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    sleep: Duration,
}

impl RetryPolicy {
    /// `limit` is the total number of attempts; it is raised to at least 1.
    pub fn new(limit: u32, sleep: Duration) -> Self {
        Self { attempts: limit.max(1), sleep }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn delay_before(&self, attempt: u32) -> Duration {
        retry_delay(attempt, self.sleep)
    }

    /// Returns `true` if `attempt` (0-indexed) is the final one allowed.
    pub fn is_last(&self, attempt: u32) -> bool {
        attempt + 1 >= self.attempts
    }
}
