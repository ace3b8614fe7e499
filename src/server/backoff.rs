//! Retry pacing for the server receive loop.

use std::time::Duration;

const MIN_DELAY: Duration = Duration::from_millis(1);

/// Bounds for the exponential back-off applied after `recv_from` failures.
///
/// Defaults to a 10 ms first delay doubling up to 1 s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Pause after the first failure in a row.
    pub initial_delay: Duration,
    /// Upper bound for any pause.
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl BackoffConfig {
    /// Raise both bounds to at least one millisecond and order them.
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use relayhttp::server::BackoffConfig;
    ///
    /// let bounds = BackoffConfig {
    ///     initial_delay: Duration::from_millis(40),
    ///     max_delay: Duration::ZERO,
    /// }
    /// .normalized();
    /// assert_eq!(bounds.initial_delay, Duration::from_millis(1));
    /// assert_eq!(bounds.max_delay, Duration::from_millis(40));
    /// ```
    #[must_use]
    pub fn normalized(self) -> Self {
        let a = self.initial_delay.max(MIN_DELAY);
        let b = self.max_delay.max(MIN_DELAY);
        Self {
            initial_delay: a.min(b),
            max_delay: a.max(b),
        }
    }

    /// Start a back-off sequence using the normalized bounds.
    #[must_use]
    pub fn start(self) -> Backoff {
        let bounds = self.normalized();
        Backoff {
            bounds,
            next: bounds.initial_delay,
        }
    }
}

/// Running back-off state for one receive loop.
#[derive(Clone, Copy, Debug)]
pub struct Backoff {
    bounds: BackoffConfig,
    next: Duration,
}

impl Backoff {
    /// Pause to apply for the current failure; doubles the following one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (delay * 2).min(self.bounds.max_delay);
        delay
    }

    /// Forget past failures after a successful receive.
    pub fn reset(&mut self) { self.next = self.bounds.initial_delay; }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::BackoffConfig;

    #[rstest]
    #[case(BackoffConfig::default(), &[10, 20, 40, 80, 160, 320, 640, 1000, 1000])]
    #[case(BackoffConfig { initial_delay: Duration::ZERO, max_delay: Duration::from_millis(3) }, &[1, 2, 3, 3])]
    fn delays_double_up_to_cap(#[case] config: BackoffConfig, #[case] expected_ms: &[u64]) {
        let mut backoff = config.start();
        let delays: Vec<u64> = expected_ms
            .iter()
            .map(|_| u64::try_from(backoff.next_delay().as_millis()).expect("fits u64"))
            .collect();
        assert_eq!(delays, expected_ms);
    }

    #[test]
    fn reset_returns_to_initial_delay() {
        let mut backoff = BackoffConfig::default().start();
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(10));
    }
}
