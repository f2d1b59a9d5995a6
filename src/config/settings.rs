//! Runtime breaker settings.

use std::time::Duration;

/// Live configuration of one circuit breaker.
///
/// Owned by the breaker and mutated in place through
/// [`CircuitBreaker::change_settings`](crate::CircuitBreaker::change_settings).
/// No validation is applied here; see [`crate::config::validation`] for the
/// checks run on configuration files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Error percentage (0-100) that trips the breaker. 0 disables tripping.
    pub error_rate_threshold_pct: u32,

    /// Average requests per second over `error_rate_window` required before
    /// the threshold is evaluated.
    pub min_qps_for_open: u32,

    /// How long a closed sojourn accumulates outcomes before evaluation.
    pub error_rate_window: Duration,

    /// How long the breaker stays open before admitting a probe.
    pub cool_down_interval: Duration,

    /// Consecutive successful probes required to close from half-open.
    pub half_open_success_count: u32,
}

impl Settings {
    /// Requests that must be observed within one window before the error
    /// rate is allowed to trip the breaker.
    ///
    /// Fractional seconds of the window are truncated.
    pub fn min_requests_for_open(&self) -> u64 {
        self.error_rate_window
            .as_secs()
            .saturating_mul(u64::from(self.min_qps_for_open))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            error_rate_threshold_pct: 50,
            min_qps_for_open: 10,
            error_rate_window: Duration::from_secs(30),
            cool_down_interval: Duration::from_secs(10),
            half_open_success_count: 1,
        }
    }
}
