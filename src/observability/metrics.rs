//! Metrics collection and exposition.
//!
//! # Metrics
//! - `circuit_breaker_events_total` (counter): one increment per call through a
//!   breaker, labeled by `name` and `event` (`success`, `failure`, `fast_fail`)
//!
//! # Design Decisions
//! - Each breaker holds its own sink, so breakers stay independently testable
//! - Counter handles are resolved once at construction; updates are atomic adds
//! - Without an installed recorder every update is a no-op

use std::net::SocketAddr;

use metrics::{counter, describe_counter, Counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const BREAKER_EVENTS_TOTAL: &str = "circuit_breaker_events_total";

/// Outcome of one call through a breaker, as seen by metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakerEvent {
    /// Call ran and was not overloaded.
    Success,
    /// Call ran and was classified overloaded, panicked, or was cancelled.
    Failure,
    /// Call was rejected without running.
    FastFail,
}

impl BreakerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerEvent::Success => "success",
            BreakerEvent::Failure => "failure",
            BreakerEvent::FastFail => "fast_fail",
        }
    }
}

/// Receives one event per call through a breaker.
pub trait MetricsSink: Send + Sync {
    fn record(&self, event: BreakerEvent);
}

/// Sink backed by the global `metrics` recorder.
pub struct PrometheusSink {
    success: Counter,
    failure: Counter,
    fast_fail: Counter,
}

impl PrometheusSink {
    pub fn new(breaker_name: &str) -> Self {
        let label = metric_label(breaker_name);
        let handle = |event: BreakerEvent| {
            counter!(BREAKER_EVENTS_TOTAL, "name" => label.clone(), "event" => event.as_str())
        };

        Self {
            success: handle(BreakerEvent::Success),
            failure: handle(BreakerEvent::Failure),
            fast_fail: handle(BreakerEvent::FastFail),
        }
    }
}

impl MetricsSink for PrometheusSink {
    fn record(&self, event: BreakerEvent) {
        match event {
            BreakerEvent::Success => self.success.increment(1),
            BreakerEvent::Failure => self.failure.increment(1),
            BreakerEvent::FastFail => self.fast_fail.increment(1),
        }
    }
}

/// Normalize a breaker name for use as a metric label value.
pub fn metric_label(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Install the Prometheus exporter and serve scrapes on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!(
        BREAKER_EVENTS_TOTAL,
        "Calls through a circuit breaker by outcome (success, failure, fast_fail)"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}
