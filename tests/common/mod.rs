//! Shared helpers for breaker integration tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use circuit_breaker::observability::metrics::{BreakerEvent, MetricsSink};
use circuit_breaker::resilience::ManualClock;
use circuit_breaker::{BreakerResult, CircuitBreaker, Overloading, Settings};

/// Sink that counts events so tests can compare against breaker totals.
#[derive(Default)]
pub struct CountingSink {
    pub success: AtomicU64,
    pub failure: AtomicU64,
    pub fast_fail: AtomicU64,
}

impl CountingSink {
    #[allow(dead_code)]
    pub fn total(&self) -> u64 {
        self.success.load(Ordering::SeqCst)
            + self.failure.load(Ordering::SeqCst)
            + self.fast_fail.load(Ordering::SeqCst)
    }
}

impl MetricsSink for CountingSink {
    fn record(&self, event: BreakerEvent) {
        let counter = match event {
            BreakerEvent::Success => &self.success,
            BreakerEvent::Failure => &self.failure,
            BreakerEvent::FastFail => &self.fast_fail,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// threshold 50%, 1 qps, 1s window, 10s cooldown, 3 probes.
pub fn settings() -> Settings {
    Settings {
        error_rate_threshold_pct: 50,
        min_qps_for_open: 1,
        error_rate_window: Duration::from_secs(1),
        cool_down_interval: Duration::from_secs(10),
        half_open_success_count: 3,
    }
}

#[allow(dead_code)]
pub struct Harness {
    pub breaker: CircuitBreaker<ManualClock>,
    pub clock: ManualClock,
    #[allow(dead_code)]
    pub sink: Arc<CountingSink>,
}

#[allow(dead_code)]
pub fn harness(settings: Settings) -> Harness {
    let clock = ManualClock::new();
    let sink = Arc::new(CountingSink::default());
    let breaker = CircuitBreaker::with_clock("integration test", settings, clock.clone(), sink.clone());
    Harness { breaker, clock, sink }
}

#[allow(dead_code)]
impl Harness {
    pub fn succeed(&self) -> BreakerResult<&'static str, &'static str> {
        self.breaker.execute(|| (Ok("ok"), Overloading::No))
    }

    pub fn fail(&self) -> BreakerResult<&'static str, &'static str> {
        self.breaker.execute(|| (Err("overloaded"), Overloading::Yes))
    }

    pub fn advance_secs(&self, secs: u64) {
        self.clock.advance(Duration::from_secs(secs));
    }

    /// Fill one window with 4 successes and 6 failures, then cross its end.
    /// The request that crosses it is rejected and the breaker is open.
    #[allow(dead_code)]
    pub fn trip(&self) {
        for _ in 0..4 {
            assert!(self.succeed().is_ok());
        }
        for _ in 0..6 {
            assert!(self.fail().is_err());
        }
        self.advance_secs(1);
        assert!(self.succeed().unwrap_err().is_open());
    }
}
