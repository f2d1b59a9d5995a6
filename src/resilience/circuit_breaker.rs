//! Circuit breaker for protecting calls to a failing or overloaded dependency.
//!
//! # Request Flow
//! ```text
//! execute(call)
//!     → lock; current state evaluates the request (may transition); unlock
//!     → rejected: BreakerError::Open, call never runs
//!     → admitted: call runs with no lock held
//!     → lock; outcome counted only if the admitting sojourn is still current
//! ```
//!
//! # Design Decisions
//! - One breaker per logical dependency, state local to the process
//! - A single mutex guards settings and the current state; the wrapped call
//!   never runs under it, only the `change_settings` mutator does
//! - Outcomes from a superseded sojourn are dropped, not carried over
//! - Panics and cancelled futures count as overloaded outcomes

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::config::Settings;
use crate::observability::metrics::{BreakerEvent, MetricsSink, PrometheusSink};
use crate::resilience::clock::{Clock, SystemClock};
use crate::resilience::error::{BreakerError, BreakerResult};
use crate::resilience::state::{Admission, Overloading, State, StateType};

/// Lifetime call totals of one breaker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CallStats {
    pub success: u64,
    pub failure: u64,
    pub fast_fail: u64,
}

impl CallStats {
    /// Number of calls made through the breaker.
    pub fn total(&self) -> u64 {
        self.success + self.failure + self.fast_fail
    }
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: StateType,
    /// Probes admitted in the current half-open sojourn.
    pub pending_count: u32,
    pub success_count: u32,
    pub failure_count: u32,
    pub totals: CallStats,
}

#[derive(Debug, Default)]
struct Counters {
    success: AtomicU64,
    failure: AtomicU64,
    fast_fail: AtomicU64,
}

#[derive(Debug)]
struct Inner {
    settings: Settings,
    state: State,
}

/// A circuit breaker guarding one dependency.
///
/// Share it between callers behind an `Arc`; every method takes `&self`.
pub struct CircuitBreaker<C: Clock = SystemClock> {
    name: String,
    clock: C,
    inner: Mutex<Inner>,
    counters: Counters,
    metrics: Arc<dyn MetricsSink>,
}

impl CircuitBreaker<SystemClock> {
    /// Create a closed breaker reporting to the global metrics recorder.
    pub fn new(name: impl Into<String>, settings: Settings) -> Self {
        let name = name.into();
        let metrics = Arc::new(PrometheusSink::new(&name));
        Self::with_clock(name, settings, SystemClock, metrics)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a closed breaker with an explicit clock and metrics sink.
    pub fn with_clock(
        name: impl Into<String>,
        settings: Settings,
        clock: C,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let state = State::new(0, StateType::Closed, clock.now(), &settings);

        Self {
            name: name.into(),
            clock,
            inner: Mutex::new(Inner { settings, state }),
            counters: Counters::default(),
            metrics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the current sojourn. Transitions are lazy, so this reflects
    /// the state as of the last request, not of "now".
    pub fn state(&self) -> StateType {
        self.lock().state.state_type()
    }

    /// Copy of the live settings.
    pub fn settings(&self) -> Settings {
        self.lock().settings.clone()
    }

    /// Modify the live settings in place.
    ///
    /// Takes effect at the next request evaluation, including for the sojourn
    /// already in progress. Values are not validated.
    pub fn change_settings<F>(&self, apply: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut inner = self.lock();
        // Edit a copy so a panicking mutator leaves the live settings untouched.
        let mut next = inner.settings.clone();
        apply(&mut next);
        inner.settings = next;
        tracing::debug!(breaker = %self.name, settings = ?inner.settings, "Circuit breaker settings changed");
    }

    pub fn stats(&self) -> CallStats {
        CallStats {
            success: self.counters.success.load(Ordering::Relaxed),
            failure: self.counters.failure.load(Ordering::Relaxed),
            fast_fail: self.counters.fast_fail.load(Ordering::Relaxed),
        }
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state.state_type(),
            pending_count: inner.state.pending_count(),
            success_count: inner.state.success_count(),
            failure_count: inner.state.failure_count(),
            totals: self.stats(),
        }
    }

    /// Run `call` if the breaker admits it.
    ///
    /// `call` reports its own result plus whether the outcome should count as
    /// overloaded. When the breaker rejects, `call` is not invoked and
    /// [`BreakerError::Open`] is returned. If `call` panics, a failure is
    /// recorded and the panic continues to unwind.
    pub fn execute<T, E, F>(&self, call: F) -> BreakerResult<T, E>
    where
        F: FnOnce() -> (Result<T, E>, Overloading),
    {
        let Some(guard) = self.admit() else {
            return Err(BreakerError::Open);
        };
        let (result, overloading) = call();
        guard.finish(overloading);
        result.map_err(BreakerError::Call)
    }

    /// Async form of [`execute`](Self::execute).
    ///
    /// Dropping the returned future after admission but before `call`'s future
    /// completes records a failure.
    pub async fn execute_async<T, E, F, Fut>(&self, call: F) -> BreakerResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = (Result<T, E>, Overloading)>,
    {
        let Some(guard) = self.admit() else {
            return Err(BreakerError::Open);
        };
        let (result, overloading) = call().await;
        guard.finish(overloading);
        result.map_err(BreakerError::Call)
    }

    /// Evaluate a request. Returns a guard for the admitting sojourn, or
    /// `None` after counting a fast-fail.
    fn admit(&self) -> Option<OutcomeGuard<'_, C>> {
        let admission = {
            let mut inner = self.lock();
            let Inner { settings, state } = &mut *inner;
            match state.on_request(self.clock.now(), settings, &self.name) {
                Admission::Admit => Some(state.sojourn()),
                Admission::Reject => None,
            }
        };

        match admission {
            Some(sojourn) => Some(OutcomeGuard {
                breaker: self,
                sojourn,
                finished: false,
            }),
            None => {
                self.count(BreakerEvent::FastFail);
                None
            }
        }
    }

    fn on_result(&self, sojourn: u64, overloading: Overloading) {
        {
            let mut inner = self.lock();
            if inner.state.sojourn() == sojourn {
                inner.state.on_result(overloading);
            }
            // Otherwise the state moved on and the outcome belongs to a closed sojourn.
        }

        match overloading {
            Overloading::No => self.count(BreakerEvent::Success),
            Overloading::Yes => self.count(BreakerEvent::Failure),
        }
    }

    fn count(&self, event: BreakerEvent) {
        let counter = match event {
            BreakerEvent::Success => &self.counters.success,
            BreakerEvent::Failure => &self.counters.failure,
            BreakerEvent::FastFail => &self.counters.fast_fail,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.metrics.record(event);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The only caller code run under the lock is the `change_settings` mutator,
        // which edits a copy of plain-data `Settings`; a poisoned lock still holds
        // a consistent state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("inner", &self.inner)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

/// Records the outcome of an admitted call exactly once.
///
/// Dropped without [`finish`](Self::finish) means the call unwound or its
/// future was cancelled; that counts as overloaded.
struct OutcomeGuard<'a, C: Clock> {
    breaker: &'a CircuitBreaker<C>,
    sojourn: u64,
    finished: bool,
}

impl<C: Clock> OutcomeGuard<'_, C> {
    fn finish(mut self, overloading: Overloading) {
        self.finished = true;
        self.breaker.on_result(self.sojourn, overloading);
    }
}

impl<C: Clock> Drop for OutcomeGuard<'_, C> {
    fn drop(&mut self) {
        if !self.finished {
            self.breaker.on_result(self.sojourn, Overloading::Yes);
        }
    }
}
