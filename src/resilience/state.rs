//! Circuit breaker state machine.
//!
//! # States
//! - Closed: requests pass through, outcomes accumulate for one error-rate window
//! - Open: requests fail fast until the cooldown ends
//! - Half-Open: a bounded number of probes decide whether to close again
//!
//! # State Transitions
//! ```text
//! Closed → Open:      window over, enough requests, error rate >= threshold
//! Closed → Closed:    window over otherwise (fresh window, counters reset)
//! Open → Half-Open:   first request after cooldown (that request is the first probe)
//! Half-Open → Open:   any probe failed
//! Half-Open → Closed: half_open_success_count probes succeeded
//! ```
//!
//! Transitions only happen when a request is evaluated; nothing runs in the
//! background. Every transition produces a fresh [`State`] with a new sojourn
//! id and zeroed counters.

use std::fmt;
use std::time::Instant;

use serde::Serialize;

use crate::config::Settings;

/// Which of the three states a sojourn belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StateType {
    Closed,
    Open,
    HalfOpen,
}

impl StateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateType::Closed => "closed",
            StateType::Open => "open",
            StateType::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller's classification of a completed call.
///
/// Independent of whether the call returned an error: an empty but
/// well-formed answer is `No`, a timeout against a saturated store is `Yes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overloading {
    No,
    Yes,
}

impl From<bool> for Overloading {
    fn from(overloaded: bool) -> Self {
        if overloaded {
            Overloading::Yes
        } else {
            Overloading::No
        }
    }
}

/// Result of evaluating one request against the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Admit,
    Reject,
}

/// One sojourn in one state.
#[derive(Debug, Clone)]
pub(crate) struct State {
    sojourn: u64,
    state_type: StateType,
    /// Window end (Closed) or cooldown end (Open). `None` never elapses.
    end: Option<Instant>,
    pending_count: u32,
    success_count: u32,
    failure_count: u32,
}

impl State {
    pub(crate) fn new(sojourn: u64, state_type: StateType, now: Instant, settings: &Settings) -> Self {
        let (end, pending_count) = match state_type {
            StateType::Closed => (now.checked_add(settings.error_rate_window), 0),
            StateType::Open => (now.checked_add(settings.cool_down_interval), 0),
            // Entered on the first request after cooldown, which is itself a probe.
            StateType::HalfOpen => (None, 1),
        };

        Self {
            sojourn,
            state_type,
            end,
            pending_count,
            success_count: 0,
            failure_count: 0,
        }
    }

    pub(crate) fn sojourn(&self) -> u64 {
        self.sojourn
    }

    pub(crate) fn state_type(&self) -> StateType {
        self.state_type
    }

    pub(crate) fn pending_count(&self) -> u32 {
        self.pending_count
    }

    pub(crate) fn success_count(&self) -> u32 {
        self.success_count
    }

    pub(crate) fn failure_count(&self) -> u32 {
        self.failure_count
    }

    fn total(&self) -> u64 {
        u64::from(self.success_count) + u64::from(self.failure_count)
    }

    /// Failure percentage of this sojourn, truncated. 0 when nothing was observed.
    pub(crate) fn observed_error_rate_pct(&self) -> u32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        // failure_count <= total, so the quotient is at most 100.
        (u64::from(self.failure_count) * 100 / total) as u32
    }

    fn elapsed(&self, now: Instant) -> bool {
        matches!(self.end, Some(end) if now >= end)
    }

    fn should_trip(&self, settings: &Settings, observed_error_rate_pct: u32) -> bool {
        settings.error_rate_threshold_pct > 0
            && self.total() >= settings.min_requests_for_open()
            && observed_error_rate_pct >= settings.error_rate_threshold_pct
    }

    fn move_to(&mut self, state_type: StateType, now: Instant, settings: &Settings) {
        *self = State::new(self.sojourn + 1, state_type, now, settings);
    }

    /// Decide whether to admit a request arriving at `now`, transitioning first
    /// if the current sojourn is over.
    ///
    /// Must be called under the owning breaker's lock.
    pub(crate) fn on_request(&mut self, now: Instant, settings: &Settings, breaker: &str) -> Admission {
        match self.state_type {
            StateType::Closed => {
                if !self.elapsed(now) {
                    return Admission::Admit;
                }

                let observed_error_rate_pct = self.observed_error_rate_pct();
                if self.should_trip(settings, observed_error_rate_pct) {
                    tracing::error!(
                        breaker,
                        observed_error_rate_pct,
                        requests = self.total(),
                        settings = ?settings,
                        "Circuit breaker tripped. Starting to fail all requests"
                    );
                    self.move_to(StateType::Open, now, settings);
                    Admission::Reject
                } else {
                    self.move_to(StateType::Closed, now, settings);
                    Admission::Admit
                }
            }
            StateType::Open => {
                if !self.elapsed(now) {
                    return Admission::Reject;
                }

                tracing::info!(
                    breaker,
                    settings = ?settings,
                    "Circuit breaker cooldown is over. Transitioning to half-open to probe the dependency"
                );
                self.move_to(StateType::HalfOpen, now, settings);
                Admission::Admit
            }
            StateType::HalfOpen => {
                if self.failure_count > 0 {
                    tracing::error!(
                        breaker,
                        settings = ?settings,
                        "Circuit breaker probe failed. Going from half-open back to open"
                    );
                    self.move_to(StateType::Open, now, settings);
                    Admission::Reject
                } else if self.success_count >= settings.half_open_success_count {
                    // `>=` so that lowering the count at runtime cannot strand the breaker here.
                    tracing::info!(
                        breaker,
                        settings = ?settings,
                        "Circuit breaker is closed. Allowing all requests"
                    );
                    self.move_to(StateType::Closed, now, settings);
                    Admission::Admit
                } else if self.pending_count < settings.half_open_success_count {
                    self.pending_count += 1;
                    Admission::Admit
                } else {
                    // Probe budget spent, waiting on outstanding outcomes.
                    Admission::Reject
                }
            }
        }
    }

    /// Count one outcome against this sojourn.
    pub(crate) fn on_result(&mut self, overloading: Overloading) {
        match overloading {
            Overloading::No => self.success_count = self.success_count.saturating_add(1),
            Overloading::Yes => self.failure_count = self.failure_count.saturating_add(1),
        }
    }
}
