//! Client-side circuit breaker.
//!
//! Wraps calls to a remote dependency and fails fast while that dependency
//! is overloaded. See [`CircuitBreaker`] for the entry point.

pub mod config;
pub mod observability;
pub mod resilience;

pub use config::{CircuitConfig, Settings};
pub use resilience::{
    BreakerError, BreakerRegistry, BreakerResult, BreakerSnapshot, CallStats, CircuitBreaker,
    Overloading, StateType,
};
