//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a dependency:
//!     → registry.rs (one breaker per dependency name)
//!     → circuit_breaker.rs (admit or fail fast, record outcome)
//!     → state.rs (closed / open / half-open transitions)
//!     → clock.rs (deadline checks, evaluated lazily per request)
//! ```
//!
//! # Design Decisions
//! - The breaker never retries, sleeps or times out calls; callers own that
//! - Callers classify each outcome as overloaded or not
//! - Breaker state is never persisted or shared across processes

pub mod circuit_breaker;
pub mod clock;
pub mod error;
pub mod registry;
pub mod state;

pub use circuit_breaker::{BreakerSnapshot, CallStats, CircuitBreaker};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BreakerError, BreakerResult};
pub use registry::BreakerRegistry;
pub use state::{Overloading, StateType};
