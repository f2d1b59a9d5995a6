//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! CircuitBreaker
//!     → state transitions  → logging.rs (tracing events with name + settings)
//!     → per-call outcome   → metrics.rs (success / failure / fast_fail counters)
//!
//! Consumers:
//!     → any tracing subscriber (init_logging installs a fmt one)
//!     → Prometheus scrape (init_metrics installs the exporter)
//! ```
//!
//! # Design Decisions
//! - Metrics go through an injected sink, never a global per-breaker static
//! - Transition logs carry the live settings for diagnosis

pub mod logging;
pub mod metrics;
