//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber for binaries embedding the breaker
//! - Honor `RUST_LOG` over the configured level
//!
//! Library code only emits events; installing a subscriber is left to the
//! application.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install a global fmt subscriber filtered by `RUST_LOG` or `config.log_level`.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
