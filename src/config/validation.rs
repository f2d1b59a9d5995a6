//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges for defaults and every per-breaker section
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Only files are validated; settings changed in code are trusted
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::CircuitConfig;
use crate::config::settings::Settings;

/// A single semantic problem in a configuration file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{scope}: error_rate_threshold_pct must be at most 100, got {value}")]
    ThresholdOutOfRange { scope: String, value: u32 },

    #[error("{scope}: error_rate_window_secs must be greater than 0")]
    ZeroWindow { scope: String },

    #[error("{scope}: cool_down_interval_secs must be greater than 0")]
    ZeroCoolDown { scope: String },

    #[error("{scope}: half_open_success_count must be at least 1")]
    ZeroHalfOpenSuccessCount { scope: String },

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Check a parsed configuration.
pub fn validate_config(config: &CircuitConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_settings("defaults", &Settings::from(config.defaults.clone()), &mut errors);
    for name in config.breakers.keys() {
        let scope = format!("breakers.{name}");
        validate_settings(&scope, &config.settings_for(name), &mut errors);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_settings(scope: &str, settings: &Settings, errors: &mut Vec<ValidationError>) {
    let scope = scope.to_string();
    if settings.error_rate_threshold_pct > 100 {
        errors.push(ValidationError::ThresholdOutOfRange {
            scope: scope.clone(),
            value: settings.error_rate_threshold_pct,
        });
    }
    if settings.error_rate_window.is_zero() {
        errors.push(ValidationError::ZeroWindow { scope: scope.clone() });
    }
    if settings.cool_down_interval.is_zero() {
        errors.push(ValidationError::ZeroCoolDown { scope: scope.clone() });
    }
    if settings.half_open_success_count == 0 {
        errors.push(ValidationError::ZeroHalfOpenSuccessCount { scope });
    }
}
