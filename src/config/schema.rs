//! Configuration schema definitions.
//!
//! This module defines the configuration file structure. All types derive
//! Serde traits for deserialization from TOML; every field has a default so
//! an empty file is a valid configuration.
//!
//! ```toml
//! [observability]
//! log_level = "info"
//!
//! [defaults]
//! error_rate_threshold_pct = 50
//! error_rate_window_secs = 30
//!
//! [breakers.tso-client]
//! cool_down_interval_secs = 5
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::settings::Settings;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct CircuitConfig {
    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Settings applied to every breaker without its own section.
    pub defaults: SettingsConfig,

    /// Per-breaker overrides keyed by breaker name.
    pub breakers: BTreeMap<String, SettingsOverride>,
}

impl CircuitConfig {
    /// Effective settings for the breaker called `name`: defaults with that
    /// breaker's overrides layered on top.
    pub fn settings_for(&self, name: &str) -> Settings {
        let mut resolved = self.defaults.clone();
        if let Some(overrides) = self.breakers.get(name) {
            overrides.apply(&mut resolved);
        }
        resolved.into()
    }
}

/// Breaker settings as written in a config file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct SettingsConfig {
    /// Error percentage (0-100) that trips the breaker. 0 disables tripping.
    pub error_rate_threshold_pct: u32,

    /// Average QPS over the window required before evaluating the error rate.
    pub min_qps_for_open: u32,

    /// Error-rate evaluation window in seconds.
    pub error_rate_window_secs: u64,

    /// Time spent open before probing, in seconds.
    pub cool_down_interval_secs: u64,

    /// Successful probes needed to close from half-open.
    pub half_open_success_count: u32,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            error_rate_threshold_pct: settings.error_rate_threshold_pct,
            min_qps_for_open: settings.min_qps_for_open,
            error_rate_window_secs: settings.error_rate_window.as_secs(),
            cool_down_interval_secs: settings.cool_down_interval.as_secs(),
            half_open_success_count: settings.half_open_success_count,
        }
    }
}

impl From<SettingsConfig> for Settings {
    fn from(config: SettingsConfig) -> Self {
        Self {
            error_rate_threshold_pct: config.error_rate_threshold_pct,
            min_qps_for_open: config.min_qps_for_open,
            error_rate_window: Duration::from_secs(config.error_rate_window_secs),
            cool_down_interval: Duration::from_secs(config.cool_down_interval_secs),
            half_open_success_count: config.half_open_success_count,
        }
    }
}

/// Partial settings for a single breaker. Unset fields fall back to `[defaults]`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SettingsOverride {
    pub error_rate_threshold_pct: Option<u32>,
    pub min_qps_for_open: Option<u32>,
    pub error_rate_window_secs: Option<u64>,
    pub cool_down_interval_secs: Option<u64>,
    pub half_open_success_count: Option<u32>,
}

impl SettingsOverride {
    fn apply(&self, base: &mut SettingsConfig) {
        if let Some(v) = self.error_rate_threshold_pct {
            base.error_rate_threshold_pct = v;
        }
        if let Some(v) = self.min_qps_for_open {
            base.min_qps_for_open = v;
        }
        if let Some(v) = self.error_rate_window_secs {
            base.error_rate_window_secs = v;
        }
        if let Some(v) = self.cool_down_interval_secs {
            base.cool_down_interval_secs = v;
        }
        if let Some(v) = self.half_open_success_count {
            base.half_open_success_count = v;
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
