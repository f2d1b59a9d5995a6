//! Named breakers shared across a process.
//!
//! # Responsibilities
//! - Hand out one breaker per dependency name
//! - Re-apply settings to every registered breaker after a config reload

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::{CircuitConfig, Settings};
use crate::resilience::circuit_breaker::{BreakerSnapshot, CircuitBreaker};

/// A thread-safe map of breaker name to breaker.
#[derive(Debug, Clone, Default)]
pub struct BreakerRegistry {
    breakers: Arc<DashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the breaker registered under `name`, creating it with
    /// `settings` if absent. `settings` is ignored for an existing breaker.
    pub fn get_or_create(&self, name: &str, settings: Settings) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::info!(breaker = %name, settings = ?settings, "Registering circuit breaker");
                Arc::new(CircuitBreaker::new(name, settings))
            })
            .value()
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|r| r.value().clone())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.breakers.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Snapshots of every breaker, sorted by name.
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let mut snapshots: Vec<BreakerSnapshot> =
            self.breakers.iter().map(|r| r.value().snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    /// Overwrite each registered breaker's settings with those resolved from
    /// `config`. Returns how many breakers were updated.
    pub fn apply_config(&self, config: &CircuitConfig) -> usize {
        let mut updated = 0;
        for entry in self.breakers.iter() {
            let resolved = config.settings_for(entry.key());
            entry.value().change_settings(|settings| *settings = resolved);
            updated += 1;
        }
        tracing::info!(updated, "Applied circuit breaker configuration");
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_get_or_create_returns_same_breaker() {
        let registry = BreakerRegistry::new();
        let a = registry.get_or_create("pd", Settings::default());
        let b = registry.get_or_create(
            "pd",
            Settings {
                error_rate_threshold_pct: 1,
                ..Settings::default()
            },
        );

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.settings(), Settings::default());
        assert!(registry.get("tikv").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_apply_config_resolves_overrides() {
        let registry = BreakerRegistry::new();
        registry.get_or_create("pd", Settings::default());
        registry.get_or_create("tikv", Settings::default());

        let config: CircuitConfig = toml::from_str(
            r#"
            [defaults]
            cool_down_interval_secs = 20

            [breakers.tikv]
            error_rate_threshold_pct = 30
            "#,
        )
        .unwrap();

        assert_eq!(registry.apply_config(&config), 2);

        let pd = registry.get("pd").unwrap().settings();
        assert_eq!(pd.cool_down_interval, Duration::from_secs(20));
        assert_eq!(pd.error_rate_threshold_pct, 50);

        let tikv = registry.get("tikv").unwrap().settings();
        assert_eq!(tikv.cool_down_interval, Duration::from_secs(20));
        assert_eq!(tikv.error_rate_threshold_pct, 30);

        assert_eq!(registry.names(), vec!["pd".to_string(), "tikv".to_string()]);
        assert_eq!(registry.snapshots().len(), 2);
    }
}
