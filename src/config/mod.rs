//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CircuitConfig (validated)
//!     → settings_for(name) → Settings owned by each breaker
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → registry applies resolved Settings to every breaker under its lock
//! ```
//!
//! # Design Decisions
//! - Settings are live: a change affects the next evaluation, even mid-sojourn
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod settings;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{CircuitConfig, ObservabilityConfig, SettingsConfig, SettingsOverride};
pub use settings::Settings;
