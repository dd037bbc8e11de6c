//! # Service Bus Configuration
//!
//! Typed configuration for the work buses and the host service.
//!
//! ## Sources
//!
//! Values are layered, later sources winning:
//!
//! 1. Built-in defaults (`#[serde(default)]` on every struct)
//! 2. `config/service.{toml,yaml,json}` relative to the working directory, if present
//! 3. The file named by `SERVICE_BUS_CONFIG`, or passed to [`ConfigLoader::with_file`]
//! 4. Environment variables prefixed `SERVICE_BUS__`, nested with `__`
//!    (`SERVICE_BUS__EVENT_BUS__MAX_CONCURRENT_HANDLERS=8`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use service_bus::config::ServiceConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::load()?;
//! let limit = config.event_bus.max_concurrent_handlers;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::defaults;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Root configuration for the host service
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Human-readable service name, used in logs
    pub name: String,

    /// Deployment environment (development, test, production)
    pub environment: String,

    /// Verbose diagnostics
    pub debug: bool,

    /// Engine behind the event bus
    pub event_bus: BusConfig,

    /// Engine behind the mail bus
    pub mail_bus: BusConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: defaults::SERVICE_NAME.to_string(),
            environment: defaults::ENVIRONMENT.to_string(),
            debug: false,
            event_bus: BusConfig::default(),
            mail_bus: BusConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from the default file locations and the process environment
    pub fn load() -> ConfigResult<Self> {
        ConfigLoader::from_process_env().load()
    }

    /// Validate every section
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "name",
                &self.name,
                "service name must not be blank",
            ));
        }
        self.event_bus.validate("event_bus")?;
        self.mail_bus.validate("mail_bus")?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Configuration for one dispatch engine
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// Publishers that may line up for a pump; `publish` still returns only once a
    /// pump accepts the item
    pub pipeline_buffer_size: usize,

    /// Capacity of the outbound result stream
    pub results_buffer_size: usize,

    /// Upper bound on concurrently executing handlers; 0 disables the bound
    pub max_concurrent_handlers: usize,

    /// Per-invocation time budget; unset means handlers may run indefinitely
    pub handler_timeout_ms: Option<u64>,

    /// Convert handler panics into failed results instead of propagating them
    pub catch_handler_panics: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            pipeline_buffer_size: defaults::PIPELINE_BUFFER_SIZE,
            results_buffer_size: defaults::RESULTS_BUFFER_SIZE,
            max_concurrent_handlers: defaults::MAX_CONCURRENT_HANDLERS,
            handler_timeout_ms: None,
            catch_handler_panics: defaults::CATCH_HANDLER_PANICS,
        }
    }
}

impl BusConfig {
    pub fn with_max_concurrent_handlers(mut self, limit: usize) -> Self {
        self.max_concurrent_handlers = limit;
        self
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_results_buffer_size(mut self, size: usize) -> Self {
        self.results_buffer_size = size;
        self
    }

    pub fn with_pipeline_buffer_size(mut self, size: usize) -> Self {
        self.pipeline_buffer_size = size;
        self
    }

    pub fn with_catch_handler_panics(mut self, catch: bool) -> Self {
        self.catch_handler_panics = catch;
        self
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout_ms.map(Duration::from_millis)
    }

    /// Whether handler execution is bounded by a semaphore
    pub fn is_bounded(&self) -> bool {
        self.max_concurrent_handlers > 0
    }

    /// Validate this section; `section` prefixes field names in errors
    pub fn validate(&self, section: &str) -> ConfigResult<()> {
        if self.pipeline_buffer_size == 0 {
            return Err(ConfigurationError::invalid_value(
                format!("{section}.pipeline_buffer_size"),
                self.pipeline_buffer_size,
                "channel capacity must be at least 1",
            ));
        }
        if self.results_buffer_size == 0 {
            return Err(ConfigurationError::invalid_value(
                format!("{section}.results_buffer_size"),
                self.results_buffer_size,
                "channel capacity must be at least 1",
            ));
        }
        if self.handler_timeout_ms == Some(0) {
            return Err(ConfigurationError::invalid_value(
                format!("{section}.handler_timeout_ms"),
                0,
                "timeout must be positive; leave it unset to disable",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BusConfig::default();
        assert_eq!(config.pipeline_buffer_size, 1);
        assert_eq!(config.results_buffer_size, 1);
        assert_eq!(config.max_concurrent_handlers, 0);
        assert!(!config.is_bounded());
        assert!(config.handler_timeout().is_none());
        assert!(config.catch_handler_panics);
        assert!(ServiceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = BusConfig::default().with_results_buffer_size(0);
        let err = config.validate("event_bus").unwrap_err();
        assert!(err.to_string().contains("event_bus.results_buffer_size"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = BusConfig::default().with_handler_timeout(Duration::ZERO);
        assert!(config.validate("mail_bus").is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        let config = ServiceConfig {
            name: "  ".to_string(),
            ..ServiceConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_builder_helpers() {
        let config = BusConfig::default()
            .with_max_concurrent_handlers(4)
            .with_handler_timeout(Duration::from_millis(1500))
            .with_catch_handler_panics(false);
        assert!(config.is_bounded());
        assert_eq!(config.handler_timeout_ms, Some(1500));
        assert!(!config.catch_handler_panics);
    }
}
