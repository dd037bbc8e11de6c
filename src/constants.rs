//! # System Constants
//!
//! Reserved work types, configuration defaults and environment keys that define
//! the operational boundaries of the work bus.

/// Reserved work type values
pub mod work_types {
    /// Wildcard registration key matching every published work item.
    ///
    /// Valid as a registration key; published items should carry a concrete type.
    pub const ALL: &str = "all";
}

/// Defaults applied when configuration does not override them
pub mod defaults {
    /// Publishers that may wait in line for a pump.
    pub const PIPELINE_BUFFER_SIZE: usize = 1;
    pub const RESULTS_BUFFER_SIZE: usize = 1;
    /// Zero means every handler invocation runs as soon as it is spawned.
    pub const MAX_CONCURRENT_HANDLERS: usize = 0;
    pub const CATCH_HANDLER_PANICS: bool = true;
    pub const SERVICE_NAME: &str = "service-bus";
    pub const ENVIRONMENT: &str = "development";
}

/// Environment variable names read by configuration and logging
pub mod env {
    /// Prefix for configuration overrides, e.g. `SERVICE_BUS__EVENT_BUS__MAX_CONCURRENT_HANDLERS`.
    pub const CONFIG_PREFIX: &str = "SERVICE_BUS";
    pub const CONFIG_SEPARATOR: &str = "__";
    /// Explicit configuration file path.
    pub const CONFIG_FILE: &str = "SERVICE_BUS_CONFIG";
    pub const SERVICE_ENV: &str = "SERVICE_ENV";
    pub const APP_ENV: &str = "APP_ENV";
}

/// Component names used in structured logs
pub mod components {
    pub const WORK_BUS: &str = "work_bus";
    pub const EVENT_BUS: &str = "event_bus";
    pub const MAIL_BUS: &str = "mail_bus";
    pub const REGISTRY: &str = "handler_registry";
}
