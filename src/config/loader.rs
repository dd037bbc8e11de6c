//! Configuration Loader
//!
//! Environment-aware configuration loading. Discovers the base and
//! per-environment files in the configuration directory, layers an explicit file
//! and `SERVICE_BUS__*` environment variables on top, then validates the result.

use config::{Config, Environment, File};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::{ConfigResult, ConfigurationError};
use super::ServiceConfig;
use crate::constants::{defaults, env as env_keys};

/// Base name of the configuration files inside the configuration directory
const BASE_FILE_STEM: &str = "service";

/// Builder for one configuration load
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_directory: PathBuf,
    file: Option<PathBuf>,
    environment: String,
    env_vars: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// A hermetic loader: `./config`, development environment, no environment
    /// variables. Useful for testing without touching the process environment.
    pub fn new() -> Self {
        Self {
            config_directory: PathBuf::from("config"),
            file: None,
            environment: defaults::ENVIRONMENT.to_string(),
            env_vars: Some(HashMap::new()),
        }
    }

    /// A loader reading the process environment for the environment name, the
    /// explicit file and overrides
    pub fn from_process_env() -> Self {
        Self {
            config_directory: PathBuf::from("config"),
            file: env::var(env_keys::CONFIG_FILE).ok().map(PathBuf::from),
            environment: detect_environment(),
            env_vars: None,
        }
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config_directory = directory.into();
        self
    }

    /// Explicit file layered over the directory files; it must exist
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into().to_lowercase();
        self
    }

    /// Use `vars` in place of the process environment for overrides
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env_vars = Some(vars);
        self
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Build, deserialize and validate the configuration
    pub fn load(&self) -> ConfigResult<ServiceConfig> {
        debug!(
            environment = %self.environment,
            config_directory = %self.config_directory.display(),
            "Loading service configuration"
        );

        let mut builder = Config::builder()
            .set_default("environment", self.environment.clone())?
            .add_source(File::from(self.config_directory.join(BASE_FILE_STEM)).required(false))
            .add_source(
                File::from(
                    self.config_directory
                        .join(format!("{BASE_FILE_STEM}.{}", self.environment)),
                )
                .required(false),
            );

        if let Some(path) = &self.file {
            if !path.is_file() {
                return Err(ConfigurationError::file_not_found(
                    path.display().to_string(),
                ));
            }
            if !is_supported_file(path) {
                return Err(ConfigurationError::invalid_value(
                    env_keys::CONFIG_FILE,
                    path.display(),
                    "expected a .toml, .yaml, .yml or .json file",
                ));
            }
            builder = builder.add_source(File::from(path.as_path()));
        }

        builder = builder.add_source(
            Environment::with_prefix(env_keys::CONFIG_PREFIX)
                .separator(env_keys::CONFIG_SEPARATOR)
                .try_parsing(true)
                .source(self.env_vars.clone()),
        );

        let config: ServiceConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            "Configuration loaded: {}",
            serde_json::to_string_pretty(&config)
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );
        info!(
            service = %config.name,
            environment = %config.environment,
            event_bus_limit = config.event_bus.max_concurrent_handlers,
            mail_bus_limit = config.mail_bus.max_concurrent_handlers,
            "Configuration loaded successfully"
        );

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Detect the deployment environment: `SERVICE_ENV || APP_ENV || development`
pub fn detect_environment() -> String {
    env::var(env_keys::SERVICE_ENV)
        .or_else(|_| env::var(env_keys::APP_ENV))
        .unwrap_or_else(|_| defaults::ENVIRONMENT.to_string())
        .to_lowercase()
}

/// Whether `path` looks like a file the loader can read
pub fn is_supported_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("toml" | "yaml" | "yml" | "json")
    )
}
