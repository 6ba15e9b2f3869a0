//! Configuration Loader
//!
//! Environment-aware configuration loading. Sources are layered in order, later
//! sources overriding earlier ones:
//!
//! 1. Built-in defaults (`RuntimeConfig::default()`)
//! 2. `{config_dir}/effector.toml` (optional)
//! 3. `{config_dir}/effector.{environment}.toml` (optional)
//! 4. `EFFECTOR__SECTION__KEY` environment variables

use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::ConfigResult;
use super::RuntimeConfig;
use crate::constants::env as env_keys;

const BASE_FILE_STEM: &str = "effector";

/// Loaded configuration together with where it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: RuntimeConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    ///
    /// Useful in tests that must not depend on process-wide environment state.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = %environment,
            config_directory = %config_directory.display(),
            "Loading effector configuration"
        );

        let base = config_directory.join(format!("{BASE_FILE_STEM}.toml"));
        let overlay = config_directory.join(format!("{BASE_FILE_STEM}.{environment}.toml"));

        let config = Self::build(&[base.as_path(), overlay.as_path()])?;

        info!(
            environment = %environment,
            capacity = config.mailbox.capacity,
            enable_prioritization = config.mailbox.enable_prioritization,
            priority_capacity = config.mailbox.priority_capacity,
            backpressure_timeout_ms = config.mailbox.backpressure_timeout_ms,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Load a single explicit file (required) plus environment overrides
    pub fn load_file(path: impl AsRef<Path>) -> ConfigResult<RuntimeConfig> {
        let path = path.as_ref();
        let config = Config::builder()
            .add_source(File::from(path).required(true))
            .add_source(Self::environment_source())
            .build()?
            .try_deserialize::<RuntimeConfig>()?;
        config.validate()?;
        Ok(config)
    }

    fn build(files: &[&Path]) -> ConfigResult<RuntimeConfig> {
        let mut builder = Config::builder();
        for file in files {
            builder = builder.add_source(File::from(*file).required(false));
        }

        let config = builder
            .add_source(Self::environment_source())
            .build()?
            .try_deserialize::<RuntimeConfig>()?;

        config.validate()?;
        Ok(config)
    }

    fn environment_source() -> Environment {
        Environment::with_prefix(env_keys::CONFIG_PREFIX)
            .prefix_separator(env_keys::CONFIG_SEPARATOR)
            .separator(env_keys::CONFIG_SEPARATOR)
            .try_parsing(true)
    }

    /// Detect the deployment environment from `EFFECTOR_ENV`
    pub fn detect_environment() -> String {
        env::var(env_keys::ENVIRONMENT)
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn default_config_directory() -> PathBuf {
        env::var(env_keys::CONFIG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }
}
