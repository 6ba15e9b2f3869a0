//! # Runtime Configuration
//!
//! Layered configuration for the effector runtime, loaded through the `config`
//! crate from built-in defaults, optional TOML files, and `EFFECTOR__`-prefixed
//! environment variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use effector::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let mailbox = &manager.config().mailbox;
//! println!("capacity={} timeout={:?}", mailbox.capacity, mailbox.backpressure_timeout());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::constants::mailbox as defaults;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring `config/effector.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Default mailbox settings for effectors created without explicit config
    pub mailbox: MailboxConfig,

    /// Tracing subscriber settings
    pub logging: LoggingConfig,
}

impl RuntimeConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        self.mailbox.validate()
    }
}

/// Per-effector mailbox configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// Maximum records waiting in the normal and low priority lanes
    pub capacity: usize,
    /// Route records into per-priority lanes drained highest-first
    pub enable_prioritization: bool,
    /// Maximum records waiting in the high priority lane
    pub priority_capacity: usize,
    /// How long `send` waits for space before failing with backpressure
    pub backpressure_timeout_ms: u64,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::DEFAULT_CAPACITY,
            enable_prioritization: defaults::DEFAULT_ENABLE_PRIORITIZATION,
            priority_capacity: defaults::DEFAULT_PRIORITY_CAPACITY,
            backpressure_timeout_ms: defaults::DEFAULT_BACKPRESSURE_TIMEOUT_MS,
        }
    }
}

impl MailboxConfig {
    /// Get backpressure timeout as Duration
    pub fn backpressure_timeout(&self) -> Duration {
        Duration::from_millis(self.backpressure_timeout_ms)
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_prioritization(mut self, priority_capacity: usize) -> Self {
        self.enable_prioritization = true;
        self.priority_capacity = priority_capacity;
        self
    }

    pub fn with_backpressure_timeout(mut self, timeout: Duration) -> Self {
        self.backpressure_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "mailbox.capacity",
                self.capacity,
                "capacity must be greater than 0",
            ));
        }

        if self.capacity > Semaphore::MAX_PERMITS {
            return Err(ConfigurationError::invalid_value(
                "mailbox.capacity",
                self.capacity,
                format!("capacity must not exceed {}", Semaphore::MAX_PERMITS),
            ));
        }

        if self.enable_prioritization && self.priority_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "mailbox.priority_capacity",
                self.priority_capacity,
                "priority capacity must be greater than 0 when prioritization is enabled",
            ));
        }

        if self.enable_prioritization && self.priority_capacity > Semaphore::MAX_PERMITS {
            return Err(ConfigurationError::invalid_value(
                "mailbox.priority_capacity",
                self.priority_capacity,
                format!("priority capacity must not exceed {}", Semaphore::MAX_PERMITS),
            ));
        }

        if self.backpressure_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "mailbox.backpressure_timeout_ms",
                self.backpressure_timeout_ms,
                "backpressure timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Tracing subscriber configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset; derived from the
    /// environment name when empty
    pub level: Option<String>,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Include the event target in output
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            json: false,
            with_target: true,
        }
    }
}
