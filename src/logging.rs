//! # Tracing Module
//!
//! Environment-aware console logging using the tracing ecosystem.
//!
//! - `RUST_LOG` wins when set
//! - otherwise `LoggingConfig::level`, then a level derived from `EFFECTOR_ENV`
//! - TTY-aware ANSI output, optional JSON lines
//!
//! Initialization is idempotent and tolerates a subscriber installed by the
//! embedding application.

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::constants::env as env_keys;

static TRACING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize tracing with default settings
pub fn init_tracing() {
    init_tracing_with(&LoggingConfig::default());
}

/// Initialize tracing from a [`LoggingConfig`]
pub fn init_tracing_with(config: &LoggingConfig) {
    TRACING_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = build_filter(config, &environment);
        let use_ansi = std::io::stdout().is_terminal();

        let console_layer = if config.json {
            fmt::layer()
                .json()
                .with_target(config.with_target)
                .with_thread_ids(true)
                .with_level(true)
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(config.with_target)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(use_ansi)
                .with_filter(filter)
                .boxed()
        };

        if tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        } else {
            tracing::info!(
                environment = %environment,
                ansi_colors = use_ansi,
                json = config.json,
                "Console logging initialized"
            );
        }
    });
}

fn build_filter(config: &LoggingConfig, environment: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config
            .level
            .clone()
            .unwrap_or_else(|| get_log_level(environment).to_string());
        EnvFilter::new(level)
    })
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var(env_keys::ENVIRONMENT)
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        "test" => "warn",
        _ => "debug",
    }
}
