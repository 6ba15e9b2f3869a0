//! # Runtime Constants
//!
//! Default operational boundaries for effector mailboxes and the command
//! vocabulary understood by the bundled example actors.

use std::time::Duration;

/// Mailbox defaults applied when no configuration is supplied
pub mod mailbox {
    use super::Duration;

    pub const DEFAULT_CAPACITY: usize = 100;
    pub const DEFAULT_PRIORITY_CAPACITY: usize = 10;
    pub const DEFAULT_ENABLE_PRIORITIZATION: bool = false;
    pub const DEFAULT_BACKPRESSURE_TIMEOUT_MS: u64 = 5000;

    pub const DEFAULT_BACKPRESSURE_TIMEOUT: Duration =
        Duration::from_millis(DEFAULT_BACKPRESSURE_TIMEOUT_MS);
}

/// Command type strings carried in `payload.type` of command records
pub mod commands {
    pub const INCREMENT: &str = "INCREMENT";
    pub const DECREMENT: &str = "DECREMENT";
    pub const RESET: &str = "RESET";
    pub const ADD: &str = "ADD";

    pub const DISPATCH: &str = "DISPATCH";
    pub const ACKNOWLEDGE: &str = "ACKNOWLEDGE";
}

/// Environment variable names read by configuration and logging
pub mod env {
    pub const ENVIRONMENT: &str = "EFFECTOR_ENV";
    pub const CONFIG_DIR: &str = "EFFECTOR_CONFIG_DIR";
    pub const CONFIG_PREFIX: &str = "EFFECTOR";
    pub const CONFIG_SEPARATOR: &str = "__";
}
