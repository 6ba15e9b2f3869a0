//! Error types for the effector runtime.
//!
//! Registry-level failures (`NotFound`, `Duplicate`) are returned from the call
//! that detected them. Enqueue-time failures surface as [`SendError`]. Reducer
//! failures never leave the processing loop; they are counted in the actor's
//! metrics instead.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigurationError;
use crate::messaging::EffectorId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectorError {
    #[error("Effector not found: {id}")]
    NotFound { id: EffectorId },
    #[error("Effector already exists: {id}")]
    Duplicate { id: EffectorId },
    #[error(transparent)]
    Send(#[from] SendError),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl EffectorError {
    pub fn not_found(id: &EffectorId) -> Self {
        EffectorError::NotFound { id: id.clone() }
    }

    pub fn duplicate(id: &EffectorId) -> Self {
        EffectorError::Duplicate { id: id.clone() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EffectorError::NotFound { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, EffectorError::Duplicate { .. })
    }

    pub fn is_send_error(&self) -> bool {
        matches!(self, EffectorError::Send(_))
    }
}

impl From<ConfigurationError> for EffectorError {
    fn from(error: ConfigurationError) -> Self {
        EffectorError::Configuration(error.to_string())
    }
}

/// Failure to place a record into an actor's mailbox
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The mailbox stayed full for the whole backpressure window
    #[error("Mailbox for {id} is full: backpressure timeout of {timeout:?} elapsed")]
    Backpressure { id: EffectorId, timeout: Duration },
    /// The mailbox was closed because the actor terminated
    #[error("Cannot send to terminated effector {id}")]
    Terminated { id: EffectorId },
}

impl SendError {
    pub fn is_backpressure(&self) -> bool {
        matches!(self, SendError::Backpressure { .. })
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, SendError::Terminated { .. })
    }
}

/// Failure raised by a reducer while handling a record
///
/// Only ever observed inside the processing loop and in logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Reducer failed: {message}")]
pub struct ReducerError {
    pub message: String,
}

impl ReducerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ReducerError {
    fn from(error: serde_json::Error) -> Self {
        ReducerError::new(format!("JSON serialization error: {error}"))
    }
}

pub type EffectorResult<T> = std::result::Result<T, EffectorError>;
pub type ReducerResult<T> = std::result::Result<T, ReducerError>;
