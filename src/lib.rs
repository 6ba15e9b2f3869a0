#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! # Effector Runtime
//!
//! Per-entity actor runtime: every effector owns a bounded, optionally
//! priority-aware mailbox, a private state cell mutated only by its own
//! processing loop through a user-supplied reducer, and a fan-out of live
//! subscriptions that observe every accepted record.
//!
//! ## Module Organization
//!
//! - [`messaging`] - `AgentRecord` envelope and construction helpers
//! - [`effector`] - mailbox, instance, processing loop, registry service
//! - [`actors`] - example Counter and Controller actors
//! - [`config`] - layered configuration loading
//! - [`logging`] - tracing subscriber initialization
//! - [`error`] - structured error types
//!
//! ## Guarantees
//!
//! - All state transitions of one effector are linearized by its single loop
//! - Records are processed in priority order, FIFO within a priority
//! - A full mailbox blocks senders up to the backpressure timeout
//! - Reducer failures are counted, never returned to senders
//! - At most one live effector per id; create/terminate races have one winner
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests
//! ```

pub mod actors;
pub mod config;
pub mod constants;
pub mod effector;
pub mod error;
pub mod logging;
pub mod messaging;

pub use config::{ConfigManager, LoggingConfig, MailboxConfig, RuntimeConfig};
pub use effector::{
    reducer_fn, ActorState, Effector, EffectorInstance, EffectorService, EffectorState,
    EffectorStatus, IdentityReducer, ProcessingMetrics, Reducer, Subscription,
};
pub use error::{EffectorError, EffectorResult, ReducerError, ReducerResult, SendError};
pub use messaging::{AgentRecord, EffectorId, Priority, RecordMetadata, RecordType};
