//! # Effector Runtime
//!
//! Per-entity actors that serialize all mutation of their private state
//! through a single processing loop.
//!
//! ## Components
//!
//! - `mailbox` - bounded, priority-aware queue with backpressure (crate-internal)
//! - [`EffectorInstance`] - mailbox + state cell + reducer + processing task
//! - [`EffectorService`] - registry and lifecycle owner
//! - [`Effector`] - cloneable caller handle
//! - [`Subscription`] - live fan-out feed of accepted records
//!
//! ## Example
//!
//! ```rust,no_run
//! use effector::{reducer_fn, AgentRecord, EffectorService, MailboxConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = EffectorService::<i64>::new();
//! let counter = service.create(
//!     "counter",
//!     0,
//!     reducer_fn(|record: &AgentRecord, count: &i64| {
//!         Ok(match record.command_type() {
//!             Some("INCREMENT") => count + 1,
//!             _ => *count,
//!         })
//!     }),
//!     MailboxConfig::default(),
//! )?;
//!
//! let mut feed = counter.subscribe();
//! counter.send(AgentRecord::typed_command("counter", "INCREMENT")).await?;
//! let accepted = feed.recv().await;
//! service.terminate("counter").await?;
//! # let _ = accepted;
//! # Ok(())
//! # }
//! ```

pub mod handle;
pub mod instance;
pub(crate) mod mailbox;
pub mod reducer;
pub mod service;
pub mod state;
pub mod subscription;

pub use handle::Effector;
pub use instance::EffectorInstance;
pub use reducer::{reducer_fn, FnReducer, IdentityReducer, Reducer};
pub use service::EffectorService;
pub use state::{ActorState, EffectorState, EffectorStatus, ProcessingMetrics};
pub use subscription::Subscription;
