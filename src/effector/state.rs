//! Snapshot types returned by `get_state`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Bounds every reducer-owned state type must satisfy
///
/// `PartialEq` detects state changes, `Serialize` builds the payload of
/// synthesized `STATE_CHANGE` records.
pub trait ActorState: Clone + PartialEq + Serialize + Send + Sync + 'static {}

impl<T> ActorState for T where T: Clone + PartialEq + Serialize + Send + Sync + 'static {}

/// Lifecycle status of an effector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectorStatus {
    Idle,
    Running,
    Terminated,
}

impl fmt::Display for EffectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectorStatus::Idle => write!(f, "IDLE"),
            EffectorStatus::Running => write!(f, "RUNNING"),
            EffectorStatus::Terminated => write!(f, "TERMINATED"),
        }
    }
}

/// Running counters maintained by the processing loop
///
/// Counters only grow; they are reset solely by creating a new effector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    /// Records the reducer handled successfully
    pub processed: u64,
    /// Records the reducer rejected
    pub failures: u64,
    /// Mean reducer latency over all handled records
    pub avg_processing_time: Duration,
    /// Records waiting in the mailbox when the snapshot was taken
    pub mailbox_depth: usize,
}

impl ProcessingMetrics {
    pub(crate) fn record_success(&mut self, elapsed: Duration) {
        self.processed += 1;
        self.record_latency(elapsed);
    }

    pub(crate) fn record_failure(&mut self, elapsed: Duration) {
        self.failures += 1;
        self.record_latency(elapsed);
    }

    /// Total reducer invocations
    pub fn handled(&self) -> u64 {
        self.processed + self.failures
    }

    pub fn avg_processing_time_ms(&self) -> f64 {
        self.avg_processing_time.as_secs_f64() * 1000.0
    }

    // Incremental mean; called after the counter for this sample was bumped.
    fn record_latency(&mut self, elapsed: Duration) {
        let count = self.handled() as f64;
        let previous = self.avg_processing_time.as_secs_f64();
        let next = previous + (elapsed.as_secs_f64() - previous) / count;
        self.avg_processing_time = Duration::from_secs_f64(next.max(0.0));
    }
}

/// Point-in-time view of an effector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectorState<S> {
    pub state: S,
    pub status: EffectorStatus,
    pub processing: ProcessingMetrics,
}

impl<S> EffectorState<S> {
    pub(crate) fn new(state: S) -> Self {
        Self {
            state,
            status: EffectorStatus::Idle,
            processing: ProcessingMetrics::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == EffectorStatus::Running
    }

    pub fn is_terminated(&self) -> bool {
        self.status == EffectorStatus::Terminated
    }
}
