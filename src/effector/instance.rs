//! # Effector Instance
//!
//! One actor: a mailbox, a state cell, a reducer, and the single processing
//! task that is the only writer of that state.
//!
//! ## Processing Loop
//!
//! ```text
//! Mailbox ──recv──▶ Reducer(record, state) ──▶ commit state + metrics
//!                                          └──▶ publish record (+ STATE_CHANGE)
//! ```
//!
//! ## Termination
//!
//! `terminate` interrupts in-flight work: the reducer future is raced against
//! the shutdown signal and dropped at its next await point, and a result that
//! arrives after shutdown was requested is discarded before commit. Once
//! `terminate` returns the state snapshot no longer changes apart from the
//! status flip to `TERMINATED`.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::mailbox::Mailbox;
use super::reducer::Reducer;
use super::state::{ActorState, EffectorState, EffectorStatus};
use super::subscription::{SubscriberSet, Subscription};
use crate::config::MailboxConfig;
use crate::error::{EffectorResult, SendError};
use crate::messaging::{AgentRecord, EffectorId};

pub struct EffectorInstance<S: ActorState> {
    id: EffectorId,
    mailbox: Arc<Mailbox>,
    cell: Arc<RwLock<EffectorState<S>>>,
    subscribers: Arc<SubscriberSet>,
    reducer: Arc<dyn Reducer<S>>,
    running: Arc<AtomicBool>,
    terminated: AtomicBool,
    shutdown: Arc<Notify>,
    processing_handle: Mutex<Option<JoinHandle<()>>>,
}

impl<S: ActorState> std::fmt::Debug for EffectorInstance<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectorInstance")
            .field("id", &self.id)
            .field("mailbox", &self.mailbox)
            .field("status", &self.cell.read().status)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<S: ActorState> EffectorInstance<S> {
    /// Build an idle instance; call [`start`](Self::start) to begin processing
    pub fn create(
        id: EffectorId,
        initial_state: S,
        reducer: Arc<dyn Reducer<S>>,
        config: MailboxConfig,
    ) -> EffectorResult<Arc<Self>> {
        config.validate()?;

        Ok(Arc::new(Self {
            mailbox: Arc::new(Mailbox::new(id.clone(), config)),
            cell: Arc::new(RwLock::new(EffectorState::new(initial_state))),
            subscribers: Arc::new(SubscriberSet::new(id.clone())),
            reducer,
            running: Arc::new(AtomicBool::new(false)),
            terminated: AtomicBool::new(false),
            shutdown: Arc::new(Notify::new()),
            processing_handle: Mutex::new(None),
            id,
        }))
    }

    /// Spawn the processing loop onto the current tokio runtime
    ///
    /// Transitions IDLE → RUNNING. Has no effect on an instance that is
    /// already running or terminated.
    pub fn start(&self) {
        if self.terminated.load(Ordering::Acquire)
            || self
                .running
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            return;
        }

        self.cell.write().status = EffectorStatus::Running;

        let processing_loop = ProcessingLoop {
            id: self.id.clone(),
            mailbox: self.mailbox.clone(),
            cell: self.cell.clone(),
            subscribers: self.subscribers.clone(),
            reducer: self.reducer.clone(),
            running: self.running.clone(),
            shutdown: self.shutdown.clone(),
        };

        *self.processing_handle.lock() = Some(tokio::spawn(processing_loop.run()));
        info!(effector_id = %self.id, "Effector started");
    }

    pub fn id(&self) -> &EffectorId {
        &self.id
    }

    /// Enqueue a record, applying backpressure when the mailbox is full
    pub async fn send(&self, record: AgentRecord) -> Result<(), SendError> {
        if record.effector_id() != &self.id {
            debug!(
                effector_id = %self.id,
                record_effector_id = %record.effector_id(),
                record_id = %record.id(),
                "Record addressed to a different effector id"
            );
        }
        self.mailbox.send(record).await
    }

    /// Enqueue a record without waiting for space
    pub fn try_send(&self, record: AgentRecord) -> Result<(), SendError> {
        self.mailbox.try_send(record)
    }

    /// Snapshot of state, status and metrics
    pub fn get_state(&self) -> EffectorState<S> {
        let mut snapshot = self.cell.read().clone();
        snapshot.processing.mailbox_depth = self.mailbox.len();
        snapshot
    }

    pub fn status(&self) -> EffectorStatus {
        self.cell.read().status
    }

    /// Attach a live feed of every record this effector accepts from now on
    pub fn subscribe(&self) -> Subscription {
        self.subscribers.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Stop the processing loop, close the mailbox and release subscribers
    ///
    /// Status flips to `TERMINATED` before waiting for the loop, and the loop
    /// releases subscriber feeds on its own exit path, so dropping this future
    /// part way still leaves the effector fully terminated. Returns `false` if
    /// the instance had already been terminated.
    pub async fn terminate(&self) -> bool {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.running.store(false, Ordering::Release);
        self.shutdown.notify_one();
        let discarded = self.mailbox.close();
        self.cell.write().status = EffectorStatus::Terminated;

        let handle = self.processing_handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(effector_id = %self.id, error = %e, "Processing task ended abnormally");
            }
        }
        // Never started, or the loop panicked before releasing them.
        self.subscribers.close();

        info!(
            effector_id = %self.id,
            discarded_records = discarded,
            "Effector terminated"
        );
        true
    }
}

impl<S: ActorState> Drop for EffectorInstance<S> {
    fn drop(&mut self) {
        // Detached loop exits on its own once signalled.
        if !self.terminated.load(Ordering::Acquire) {
            self.running.store(false, Ordering::Release);
            self.shutdown.notify_one();
            self.mailbox.close();
            self.subscribers.close();
        }
    }
}

/// State owned by the spawned processing task
struct ProcessingLoop<S: ActorState> {
    id: EffectorId,
    mailbox: Arc<Mailbox>,
    cell: Arc<RwLock<EffectorState<S>>>,
    subscribers: Arc<SubscriberSet>,
    reducer: Arc<dyn Reducer<S>>,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl<S: ActorState> ProcessingLoop<S> {
    async fn run(self) {
        let mut state = self.cell.read().state.clone();
        debug!(effector_id = %self.id, "Processing loop running");

        while self.running.load(Ordering::Acquire) {
            let record = tokio::select! {
                biased;
                _ = self.shutdown.notified() => break,
                next = self.mailbox.recv() => match next {
                    Some(record) => record,
                    None => break,
                },
            };

            let started = Instant::now();
            let outcome = tokio::select! {
                biased;
                _ = self.shutdown.notified() => {
                    debug!(
                        effector_id = %self.id,
                        record_id = %record.id(),
                        "In-flight reduction interrupted by shutdown"
                    );
                    break;
                }
                outcome = self.reducer.reduce(&record, &state) => outcome,
            };

            if !self.running.load(Ordering::Acquire) {
                debug!(
                    effector_id = %self.id,
                    record_id = %record.id(),
                    "Discarding reduction completed after shutdown"
                );
                break;
            }
            let elapsed = started.elapsed();

            let changed = match outcome {
                Ok(next) => {
                    let changed = next != state;
                    state = next;
                    let mut cell = self.cell.write();
                    if changed {
                        cell.state = state.clone();
                    }
                    cell.processing.record_success(elapsed);
                    changed
                }
                Err(e) => {
                    warn!(
                        effector_id = %self.id,
                        record_id = %record.id(),
                        correlation_id = record.correlation_id().unwrap_or_default(),
                        error = %e,
                        "Reducer failed; state retained"
                    );
                    self.cell.write().processing.record_failure(elapsed);
                    false
                }
            };

            self.subscribers.publish(&record);
            if changed {
                self.publish_state_change(&record, &state);
            }
        }

        self.subscribers.close();
        debug!(effector_id = %self.id, "Processing loop stopped");
    }

    fn publish_state_change(&self, cause: &AgentRecord, state: &S) {
        match serde_json::to_value(state) {
            Ok(payload) => {
                let mut record = AgentRecord::state_change(self.id.clone(), payload);
                if let Some(correlation_id) = cause.correlation_id() {
                    record = record.with_correlation_id(correlation_id);
                }
                self.subscribers.publish(&record);
            }
            Err(e) => warn!(
                effector_id = %self.id,
                error = %e,
                "Failed to serialize state for STATE_CHANGE record"
            ),
        }
    }
}
