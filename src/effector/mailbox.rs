//! # Mailbox
//!
//! Bounded, optionally priority-aware queue of pending records for one
//! effector.
//!
//! ## Layout
//!
//! One FIFO lane per [`Priority`] level, drained highest-first. Capacity is
//! enforced with semaphore permits: a sender acquires a permit before pushing
//! and the consumer returns it after popping, so a full mailbox parks senders
//! (in arrival order) until space frees up or the backpressure timeout elapses.
//!
//! With prioritization enabled the `High` lane draws from its own
//! `priority_capacity` pool while `Normal` and `Low` share `capacity`. With
//! prioritization disabled every record lands in a single FIFO lane bounded by
//! `capacity` and priorities are ignored.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore, TryAcquireError};
use tracing::trace;

use crate::config::MailboxConfig;
use crate::error::SendError;
use crate::messaging::{AgentRecord, EffectorId, Priority};

const LANE_COUNT: usize = Priority::DRAIN_ORDER.len();
const FIFO_LANE: usize = 1;
const PRIORITY_LANE: usize = 0;

pub struct Mailbox {
    effector_id: EffectorId,
    config: MailboxConfig,
    lanes: Mutex<[VecDeque<AgentRecord>; LANE_COUNT]>,
    slots: Semaphore,
    priority_slots: Semaphore,
    ready: Notify,
    closed: AtomicBool,
}

impl std::fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailbox")
            .field("effector_id", &self.effector_id)
            .field("config", &self.config)
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Mailbox {
    pub fn new(effector_id: EffectorId, config: MailboxConfig) -> Self {
        let priority_capacity = if config.enable_prioritization {
            config.priority_capacity
        } else {
            0
        };

        Self {
            slots: Semaphore::new(config.capacity),
            priority_slots: Semaphore::new(priority_capacity),
            effector_id,
            config,
            lanes: Mutex::new(Default::default()),
            ready: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &MailboxConfig {
        &self.config
    }

    /// Enqueue a record, waiting up to the backpressure timeout for space
    pub async fn send(&self, record: AgentRecord) -> Result<(), SendError> {
        let lane = self.lane_for(&record);
        let timeout = self.config.backpressure_timeout();

        let permit = match tokio::time::timeout(timeout, self.slots_for(lane).acquire()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(self.terminated()),
            Err(_) => return Err(self.backpressure(timeout)),
        };

        self.push(lane, record)?;
        permit.forget();
        Ok(())
    }

    /// Enqueue a record only if space is immediately available
    pub fn try_send(&self, record: AgentRecord) -> Result<(), SendError> {
        let lane = self.lane_for(&record);

        let permit = match self.slots_for(lane).try_acquire() {
            Ok(permit) => permit,
            Err(TryAcquireError::Closed) => return Err(self.terminated()),
            Err(TryAcquireError::NoPermits) => return Err(self.backpressure(Duration::ZERO)),
        };

        self.push(lane, record)?;
        permit.forget();
        Ok(())
    }

    /// Wait for the highest-priority pending record
    ///
    /// Returns `None` once the mailbox is closed. Intended for the single
    /// processing loop that owns this mailbox.
    pub(crate) async fn recv(&self) -> Option<AgentRecord> {
        loop {
            let notified = self.ready.notified();

            if let Some(record) = self.pop() {
                return Some(record);
            }
            if self.is_closed() {
                return None;
            }

            notified.await;
        }
    }

    /// Close the mailbox, discarding pending records
    ///
    /// Parked and future senders fail with [`SendError::Terminated`].
    /// Returns how many records were dropped.
    pub(crate) fn close(&self) -> usize {
        let discarded = {
            let mut lanes = self.lanes.lock();
            if self.closed.swap(true, Ordering::AcqRel) {
                return 0;
            }
            lanes.iter_mut().map(|lane| lane.drain(..).count()).sum()
        };

        self.slots.close();
        self.priority_slots.close();
        self.ready.notify_one();
        discarded
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Records currently waiting
    pub fn len(&self) -> usize {
        self.lanes.lock().iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, lane: usize, record: AgentRecord) -> Result<(), SendError> {
        {
            let mut lanes = self.lanes.lock();
            if self.is_closed() {
                return Err(self.terminated());
            }
            trace!(
                effector_id = %self.effector_id,
                record_id = %record.id(),
                lane = lane,
                "Record enqueued"
            );
            lanes[lane].push_back(record);
        }
        self.ready.notify_one();
        Ok(())
    }

    fn pop(&self) -> Option<AgentRecord> {
        let (lane, record) = {
            let mut lanes = self.lanes.lock();
            lanes
                .iter_mut()
                .enumerate()
                .find_map(|(index, lane)| lane.pop_front().map(|record| (index, record)))?
        };
        self.slots_for(lane).add_permits(1);
        Some(record)
    }

    fn lane_for(&self, record: &AgentRecord) -> usize {
        if self.config.enable_prioritization {
            record.priority().lane()
        } else {
            FIFO_LANE
        }
    }

    fn slots_for(&self, lane: usize) -> &Semaphore {
        if lane == PRIORITY_LANE {
            &self.priority_slots
        } else {
            &self.slots
        }
    }

    fn terminated(&self) -> SendError {
        SendError::Terminated {
            id: self.effector_id.clone(),
        }
    }

    fn backpressure(&self, timeout: Duration) -> SendError {
        SendError::Backpressure {
            id: self.effector_id.clone(),
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    fn config(capacity: usize, priority_capacity: Option<usize>, timeout_ms: u64) -> MailboxConfig {
        let mut config = MailboxConfig::default()
            .with_capacity(capacity)
            .with_backpressure_timeout(Duration::from_millis(timeout_ms));
        if let Some(priority_capacity) = priority_capacity {
            config = config.with_prioritization(priority_capacity);
        }
        config
    }

    fn record(label: &str, priority: Priority) -> AgentRecord {
        AgentRecord::typed_command("mb", label).with_priority(priority)
    }

    async fn drain(mailbox: &Mailbox) -> Vec<String> {
        let mut labels = Vec::new();
        while !mailbox.is_empty() {
            let record = mailbox.recv().await.unwrap();
            labels.push(record.command_type().unwrap().to_string());
        }
        labels
    }

    #[tokio::test]
    async fn fifo_when_prioritization_disabled() {
        let mailbox = Mailbox::new("mb".into(), config(10, None, 100));
        mailbox.send(record("a", Priority::Low)).await.unwrap();
        mailbox.send(record("b", Priority::High)).await.unwrap();
        mailbox.send(record("c", Priority::Normal)).await.unwrap();

        assert_eq!(drain(&mailbox).await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn high_priority_drains_first_with_fifo_tie_break() {
        let mailbox = Mailbox::new("mb".into(), config(10, Some(10), 100));
        mailbox.send(record("low-1", Priority::Low)).await.unwrap();
        mailbox.send(record("high-1", Priority::High)).await.unwrap();
        mailbox.send(record("normal-1", Priority::Normal)).await.unwrap();
        mailbox.send(record("low-2", Priority::Low)).await.unwrap();
        mailbox.send(record("high-2", Priority::High)).await.unwrap();

        assert_eq!(
            drain(&mailbox).await,
            vec!["high-1", "high-2", "normal-1", "low-1", "low-2"]
        );
    }

    #[tokio::test]
    async fn full_mailbox_times_out_with_backpressure() {
        let mailbox = Mailbox::new("mb".into(), config(1, None, 50));
        mailbox.send(record("a", Priority::Normal)).await.unwrap();

        let started = Instant::now();
        let err = mailbox.send(record("b", Priority::Normal)).await.unwrap_err();
        assert!(err.is_backpressure());
        assert!(started.elapsed() >= Duration::from_millis(45));
        assert_eq!(mailbox.len(), 1);
    }

    #[tokio::test]
    async fn parked_sender_proceeds_once_space_frees() {
        let mailbox = Arc::new(Mailbox::new("mb".into(), config(1, None, 1000)));
        mailbox.send(record("a", Priority::Normal)).await.unwrap();

        let sender = {
            let mailbox = mailbox.clone();
            tokio::spawn(async move { mailbox.send(record("b", Priority::Normal)).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(mailbox.recv().await.unwrap().command_type(), Some("a"));
        sender.await.unwrap().unwrap();
        assert_eq!(mailbox.recv().await.unwrap().command_type(), Some("b"));
    }

    #[tokio::test]
    async fn priority_lane_has_its_own_capacity() {
        let mailbox = Mailbox::new("mb".into(), config(1, Some(1), 20));
        mailbox.send(record("n", Priority::Normal)).await.unwrap();
        mailbox.send(record("h", Priority::High)).await.unwrap();

        assert!(mailbox.try_send(record("n2", Priority::Low)).unwrap_err().is_backpressure());
        assert!(mailbox.try_send(record("h2", Priority::High)).unwrap_err().is_backpressure());
        assert_eq!(mailbox.len(), 2);
    }

    #[tokio::test]
    async fn close_rejects_senders_and_ends_receiver() {
        let mailbox = Arc::new(Mailbox::new("mb".into(), config(1, None, 5000)));
        mailbox.send(record("a", Priority::Normal)).await.unwrap();

        let parked = {
            let mailbox = mailbox.clone();
            tokio::spawn(async move { mailbox.send(record("b", Priority::Normal)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(mailbox.close(), 1);
        assert!(parked.await.unwrap().unwrap_err().is_terminated());
        assert!(mailbox.send(record("c", Priority::Normal)).await.unwrap_err().is_terminated());
        assert!(mailbox.recv().await.is_none());
        assert_eq!(mailbox.close(), 0);
    }
}
