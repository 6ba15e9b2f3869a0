#![allow(dead_code)]
//! # Actor Test Harness
//!
//! Shared helpers for effector integration tests.
//!
//! `GatedReducer` lets a test park the processing loop on a `BLOCK` command so
//! records can pile up in the mailbox before the loop drains them. Its state is
//! the ordered list of command labels it has handled.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use effector::{
    AgentRecord, EffectorService, EffectorState, MailboxConfig, Reducer, ReducerError,
    ReducerResult, Subscription,
};

pub const BLOCK: &str = "BLOCK";
pub const FAIL: &str = "FAIL";

/// Reducer that records command labels and waits on a gate for `BLOCK`
pub struct GatedReducer {
    gate: Arc<Semaphore>,
    delay: Option<Duration>,
}

impl GatedReducer {
    pub fn new(gate: Arc<Semaphore>) -> Self {
        Self { gate, delay: None }
    }

    /// Sleep for `delay` on every record, simulating reducer work
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Reducer<Vec<String>> for GatedReducer {
    async fn reduce(&self, record: &AgentRecord, state: &Vec<String>) -> ReducerResult<Vec<String>> {
        let label = record
            .command_type()
            .ok_or_else(|| ReducerError::new("missing label"))?
            .to_string();

        if label == BLOCK {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| ReducerError::new("gate closed"))?;
            permit.forget();
        }
        if label == FAIL {
            return Err(ReducerError::new("requested failure"));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut next = state.clone();
        next.push(label);
        Ok(next)
    }
}

/// A gated effector plus the semaphore that releases it
pub struct GatedEffector {
    pub service: Arc<EffectorService<Vec<String>>>,
    pub id: String,
    pub gate: Arc<Semaphore>,
}

impl GatedEffector {
    pub fn create(id: &str, config: MailboxConfig) -> Self {
        Self::create_with(id, config, |reducer| reducer)
    }

    pub fn create_with(
        id: &str,
        config: MailboxConfig,
        customize: impl FnOnce(GatedReducer) -> GatedReducer,
    ) -> Self {
        let service = Arc::new(EffectorService::new());
        let gate = Arc::new(Semaphore::new(0));
        service
            .create(id, Vec::new(), customize(GatedReducer::new(gate.clone())), config)
            .expect("create gated effector");

        Self {
            service,
            id: id.to_string(),
            gate,
        }
    }

    pub fn record(&self, label: &str) -> AgentRecord {
        AgentRecord::typed_command(self.id.as_str(), label)
    }

    /// Send `BLOCK` and wait until the loop has dequeued it
    pub async fn park(&self) {
        self.service
            .send(&self.id, self.record(BLOCK))
            .await
            .expect("send BLOCK");
        wait_until(|| {
            self.state().processing.mailbox_depth == 0
        })
        .await;
        // Let the loop reach the gate.
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn state(&self) -> EffectorState<Vec<String>> {
        self.service.get_state(&self.id).expect("effector registered")
    }

    pub fn subscribe(&self) -> Subscription {
        self.service.subscribe(&self.id).expect("effector registered")
    }
}

/// Poll `condition` every 5ms for up to 5 seconds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within 5s");
}

/// Collect the next `count` command records from a feed, skipping STATE_CHANGE
pub async fn next_commands(feed: &mut Subscription, count: usize) -> Vec<String> {
    let mut labels = Vec::with_capacity(count);
    while labels.len() < count {
        let record = tokio::time::timeout(Duration::from_secs(5), feed.recv())
            .await
            .expect("feed stalled")
            .expect("feed ended early");
        if record.is_command() {
            labels.push(record.command_type().unwrap_or_default().to_string());
        }
    }
    labels
}

/// Mailbox config with prioritization and generous capacities
pub fn prioritized(capacity: usize) -> MailboxConfig {
    MailboxConfig::default()
        .with_capacity(capacity)
        .with_prioritization(capacity)
}
