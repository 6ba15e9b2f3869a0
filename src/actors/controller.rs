//! Controller actor: drives counters owned by another [`EffectorService`].
//!
//! `DISPATCH {target, command}` forwards `command` to the `target` counter and
//! counts it; a failed forward is a reducer failure and leaves the state
//! untouched. `ACKNOWLEDGE` counts a completion reported back by a caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::counter::CounterState;
use crate::config::MailboxConfig;
use crate::constants::commands;
use crate::effector::{Effector, EffectorService, Reducer};
use crate::error::{EffectorResult, ReducerError, ReducerResult};
use crate::messaging::{AgentRecord, EffectorId, RecordMetadata};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerState {
    pub dispatched: u64,
    pub acknowledged: u64,
    pub last_target: Option<String>,
    pub per_target: BTreeMap<String, u64>,
}

impl ControllerState {
    pub fn outstanding(&self) -> u64 {
        self.dispatched.saturating_sub(self.acknowledged)
    }
}

pub struct ControllerReducer {
    counters: Arc<EffectorService<CounterState>>,
}

impl ControllerReducer {
    pub fn new(counters: Arc<EffectorService<CounterState>>) -> Self {
        Self { counters }
    }

    async fn dispatch(
        &self,
        record: &AgentRecord,
        state: &ControllerState,
    ) -> ReducerResult<ControllerState> {
        let payload = record.payload();
        let target = payload
            .get("target")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ReducerError::new("DISPATCH requires a string `target`"))?;
        let command = payload
            .get("command")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ReducerError::new("DISPATCH requires a string `command`"))?;

        let correlation_id = record
            .correlation_id()
            .map(str::to_string)
            .unwrap_or_else(|| record.id().to_string());
        let forwarded = AgentRecord::command(target, forwarded_payload(payload, command))
            .with_metadata(RecordMetadata {
                priority: record.metadata().priority,
                correlation_id: Some(correlation_id),
            });

        self.counters
            .send(target, forwarded)
            .await
            .map_err(|e| ReducerError::new(format!("dispatch to {target} failed: {e}")))?;

        debug!(target_effector = %target, command = %command, "Command dispatched");

        let mut next = state.clone();
        next.dispatched += 1;
        next.last_target = Some(target.to_string());
        *next.per_target.entry(target.to_string()).or_default() += 1;
        Ok(next)
    }
}

// Carries extra fields such as `amount` through to the counter.
fn forwarded_payload(payload: &serde_json::Value, command: &str) -> serde_json::Value {
    let mut forwarded = serde_json::Map::new();
    if let Some(fields) = payload.as_object() {
        for (key, value) in fields {
            if !matches!(key.as_str(), "type" | "target" | "command") {
                forwarded.insert(key.clone(), value.clone());
            }
        }
    }
    forwarded.insert("type".to_string(), serde_json::Value::from(command));
    serde_json::Value::Object(forwarded)
}

#[async_trait]
impl Reducer<ControllerState> for ControllerReducer {
    async fn reduce(
        &self,
        record: &AgentRecord,
        state: &ControllerState,
    ) -> ReducerResult<ControllerState> {
        if record.is_state_change() {
            return Ok(state.clone());
        }

        match record.command_type() {
            Some(commands::DISPATCH) => self.dispatch(record, state).await,
            Some(commands::ACKNOWLEDGE) => {
                if state.outstanding() == 0 {
                    return Err(ReducerError::new("nothing outstanding to acknowledge"));
                }
                let mut next = state.clone();
                next.acknowledged += 1;
                Ok(next)
            }
            Some(other) => Err(ReducerError::new(format!(
                "unknown controller command: {other}"
            ))),
            None => Err(ReducerError::new("command payload has no `type`")),
        }
    }
}

/// Helpers for creating controllers and addressing them
pub struct ControllerActor;

impl ControllerActor {
    pub fn spawn(
        service: &EffectorService<ControllerState>,
        id: impl Into<EffectorId>,
        counters: Arc<EffectorService<CounterState>>,
        config: MailboxConfig,
    ) -> EffectorResult<Effector<ControllerState>> {
        service.create(
            id,
            ControllerState::default(),
            ControllerReducer::new(counters),
            config,
        )
    }

    pub fn dispatch(id: impl Into<EffectorId>, target: &str, command: &str) -> AgentRecord {
        AgentRecord::command(
            id,
            serde_json::json!({
                "type": commands::DISPATCH,
                "target": target,
                "command": command,
            }),
        )
    }

    pub fn acknowledge(id: impl Into<EffectorId>) -> AgentRecord {
        AgentRecord::typed_command(id, commands::ACKNOWLEDGE)
    }
}
