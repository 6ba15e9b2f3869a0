//! Counter actor.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::MailboxConfig;
use crate::constants::commands;
use crate::effector::{Effector, EffectorService, Reducer};
use crate::error::{EffectorResult, ReducerError, ReducerResult};
use crate::messaging::{AgentRecord, EffectorId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CounterReducer;

#[async_trait]
impl Reducer<CounterState> for CounterReducer {
    async fn reduce(
        &self,
        record: &AgentRecord,
        state: &CounterState,
    ) -> ReducerResult<CounterState> {
        // Notifications about other actors are not instructions for us.
        if record.is_state_change() {
            return Ok(*state);
        }

        let count = match record.command_type() {
            Some(commands::INCREMENT) => state.count.checked_add(1),
            Some(commands::DECREMENT) => state.count.checked_sub(1),
            Some(commands::RESET) => Some(0),
            Some(commands::ADD) => {
                let amount = record
                    .payload()
                    .get("amount")
                    .and_then(serde_json::Value::as_i64)
                    .ok_or_else(|| ReducerError::new("ADD requires an integer `amount`"))?;
                state.count.checked_add(amount)
            }
            Some(other) => {
                return Err(ReducerError::new(format!("unknown counter command: {other}")))
            }
            None => return Err(ReducerError::new("command payload has no `type`")),
        };

        count
            .map(|count| CounterState { count })
            .ok_or_else(|| ReducerError::new("counter overflow"))
    }
}

/// Helpers for creating counters and addressing them
pub struct CounterActor;

impl CounterActor {
    pub fn spawn(
        service: &EffectorService<CounterState>,
        id: impl Into<EffectorId>,
        config: MailboxConfig,
    ) -> EffectorResult<Effector<CounterState>> {
        service.create(id, CounterState::default(), CounterReducer, config)
    }

    pub fn increment(id: impl Into<EffectorId>) -> AgentRecord {
        AgentRecord::typed_command(id, commands::INCREMENT)
    }

    pub fn decrement(id: impl Into<EffectorId>) -> AgentRecord {
        AgentRecord::typed_command(id, commands::DECREMENT)
    }

    pub fn reset(id: impl Into<EffectorId>) -> AgentRecord {
        AgentRecord::typed_command(id, commands::RESET)
    }

    pub fn add(id: impl Into<EffectorId>, amount: i64) -> AgentRecord {
        AgentRecord::command(
            id,
            serde_json::json!({ "type": commands::ADD, "amount": amount }),
        )
    }
}
