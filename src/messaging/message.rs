//! # Agent Records
//!
//! The envelope type carried through every effector mailbox and subscription
//! feed, plus the factory helpers callers use to build well-formed records.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Opaque identifier of one effector, stable for the actor's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectorId(String);

impl EffectorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EffectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EffectorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EffectorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for EffectorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EffectorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Kind of record flowing through an effector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordType {
    /// An instruction interpreted by the reducer
    Command,
    /// Notification that an actor's state changed
    StateChange,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Command => write!(f, "COMMAND"),
            RecordType::StateChange => write!(f, "STATE_CHANGE"),
        }
    }
}

/// Delivery priority of a record
///
/// Ordered `Low < Normal < High`. Records without an explicit priority are
/// treated as `Normal`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    /// All levels, highest first (mailbox drain order)
    pub const DRAIN_ORDER: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];

    pub(crate) fn lane(self) -> usize {
        match self {
            Priority::High => 0,
            Priority::Normal => 1,
            Priority::Low => 2,
        }
    }
}

/// Optional routing metadata attached to a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub priority: Option<Priority>,
    pub correlation_id: Option<String>,
}

/// Immutable message envelope addressed to one effector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    id: String,
    effector_id: EffectorId,
    timestamp: u64,
    #[serde(rename = "type")]
    record_type: RecordType,
    payload: serde_json::Value,
    metadata: RecordMetadata,
}

impl AgentRecord {
    /// Build a record with a fresh id and timestamp
    pub fn new(
        effector_id: impl Into<EffectorId>,
        record_type: RecordType,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            effector_id: effector_id.into(),
            timestamp: monotonic_millis(),
            record_type,
            payload,
            metadata: RecordMetadata::default(),
        }
    }

    /// Build a `COMMAND` record
    pub fn command(effector_id: impl Into<EffectorId>, payload: serde_json::Value) -> Self {
        Self::new(effector_id, RecordType::Command, payload)
    }

    /// Build a `STATE_CHANGE` record
    pub fn state_change(effector_id: impl Into<EffectorId>, payload: serde_json::Value) -> Self {
        Self::new(effector_id, RecordType::StateChange, payload)
    }

    /// Shorthand for a command whose payload is `{"type": command_type}`
    pub fn typed_command(effector_id: impl Into<EffectorId>, command_type: &str) -> Self {
        Self::command(effector_id, serde_json::json!({ "type": command_type }))
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.metadata.priority = Some(priority);
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.metadata.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: RecordMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn effector_id(&self) -> &EffectorId {
        &self.effector_id
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    /// Effective priority, `Normal` when unset
    pub fn priority(&self) -> Priority {
        self.metadata.priority.unwrap_or_default()
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.metadata.correlation_id.as_deref()
    }

    pub fn is_command(&self) -> bool {
        self.record_type == RecordType::Command
    }

    pub fn is_state_change(&self) -> bool {
        self.record_type == RecordType::StateChange
    }

    /// The `payload.type` discriminator used by command-style reducers
    pub fn command_type(&self) -> Option<&str> {
        self.payload.get("type").and_then(serde_json::Value::as_str)
    }

    /// Convert to JSON for logging or transport
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

static LAST_TIMESTAMP_MS: AtomicU64 = AtomicU64::new(0);

/// Wall-clock milliseconds that never go backwards within this process
pub fn monotonic_millis() -> u64 {
    let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
    let previous = LAST_TIMESTAMP_MS.fetch_max(now, Ordering::AcqRel);
    previous.max(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn command_factory_stamps_defaults() {
        let record = AgentRecord::command("counter", json!({"type": "INCREMENT"}));

        assert!(record.is_command());
        assert_eq!(record.effector_id().as_str(), "counter");
        assert_eq!(record.priority(), Priority::Normal);
        assert_eq!(record.correlation_id(), None);
        assert_eq!(record.command_type(), Some("INCREMENT"));
        assert!(Uuid::parse_str(record.id()).is_ok());
    }

    #[test]
    fn record_ids_are_unique() {
        let a = AgentRecord::typed_command("x", "A");
        let b = AgentRecord::typed_command("x", "A");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn timestamps_do_not_go_backwards() {
        let first = AgentRecord::typed_command("x", "A");
        let second = AgentRecord::typed_command("x", "B");
        assert!(second.timestamp() >= first.timestamp());
    }

    #[test]
    fn builder_methods_set_metadata() {
        let record = AgentRecord::typed_command("x", "A")
            .with_priority(Priority::High)
            .with_correlation_id("corr-1");

        assert_eq!(record.priority(), Priority::High);
        assert_eq!(record.correlation_id(), Some("corr-1"));
    }

    #[test]
    fn serializes_with_wire_names() {
        let record = AgentRecord::state_change("x", json!({"count": 1}))
            .with_priority(Priority::Low);
        let value = record.to_json().unwrap();

        assert_eq!(value["type"], "STATE_CHANGE");
        assert_eq!(value["effector_id"], "x");
        assert_eq!(value["metadata"]["priority"], "LOW");
    }

    #[test]
    fn priorities_order_high_above_low() {
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
        assert_eq!(Priority::DRAIN_ORDER[0], Priority::High);
    }
}
