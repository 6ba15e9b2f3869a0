pub mod message;

pub use message::{
    monotonic_millis, AgentRecord, EffectorId, Priority, RecordMetadata, RecordType,
};
