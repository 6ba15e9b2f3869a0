//! Cloneable caller-side handle to one effector.

use std::sync::Arc;

use super::instance::EffectorInstance;
use super::state::{ActorState, EffectorState};
use super::subscription::Subscription;
use crate::error::SendError;
use crate::messaging::{AgentRecord, EffectorId};

/// Handle returned by `EffectorService::create`
///
/// Exposes messaging and observation only; lifecycle stays with the service.
/// A handle outliving termination keeps answering `get_state` with the final
/// snapshot, while `send` fails with [`SendError::Terminated`].
pub struct Effector<S: ActorState> {
    instance: Arc<EffectorInstance<S>>,
}

impl<S: ActorState> Clone for Effector<S> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
        }
    }
}

impl<S: ActorState> std::fmt::Debug for Effector<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effector").field("id", self.id()).finish()
    }
}

impl<S: ActorState> Effector<S> {
    pub(crate) fn new(instance: Arc<EffectorInstance<S>>) -> Self {
        Self { instance }
    }

    pub fn id(&self) -> &EffectorId {
        self.instance.id()
    }

    pub async fn send(&self, record: AgentRecord) -> Result<(), SendError> {
        self.instance.send(record).await
    }

    pub fn try_send(&self, record: AgentRecord) -> Result<(), SendError> {
        self.instance.try_send(record)
    }

    pub fn get_state(&self) -> EffectorState<S> {
        self.instance.get_state()
    }

    pub fn subscribe(&self) -> Subscription {
        self.instance.subscribe()
    }

    pub fn is_terminated(&self) -> bool {
        self.instance.is_terminated()
    }
}
