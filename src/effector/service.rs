//! # Effector Service
//!
//! Registry mapping effector ids to live instances. The only component that
//! creates or removes effectors, and the entry point external callers use.
//!
//! Registry mutations go through `DashMap`'s entry/remove operations, so a
//! concurrent create (or terminate) race on one id resolves to exactly one
//! winner; the losers observe `Duplicate` (or `NotFound`).

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::handle::Effector;
use super::instance::EffectorInstance;
use super::reducer::{IdentityReducer, Reducer};
use super::state::{ActorState, EffectorState};
use super::subscription::Subscription;
use crate::config::{MailboxConfig, RuntimeConfig};
use crate::error::{EffectorError, EffectorResult};
use crate::messaging::{AgentRecord, EffectorId};

/// Registry and lifecycle owner for effectors sharing one state type
pub struct EffectorService<S: ActorState> {
    registry: DashMap<EffectorId, Arc<EffectorInstance<S>>>,
    default_config: MailboxConfig,
}

impl<S: ActorState> std::fmt::Debug for EffectorService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectorService")
            .field("effectors", &self.registry.len())
            .field("default_config", &self.default_config)
            .finish()
    }
}

impl<S: ActorState> Default for EffectorService<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ActorState> EffectorService<S> {
    pub fn new() -> Self {
        Self::with_mailbox_config(MailboxConfig::default())
    }

    /// Use the mailbox section of a loaded runtime configuration as default
    pub fn with_config(config: &RuntimeConfig) -> Self {
        Self::with_mailbox_config(config.mailbox.clone())
    }

    pub fn with_mailbox_config(default_config: MailboxConfig) -> Self {
        Self {
            registry: DashMap::new(),
            default_config,
        }
    }

    pub fn default_config(&self) -> &MailboxConfig {
        &self.default_config
    }

    /// Create and start an effector
    ///
    /// Must be called from within a tokio runtime. Fails with
    /// [`EffectorError::Duplicate`] if `id` already names a live effector.
    pub fn create<R>(
        &self,
        id: impl Into<EffectorId>,
        initial_state: S,
        reducer: R,
        config: MailboxConfig,
    ) -> EffectorResult<Effector<S>>
    where
        R: Reducer<S>,
    {
        self.create_shared(id.into(), initial_state, Arc::new(reducer), config)
    }

    /// Create with the service's default mailbox configuration
    pub fn create_with_reducer<R>(
        &self,
        id: impl Into<EffectorId>,
        initial_state: S,
        reducer: R,
    ) -> EffectorResult<Effector<S>>
    where
        R: Reducer<S>,
    {
        let config = self.default_config.clone();
        self.create(id, initial_state, reducer, config)
    }

    /// Create with an [`IdentityReducer`] and the default mailbox configuration
    pub fn create_default(
        &self,
        id: impl Into<EffectorId>,
        initial_state: S,
    ) -> EffectorResult<Effector<S>> {
        self.create_with_reducer(id, initial_state, IdentityReducer)
    }

    #[instrument(skip(self, initial_state, reducer, config), fields(effector_id = %id))]
    pub fn create_shared(
        &self,
        id: EffectorId,
        initial_state: S,
        reducer: Arc<dyn Reducer<S>>,
        config: MailboxConfig,
    ) -> EffectorResult<Effector<S>> {
        match self.registry.entry(id.clone()) {
            Entry::Occupied(_) => {
                debug!("Rejecting duplicate effector id");
                Err(EffectorError::duplicate(&id))
            }
            Entry::Vacant(slot) => {
                let instance = EffectorInstance::create(id, initial_state, reducer, config)?;
                instance.start();
                slot.insert(instance.clone());
                Ok(Effector::new(instance))
            }
        }
    }

    /// Terminate and deregister an effector
    ///
    /// Exactly one of several concurrent calls for the same id succeeds; the
    /// rest fail with [`EffectorError::NotFound`]. The id may be reused once
    /// this returns.
    #[instrument(skip(self, id), fields(effector_id = %id.as_ref()))]
    pub async fn terminate(&self, id: impl AsRef<str>) -> EffectorResult<()> {
        let id = id.as_ref();
        let (_, instance) = self
            .registry
            .remove(id)
            .ok_or_else(|| EffectorError::not_found(&EffectorId::from(id)))?;

        if !instance.terminate().await {
            warn!("Registered effector was already terminated");
        }
        Ok(())
    }

    /// Terminate every registered effector, returning how many were stopped
    pub async fn terminate_all(&self) -> usize {
        let ids = self.ids();
        let results = join_all(ids.iter().map(|id| self.terminate(id))).await;
        let terminated = results.iter().filter(|result| result.is_ok()).count();

        info!(terminated = terminated, "Terminated all effectors");
        terminated
    }

    /// Enqueue a record for the addressed effector
    pub async fn send(&self, id: impl AsRef<str>, record: AgentRecord) -> EffectorResult<()> {
        let instance = self.lookup(id.as_ref())?;
        instance.send(record).await?;
        Ok(())
    }

    pub fn try_send(&self, id: impl AsRef<str>, record: AgentRecord) -> EffectorResult<()> {
        let instance = self.lookup(id.as_ref())?;
        instance.try_send(record)?;
        Ok(())
    }

    pub fn get_state(&self, id: impl AsRef<str>) -> EffectorResult<EffectorState<S>> {
        Ok(self.lookup(id.as_ref())?.get_state())
    }

    pub fn subscribe(&self, id: impl AsRef<str>) -> EffectorResult<Subscription> {
        Ok(self.lookup(id.as_ref())?.subscribe())
    }

    pub fn subscriber_count(&self, id: impl AsRef<str>) -> EffectorResult<usize> {
        Ok(self.lookup(id.as_ref())?.subscriber_count())
    }

    /// Handle to an already-registered effector
    pub fn get(&self, id: impl AsRef<str>) -> EffectorResult<Effector<S>> {
        self.lookup(id.as_ref()).map(Effector::new)
    }

    pub fn contains(&self, id: impl AsRef<str>) -> bool {
        self.registry.contains_key(id.as_ref())
    }

    /// Ids of all live effectors, sorted
    pub fn ids(&self) -> Vec<EffectorId> {
        let mut ids: Vec<_> = self.registry.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    // Clones the Arc so no shard lock is held across an await.
    fn lookup(&self, id: &str) -> EffectorResult<Arc<EffectorInstance<S>>> {
        self.registry
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EffectorError::not_found(&EffectorId::from(id)))
    }
}
