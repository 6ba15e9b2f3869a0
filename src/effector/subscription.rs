//! # Subscription Fan-out
//!
//! Every record an effector accepts is re-published to all live subscribers.
//! Each subscriber owns an unbounded buffer, so a slow consumer accumulates
//! records at its own boundary and never stalls the processing loop.

use futures::Stream;
use parking_lot::Mutex;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

use crate::messaging::{AgentRecord, EffectorId};

/// Set of subscriber feeds belonging to one effector
#[derive(Debug)]
pub struct SubscriberSet {
    effector_id: EffectorId,
    feeds: Mutex<Option<Vec<mpsc::UnboundedSender<AgentRecord>>>>,
}

impl SubscriberSet {
    pub fn new(effector_id: EffectorId) -> Self {
        Self {
            effector_id,
            feeds: Mutex::new(Some(Vec::new())),
        }
    }

    /// Attach a new feed starting at the next published record
    ///
    /// After [`close`](Self::close) the returned feed is already finished.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        if let Some(feeds) = self.feeds.lock().as_mut() {
            feeds.push(sender);
        }

        debug!(effector_id = %self.effector_id, "Subscriber attached");
        Subscription {
            effector_id: self.effector_id.clone(),
            receiver,
        }
    }

    /// Deliver a record to every live feed, pruning dropped subscribers
    ///
    /// Returns the number of feeds that received the record.
    pub(crate) fn publish(&self, record: &AgentRecord) -> usize {
        let mut guard = self.feeds.lock();
        let Some(feeds) = guard.as_mut() else {
            return 0;
        };

        feeds.retain(|feed| feed.send(record.clone()).is_ok());
        feeds.len()
    }

    /// Release every feed; subscribers see end-of-stream after draining
    pub(crate) fn close(&self) {
        if let Some(feeds) = self.feeds.lock().take() {
            debug!(
                effector_id = %self.effector_id,
                released = feeds.len(),
                "Subscriber feeds released"
            );
        }
    }

    /// Number of feeds still attached
    pub fn len(&self) -> usize {
        self.feeds
            .lock()
            .as_ref()
            .map(|feeds| feeds.iter().filter(|feed| !feed.is_closed()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Live, order-preserving feed of records accepted by one effector
///
/// Ends when the effector terminates. Also usable as a [`Stream`].
#[derive(Debug)]
pub struct Subscription {
    effector_id: EffectorId,
    receiver: mpsc::UnboundedReceiver<AgentRecord>,
}

impl Subscription {
    pub fn effector_id(&self) -> &EffectorId {
        &self.effector_id
    }

    /// Next record, or `None` once the effector terminated and the buffer is drained
    pub async fn recv(&mut self) -> Option<AgentRecord> {
        self.receiver.recv().await
    }

    /// Next buffered record without waiting
    pub fn try_recv(&mut self) -> Option<AgentRecord> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = AgentRecord;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
