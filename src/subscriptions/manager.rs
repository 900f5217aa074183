//! Subscription manager for broadcasting ledger state.

use crate::types::FullState;
use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use super::types::{DropReason, LedgerEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId};

/// Internal subscription state.
struct Subscription {
    sender: Sender<LedgerEvent>,
}

impl Subscription {
    /// Try to send an event. A failure reports why the sink must go.
    fn try_send(&self, event: LedgerEvent) -> Option<DropReason> {
        match self.sender.try_send(event) {
            Ok(()) => None,
            Err(crossbeam_channel::TrySendError::Full(_)) => Some(DropReason::BufferOverflow),
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                Some(DropReason::Disconnected)
            }
        }
    }
}

/// Manages subscriptions and fans out full-state frames.
///
/// Delivery is fire-and-forget per sink: a full or disconnected sink is
/// removed without blocking the publisher or the other sinks.
pub struct SubscriptionManager {
    /// Active subscriptions, ordered by id (= registration order).
    subscriptions: RwLock<BTreeMap<SubscriptionId, Subscription>>,
    /// Counter for generating subscription ids.
    next_id: AtomicU64,
}

impl SubscriptionManager {
    /// Create a new subscription manager.
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new subscription.
    ///
    /// The current full state is delivered immediately as the first event,
    /// so late joiners are synchronized without waiting for a mutation.
    pub fn subscribe(
        &self,
        config: SubscriptionConfig,
        initial: Arc<FullState>,
    ) -> SubscriptionHandle {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size.max(1));

        let subscription = Subscription { sender };
        // The buffer is empty, this cannot fail.
        subscription.try_send(LedgerEvent::State { state: initial });

        self.subscriptions.write().insert(id, subscription);

        SubscriptionHandle { id, receiver }
    }

    /// Unsubscribe and clean up. Safe to call for an already-removed id.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut subs = self.subscriptions.write();
        if let Some(sub) = subs.remove(&id) {
            // Send dropped event (best effort)
            let _ = sub.sender.try_send(LedgerEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }

    /// Broadcast one full-state frame to every subscriber.
    ///
    /// The `Arc` is cloned per sink, so all sinks share the same immutable
    /// payload. Sinks that fail to receive are dropped; the caller never
    /// sees an error.
    pub fn publish(&self, state: Arc<FullState>) {
        let mut to_remove = Vec::new();

        {
            let subs = self.subscriptions.read();
            debug!(subscribers = subs.len(), "publishing state frame");
            for (id, sub) in subs.iter() {
                let event = LedgerEvent::State {
                    state: Arc::clone(&state),
                };
                if let Some(reason) = sub.try_send(event) {
                    to_remove.push((*id, reason));
                }
            }
        }

        // Remove failed subscriptions
        if !to_remove.is_empty() {
            let mut subs = self.subscriptions.write();
            for (id, reason) in to_remove {
                warn!(id = id.0, ?reason, "dropping subscriber");
                if let Some(sub) = subs.remove(&id) {
                    // Try to notify about the drop (might fail, that's ok)
                    let _ = sub.sender.try_send(LedgerEvent::Dropped { reason });
                }
            }
        }
    }

    /// Get subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.read().len()
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}
