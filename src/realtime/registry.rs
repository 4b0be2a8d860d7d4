//! Topic-keyed subscription registry.
//!
//! A tagged mapping from topic to an ordered handler list, plus the reserved
//! wildcard key. The registry outlives any one transport session, which is
//! what lets subscriptions survive a reconnect.
//!
//! Dispatch snapshots the handler lists before invoking anything, so a
//! handler that synchronously unsubscribes itself (or a sibling) cannot
//! corrupt an in-progress delivery.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;

use super::envelope::{topics, Envelope};

/// A subscriber callback. Receives a JSON object: the full envelope for
/// wildcard subscriptions, the payload (minus `type`) for topic ones.
pub type Handler = Arc<dyn Fn(Value) + Send + Sync + 'static>;

/// One registered handler, tagged for targeted removal.
struct Entry {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    by_topic: HashMap<String, Vec<Entry>>,
}

/// Ordered, topic-keyed handler registry.
///
/// Owned by the connection manager; callers interact with it only through
/// [`SubscriptionRegistry::subscribe`] and the returned [`Subscription`].
#[derive(Default)]
pub struct SubscriptionRegistry {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry").finish_non_exhaustive()
    }
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `handler` at the end of `topic`'s handler list.
    ///
    /// Registration order is delivery order. The returned [`Subscription`]
    /// removes exactly this registration and is safe to invoke repeatedly.
    pub fn subscribe(self: &Arc<Self>, topic: &str, handler: Handler) -> Subscription {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        inner
            .by_topic
            .entry(topic.to_string())
            .or_default()
            .push(Entry { id, handler });

        Subscription {
            registry: Arc::downgrade(self),
            topic: topic.to_string(),
            id,
        }
    }

    /// Remove the registration tagged `id` under `topic`, if still present.
    fn unsubscribe(&self, topic: &str, id: u64) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        if let Some(entries) = inner.by_topic.get_mut(topic) {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                inner.by_topic.remove(topic);
            }
        }
    }

    /// Deliver one inbound envelope.
    ///
    /// Wildcard subscribers run first and receive the full envelope
    /// (`type` included); then the topic's subscribers, in registration
    /// order, receive the payload with `type` stripped. An envelope whose
    /// topic has no subscribers is dropped without comment.
    pub fn dispatch(&self, envelope: &Envelope) {
        // Snapshot under the lock, invoke outside it.
        let (wildcard, targeted) = {
            let inner = self.inner.lock().expect("registry lock poisoned");
            let snapshot = |topic: &str| -> Vec<Handler> {
                inner
                    .by_topic
                    .get(topic)
                    .map(|entries| entries.iter().map(|e| Arc::clone(&e.handler)).collect())
                    .unwrap_or_default()
            };
            (snapshot(topics::WILDCARD), snapshot(&envelope.topic))
        };

        for handler in &wildcard {
            handler(envelope.full_object());
        }
        for handler in &targeted {
            handler(envelope.payload_object());
        }
    }

    /// Number of handlers currently registered under `topic`.
    pub fn handler_count(&self, topic: &str) -> usize {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner.by_topic.get(topic).map_or(0, Vec::len)
    }
}

/// Capability that removes one registration.
///
/// Owned by the caller that subscribed. Calling [`Subscription::unsubscribe`]
/// more than once is a no-op after the first call. Dropping the capability
/// does NOT unsubscribe; the handler stays registered for the lifetime of
/// the manager unless explicitly removed.
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<SubscriptionRegistry>,
    topic: String,
    id: u64,
}

impl Subscription {
    /// Remove the registration this capability was issued for.
    ///
    /// Idempotent: the tag is gone after the first call, so later calls
    /// find nothing to remove.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(&self.topic, self.id);
        }
    }

    /// The topic this subscription was registered under.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}
