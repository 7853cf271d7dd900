//! Channel contract event registry
//!
//! An owned, per-node registry of listeners keyed by contract event name.
//! Events are deduplicated per channel using the chain's `(block, tx, log)`
//! total order before fan-out, so a re-delivered or reordered subscription
//! never feeds the same event twice into the ledger.
//!
//! Listeners must be torn down exactly once when a channel leaves `Open`;
//! `unsubscribe` is idempotent so defensive teardown on error paths is
//! safe.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use mixcraft_core::{ChannelEvent, ChannelId};

/// Handle returned by [`ChannelEventRegistry::subscribe`], used to detach
/// a single listener again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerHandle {
    id: u64,
    name: String,
}

impl ListenerHandle {
    pub fn event_name(&self) -> &str {
        &self.name
    }
}

struct Listener {
    id: u64,
    tx: mpsc::UnboundedSender<ChannelEvent>,
}

/// Registry of channel contract event listeners
pub struct ChannelEventRegistry {
    listeners: HashMap<String, Vec<Listener>>,
    /// Highest `(block, tx, log)` seen per channel
    seen: HashMap<ChannelId, (u64, u64, u64)>,
    next_id: u64,
}

impl ChannelEventRegistry {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            seen: HashMap::new(),
            next_id: 0,
        }
    }

    /// Append a listener under an event name.
    pub fn subscribe(
        &mut self,
        name: &str,
        tx: mpsc::UnboundedSender<ChannelEvent>,
    ) -> ListenerHandle {
        let id = self.next_id;
        self.next_id += 1;

        self.listeners
            .entry(name.to_string())
            .or_default()
            .push(Listener { id, tx });

        debug!(event = name, id, "subscribed channel event listener");
        ListenerHandle {
            id,
            name: name.to_string(),
        }
    }

    /// Detach one listener by its handle. Detaching twice is a no-op.
    pub fn remove(&mut self, handle: &ListenerHandle) {
        if let Some(list) = self.listeners.get_mut(&handle.name) {
            list.retain(|listener| listener.id != handle.id);
            if list.is_empty() {
                self.listeners.remove(&handle.name);
            }
        }
    }

    /// Detach and remove all listeners under an event name.
    ///
    /// Idempotent: detaching an unknown or already-empty name is a no-op.
    pub fn unsubscribe(&mut self, name: &str) {
        if let Some(removed) = self.listeners.remove(name) {
            debug!(event = name, count = removed.len(), "unsubscribed listeners");
        }
    }

    /// Detach every listener under every known event name.
    pub fn unsubscribe_all(&mut self) {
        let names: Vec<String> = self.listeners.keys().cloned().collect();
        for name in names {
            self.unsubscribe(&name);
        }
    }

    /// Fan an event out to the listeners registered under its name.
    ///
    /// Returns `false` when the event is a duplicate or arrives out of
    /// order for its channel; such events are dropped before fan-out.
    /// Listeners whose receiving side has gone away are pruned.
    pub fn deliver(&mut self, event: ChannelEvent) -> bool {
        let order = event.order();
        if let Some(last) = self.seen.get(&event.channel_id) {
            if order <= *last {
                trace!(
                    event = %event.name,
                    channel = %event.channel_id,
                    "dropping duplicate or stale channel event"
                );
                return false;
            }
        }
        self.seen.insert(event.channel_id, order);

        if let Some(list) = self.listeners.get_mut(&event.name) {
            list.retain(|listener| listener.tx.send(event.clone()).is_ok());
            if list.is_empty() {
                self.listeners.remove(&event.name);
            }
        }
        true
    }

    /// Number of active listeners for one event name.
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map(Vec::len).unwrap_or(0)
    }

    /// Number of active listeners across all event names.
    pub fn total_listeners(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }
}

impl Default for ChannelEventRegistry {
    fn default() -> Self {
        Self::new()
    }
}
