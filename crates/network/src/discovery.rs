//! Passive peer discovery
//!
//! Other components report peers they observed; subscribers (the
//! connection layer) receive an announcement per peer whenever new
//! addresses show up. Repeat announcements carrying nothing new are
//! suppressed.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;
use tracing::debug;

use mixcraft_core::PeerId;

/// A newly observed peer and the addresses it was seen at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAnnouncement {
    pub peer: PeerId,
    pub addresses: Vec<String>,
}

/// Announcer of observed peers to the connection layer
pub struct PeerDiscovery {
    known: HashMap<PeerId, HashSet<String>>,
    subscribers: Vec<mpsc::UnboundedSender<PeerAnnouncement>>,
}

impl PeerDiscovery {
    pub fn new() -> Self {
        Self {
            known: HashMap::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<PeerAnnouncement> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Report a peer observation. Returns `true` when the observation
    /// carried at least one new address and was published.
    pub fn announce<I, S>(&mut self, peer: PeerId, addresses: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let known = self.known.entry(peer).or_default();
        let fresh: Vec<String> = addresses
            .into_iter()
            .map(Into::into)
            .filter(|addr| known.insert(addr.clone()))
            .collect();

        if fresh.is_empty() {
            return false;
        }

        debug!(%peer, addresses = fresh.len(), "announcing peer");
        let announcement = PeerAnnouncement {
            peer,
            addresses: fresh,
        };
        self.subscribers
            .retain(|tx| tx.send(announcement.clone()).is_ok());
        true
    }

    pub fn known_peers(&self) -> usize {
        self.known.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for PeerDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(n: u8) -> PeerId {
        PeerId::from_bytes([n; 32])
    }

    #[test]
    fn test_announce_reaches_all_subscribers() {
        let mut discovery = PeerDiscovery::new();
        let mut rx1 = discovery.subscribe();
        let mut rx2 = discovery.subscribe();

        assert!(discovery.announce(peer(1), ["/ip4/10.0.0.1/tcp/9000"]));

        for rx in [&mut rx1, &mut rx2] {
            let announcement = rx.try_recv().unwrap();
            assert_eq!(announcement.peer, peer(1));
            assert_eq!(announcement.addresses, vec!["/ip4/10.0.0.1/tcp/9000"]);
        }
    }

    #[test]
    fn test_duplicate_announcement_suppressed() {
        let mut discovery = PeerDiscovery::new();
        let mut rx = discovery.subscribe();

        assert!(discovery.announce(peer(1), ["/ip4/10.0.0.1/tcp/9000"]));
        rx.try_recv().unwrap();

        assert!(!discovery.announce(peer(1), ["/ip4/10.0.0.1/tcp/9000"]));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_new_address_for_known_peer_published() {
        let mut discovery = PeerDiscovery::new();
        let mut rx = discovery.subscribe();

        discovery.announce(peer(1), ["/ip4/10.0.0.1/tcp/9000"]);
        rx.try_recv().unwrap();

        assert!(discovery.announce(
            peer(1),
            ["/ip4/10.0.0.1/tcp/9000", "/ip4/10.0.0.2/tcp/9000"]
        ));

        // Only the address we had not seen before is published
        let announcement = rx.try_recv().unwrap();
        assert_eq!(announcement.addresses, vec!["/ip4/10.0.0.2/tcp/9000"]);
    }

    #[test]
    fn test_dropped_subscribers_pruned() {
        let mut discovery = PeerDiscovery::new();
        let rx = discovery.subscribe();
        drop(rx);

        discovery.announce(peer(1), ["/ip4/10.0.0.1/tcp/9000"]);
        assert_eq!(discovery.subscriber_count(), 0);
    }

    #[test]
    fn test_distinct_peers_tracked_separately() {
        let mut discovery = PeerDiscovery::new();
        discovery.announce(peer(1), ["/ip4/10.0.0.1/tcp/9000"]);
        discovery.announce(peer(2), ["/ip4/10.0.0.1/tcp/9000"]);
        assert_eq!(discovery.known_peers(), 2);
    }
}
