//! Caches for the forwarding path
//!
//! [`PendingTickets`] holds tickets for forwarded hops that have not been
//! acknowledged yet; [`SeenTags`] remembers recently processed packet
//! challenges to drop duplicates. Both are bounded with TTL plus
//! oldest-first eviction so a flood of unacknowledged hops cannot grow
//! memory without limit.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use mixcraft_core::{ChannelId, Id, PeerId, SignedTicket};

/// Default TTL for pending entries (5 minutes)
const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Maximum tracked entries
const DEFAULT_MAX_SIZE: usize = 10000;

struct PendingEntry {
    channel_id: ChannelId,
    ticket: SignedTicket,
    /// Peer the packet was forwarded to; only its acknowledgement counts
    next_hop: PeerId,
    created_at: Instant,
}

/// Tickets awaiting acknowledgement, keyed by forward-packet challenge
pub struct PendingTickets {
    entries: HashMap<Id, PendingEntry>,
    ttl: Duration,
    max_size: usize,
}

impl PendingTickets {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_TTL, DEFAULT_MAX_SIZE)
    }

    pub fn with_config(ttl: Duration, max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_size,
        }
    }

    /// Store a ticket until the matching acknowledgement arrives.
    pub fn insert(
        &mut self,
        challenge: Id,
        channel_id: ChannelId,
        ticket: SignedTicket,
        next_hop: PeerId,
    ) {
        if self.entries.len() >= self.max_size {
            self.evict_expired();
        }
        if self.entries.len() >= self.max_size {
            self.evict_oldest();
        }

        self.entries.insert(
            challenge,
            PendingEntry {
                channel_id,
                ticket,
                next_hop,
                created_at: Instant::now(),
            },
        );
    }

    /// Peer whose acknowledgement a pending challenge is waiting for.
    pub fn expected_signer(&self, challenge: &Id) -> Option<PeerId> {
        let entry = self.entries.get(challenge)?;
        if entry.created_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.next_hop)
    }

    /// Resolve a challenge into its pending ticket, removing the entry.
    pub fn resolve(&mut self, challenge: &Id) -> Option<(ChannelId, SignedTicket)> {
        let entry = self.entries.remove(challenge)?;
        if entry.created_at.elapsed() >= self.ttl {
            return None;
        }
        Some((entry.channel_id, entry.ticket))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_expired(&mut self) {
        let now = Instant::now();
        self.entries
            .retain(|_, entry| now.duration_since(entry.created_at) < self.ttl);
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest_key) = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.created_at)
            .map(|(k, _)| *k)
        {
            self.entries.remove(&oldest_key);
        }
    }
}

impl Default for PendingTickets {
    fn default() -> Self {
        Self::new()
    }
}

/// Recently seen packet challenges, for duplicate suppression
pub struct SeenTags {
    entries: HashMap<Id, Instant>,
    ttl: Duration,
    max_size: usize,
}

impl SeenTags {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_TTL, DEFAULT_MAX_SIZE)
    }

    pub fn with_config(ttl: Duration, max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_size,
        }
    }

    /// Record a tag; returns `true` when it was already present and fresh.
    pub fn test_and_set(&mut self, tag: Id) -> bool {
        let now = Instant::now();

        if let Some(seen_at) = self.entries.get(&tag) {
            if now.duration_since(*seen_at) < self.ttl {
                return true;
            }
        }

        if self.entries.len() >= self.max_size {
            let ttl = self.ttl;
            self.entries
                .retain(|_, seen_at| now.duration_since(*seen_at) < ttl);
        }
        if self.entries.len() >= self.max_size {
            if let Some(oldest_key) = self
                .entries
                .iter()
                .min_by_key(|(_, seen_at)| **seen_at)
                .map(|(k, _)| *k)
            {
                self.entries.remove(&oldest_key);
            }
        }

        self.entries.insert(tag, now);
        false
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SeenTags {
    fn default() -> Self {
        Self::new()
    }
}
