use dashmap::DashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use super::types::{PeerId, PeerRecord};

/// Table of known peers keyed by id.
///
/// Written from every receive loop and from the liveness sweep, so it is
/// backed by a `DashMap` rather than a single lock.
#[derive(Debug, Default)]
pub struct PeerDirectory {
    peers: DashMap<PeerId, PeerRecord>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records contact from `peer_id` at `addr`.
    ///
    /// Creates the record on first contact and returns `true` in that case.
    /// `last_seen` never moves backwards: a stamp older than the recorded one
    /// only updates the address.
    pub fn touch(&self, peer_id: &PeerId, addr: SocketAddr, now: Instant) -> bool {
        match self.peers.get_mut(peer_id) {
            Some(mut record) => {
                record.addr = addr;
                if now > record.last_seen {
                    record.last_seen = now;
                }
                false
            }
            None => {
                self.peers.insert(
                    peer_id.clone(),
                    PeerRecord {
                        peer_id: peer_id.clone(),
                        addr,
                        last_seen: now,
                    },
                );
                true
            }
        }
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<PeerRecord> {
        self.peers.get(peer_id).map(|entry| entry.value().clone())
    }

    pub fn addr_of(&self, peer_id: &PeerId) -> Option<SocketAddr> {
        self.peers.get(peer_id).map(|entry| entry.addr)
    }

    pub fn remove(&self, peer_id: &PeerId) -> Option<PeerRecord> {
        self.peers.remove(peer_id).map(|(_, record)| record)
    }

    /// Removes and returns every peer whose last contact is more than
    /// `timeout` before `now`. `keep` is never evicted.
    pub fn evict_expired(&self, now: Instant, timeout: Duration, keep: &PeerId) -> Vec<PeerRecord> {
        let expired: Vec<PeerId> = self
            .peers
            .iter()
            .filter(|entry| {
                entry.key() != keep && now.saturating_duration_since(entry.last_seen) > timeout
            })
            .map(|entry| entry.key().clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|peer_id| {
                // Re-check under the shard lock: a heartbeat may have landed
                // between the scan and the removal.
                self.peers
                    .remove_if(&peer_id, |_, record| {
                        now.saturating_duration_since(record.last_seen) > timeout
                    })
                    .map(|(_, record)| record)
            })
            .collect()
    }

    pub fn members(&self) -> Vec<PeerRecord> {
        self.peers.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
