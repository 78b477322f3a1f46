use std::time::{Duration, Instant};

use crate::catalog::service::Catalog;
use crate::membership::directory::PeerDirectory;
use crate::membership::types::{PeerId, PeerRecord};

/// Follower-side view of the leader's liveness.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaderWatch {
    last_heartbeat: Option<Instant>,
}

impl LeaderWatch {
    /// Restarts the watch, e.g. when a new leader is adopted.
    pub fn reset(&mut self, now: Instant) {
        self.last_heartbeat = Some(now);
    }

    /// Records a leader heartbeat. Stamps never move backwards.
    pub fn observe(&mut self, now: Instant) {
        match self.last_heartbeat {
            Some(last) if last >= now => {}
            _ => self.last_heartbeat = Some(now),
        }
    }

    pub fn last_heartbeat(&self) -> Option<Instant> {
        self.last_heartbeat
    }

    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.last_heartbeat
            .map(|last| now.saturating_duration_since(last))
    }

    /// True once the last heartbeat is more than `timeout` old. A watch that
    /// never saw a heartbeat is not expired.
    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        self.age(now).is_some_and(|age| age > timeout)
    }
}

/// Peers removed by one liveness sweep, with the catalog entries they took
/// with them.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub evicted: Vec<(PeerRecord, usize)>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.evicted.is_empty()
    }
}

/// Leader-side failure detection: evicts every peer silent for longer than
/// `peer_timeout` and purges its catalog entries.
pub fn sweep_dead_peers(
    directory: &PeerDirectory,
    catalog: &Catalog,
    now: Instant,
    peer_timeout: Duration,
    self_id: &PeerId,
) -> SweepReport {
    let evicted = directory
        .evict_expired(now, peer_timeout, self_id)
        .into_iter()
        .map(|record| {
            let removed = catalog.purge_peer(&record.peer_id);
            (record, removed)
        })
        .collect();

    SweepReport { evicted }
}
