use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;

use crate::clock::now_ms;
use crate::membership::types::PeerId;

/// Coordination events surfaced to the console.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    DiscoveryStarted,
    DiscoveryTimedOut,
    LeaderFound { leader_id: PeerId },
    ElectionStarted { round: u64 },
    ElectionYielded { to: PeerId },
    BecameLeader { resumed: bool },
    LeaderAnnounced { leader_id: PeerId },
    LeaderLost { leader_id: PeerId },
    SteppedDown { to: PeerId },
    PeerJoined { peer_id: PeerId },
    PeerEvicted { peer_id: PeerId, entries_removed: usize },
    FilesPublished { peer_id: PeerId, count: usize },
    CatalogReceived { files: usize },
    FileShared { filename: String },
    DownloadCompleted { filename: String, bytes: u64 },
    DownloadFailed { filename: String, error: String },
    IntegrityWarning { filename: String, expected: String, actual: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerEvent {
    pub seq: u64,
    pub at_ms: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Default)]
struct Ring {
    next_seq: u64,
    events: VecDeque<PeerEvent>,
}

/// Bounded append-only event stream. Sequence numbers start at 1 and never
/// repeat; the oldest events go first once `capacity` is reached.
#[derive(Debug)]
pub struct EventLog {
    ring: Mutex<Ring>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(Ring {
                next_seq: 1,
                events: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, kind: EventKind) -> u64 {
        let mut ring = self.ring.lock();
        let seq = ring.next_seq;
        ring.next_seq += 1;

        if ring.events.len() == self.capacity {
            ring.events.pop_front();
        }
        ring.events.push_back(PeerEvent {
            seq,
            at_ms: now_ms(),
            kind,
        });

        seq
    }

    /// Events with a sequence number greater than `seq`.
    pub fn since(&self, seq: u64) -> Vec<PeerEvent> {
        self.ring
            .lock()
            .events
            .iter()
            .filter(|event| event.seq > seq)
            .cloned()
            .collect()
    }

    /// Sequence number of the newest event, `0` when none was recorded.
    pub fn latest_seq(&self) -> u64 {
        self.ring.lock().next_seq - 1
    }
}
