use serde::Serialize;
use std::net::SocketAddr;
use std::time::Instant;

use crate::catalog::types::CatalogSnapshot;
use crate::election::engine::ElectionEngine;
use crate::heartbeat::detector::LeaderWatch;
use crate::membership::types::{PeerId, Role};

/// Snapshot of a peer for the console.
#[derive(Debug, Clone, Serialize)]
pub struct PeerStatus {
    pub peer_id: PeerId,
    pub role: Role,
    pub leader_id: Option<PeerId>,
    pub udp_addr: SocketAddr,
    pub tcp_port: u16,
    pub peers: usize,
    pub catalog_files: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// This peer is the leader; the catalog was read in place.
    Local(CatalogSnapshot),
    /// QUERY_FILES went out; the FILE_LIST reply replaces the local view.
    Requested,
}

/// Everything the election and failure detector decide on, under one lock.
#[derive(Debug)]
pub(crate) struct Coordination {
    pub role: Role,
    pub leader_id: Option<PeerId>,
    pub election: ElectionEngine,
    pub leader_watch: LeaderWatch,
    pub discovery_deadline: Option<Instant>,
    /// Set when a sitting leader opens a round; a win then keeps the catalog.
    pub resume_leadership: bool,
}
