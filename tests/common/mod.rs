#![allow(dead_code)]

use peer_share::clock::ManualClock;
use peer_share::config::PeerConfig;
use peer_share::membership::types::Role;
use peer_share::peer::node::PeerNode;
use peer_share::transport::memory::MemoryNetwork;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// A group of peers on one in-memory network sharing one manual clock.
///
/// Time moves in one-second steps; each step fires the deadline poller and
/// every periodic worker that is due, then delivers all queued datagrams.
pub struct Cluster {
    pub network: Arc<MemoryNetwork>,
    pub clock: Arc<ManualClock>,
    /// Sorted by id, lowest first.
    pub nodes: Vec<Arc<PeerNode>>,
    elapsed_secs: u64,
    _dirs: Vec<TempDir>,
}

impl Cluster {
    pub async fn new(size: usize) -> Self {
        let network = MemoryNetwork::new();
        let clock = Arc::new(ManualClock::new());
        let mut nodes = Vec::new();
        let mut dirs = Vec::new();

        for _ in 0..size {
            let dir = tempfile::tempdir().unwrap();
            let config = PeerConfig {
                advertise_ip: Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
                ..PeerConfig::default()
            }
            .with_shared_dir(dir.path().join("shared"));
            let node = PeerNode::with_transport(config, network.join(), clock.clone())
                .await
                .unwrap();
            node.spawn_file_server();
            nodes.push(node);
            dirs.push(dir);
        }
        nodes.sort_by(|a, b| a.id().cmp(b.id()));

        Self {
            network,
            clock,
            nodes,
            elapsed_secs: 0,
            _dirs: dirs,
        }
    }

    pub fn node(&self, index: usize) -> &Arc<PeerNode> {
        &self.nodes[index]
    }

    pub fn shared_dir(&self, index: usize) -> &Path {
        self.nodes[index].store().root()
    }

    /// Delivers queued datagrams until the network is quiet.
    pub fn pump(&self) {
        for _ in 0..1000 {
            let batch = self.network.drain();
            if batch.is_empty() {
                return;
            }
            for datagram in batch {
                if let Some(node) = self.nodes.iter().find(|n| n.advertised_addr() == datagram.to) {
                    node.handle_message(datagram.message, datagram.from);
                }
            }
        }
        panic!("network never went quiet");
    }

    pub fn run_for(&mut self, duration: Duration) {
        for _ in 0..duration.as_secs() {
            self.clock.advance(Duration::from_secs(1));
            self.elapsed_secs += 1;

            for node in self.live_nodes() {
                node.poll_deadlines();
                if self.elapsed_secs % 2 == 0 {
                    node.leader_heartbeat_cycle();
                    node.leader_check_cycle();
                }
                if self.elapsed_secs % 5 == 0 {
                    node.follower_heartbeat_cycle();
                    node.liveness_sweep_cycle();
                }
            }
            self.pump();
        }
    }

    /// Stops `index` from sending, receiving or running its workers.
    pub fn crash(&self, index: usize) {
        self.network.take_down(self.nodes[index].advertised_addr());
        self.nodes[index].shutdown();
    }

    pub fn live_nodes(&self) -> Vec<Arc<PeerNode>> {
        self.nodes
            .iter()
            .filter(|node| !node.is_shut_down())
            .cloned()
            .collect()
    }

    pub fn leaders(&self) -> Vec<Arc<PeerNode>> {
        self.live_nodes()
            .into_iter()
            .filter(|node| node.role() == Role::Leader)
            .collect()
    }

    /// Everyone discovers at once and the group settles on a leader.
    pub fn bootstrap(&mut self) {
        for node in &self.nodes {
            node.discover();
        }
        self.pump();
        self.run_for(Duration::from_secs(10));
    }
}
