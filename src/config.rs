//! Peer configuration.
//!
//! Every timing constant of the protocol lives here so tests can shrink or
//! stretch them. `PeerConfig::default()` carries the protocol's fixed values.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const BROADCAST_PORT: u16 = 5007;
pub const CHUNK_SIZE: usize = 4096;
pub const MAX_DATAGRAM_SIZE: usize = 4096;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Unicast UDP port. `0` lets the OS pick one.
    pub udp_port: u16,
    /// File-transfer TCP port. `0` lets the OS pick one.
    pub tcp_port: u16,
    pub broadcast_port: u16,
    /// Destination used for every broadcast datagram.
    pub broadcast_addr: SocketAddr,
    /// IP announced in DISCOVERY / COORDINATOR and used as the host of
    /// self-published catalog entries. Detected when absent.
    pub advertise_ip: Option<IpAddr>,
    pub shared_dir: PathBuf,
    pub timings: Timings,
    pub chunk_size: usize,
    pub max_datagram_size: usize,
    pub event_log_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timings {
    pub leader_heartbeat_interval: Duration,
    pub follower_heartbeat_interval: Duration,
    pub peer_timeout: Duration,
    pub leader_timeout: Duration,
    pub liveness_sweep_interval: Duration,
    pub leader_check_interval: Duration,
    pub discovery_timeout: Duration,
    pub election_timeout: Duration,
    /// How long a peer that yielded to a higher id waits for a COORDINATOR
    /// before running its own round again.
    pub yield_timeout: Duration,
    /// Poll period of the deadline loop and of the bounded socket waits.
    pub poll_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            leader_heartbeat_interval: Duration::from_secs(2),
            follower_heartbeat_interval: Duration::from_secs(5),
            peer_timeout: Duration::from_secs(15),
            leader_timeout: Duration::from_secs(10),
            liveness_sweep_interval: Duration::from_secs(5),
            leader_check_interval: Duration::from_secs(2),
            discovery_timeout: Duration::from_secs(5),
            election_timeout: Duration::from_secs(3),
            yield_timeout: Duration::from_secs(6),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            udp_port: 0,
            tcp_port: 0,
            broadcast_port: BROADCAST_PORT,
            broadcast_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), BROADCAST_PORT),
            advertise_ip: None,
            shared_dir: PathBuf::from("shared_files"),
            timings: Timings::default(),
            chunk_size: CHUNK_SIZE,
            max_datagram_size: MAX_DATAGRAM_SIZE,
            event_log_capacity: 1024,
        }
    }
}

impl PeerConfig {
    /// Points both the broadcast listener and the broadcast destination at
    /// `port`, keeping the destination IP.
    pub fn with_broadcast_port(mut self, port: u16) -> Self {
        self.broadcast_port = port;
        self.broadcast_addr.set_port(port);
        self
    }

    pub fn with_shared_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shared_dir = dir.into();
        self
    }
}
