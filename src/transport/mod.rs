//! Transport Layer
//!
//! Best-effort messaging between peers. Nothing here acknowledges, retries
//! or orders anything.
//!
//! ## Submodules
//! - **`message`**: the closed set of control messages and their JSON codec.
//! - **`udp`**: unicast + broadcast sockets and their receive loops.
//! - **`memory`**: a queued in-process network with the same interface.
//! - **`tcp`**: accept loop and length-prefixed framing for file bodies.

pub mod memory;
pub mod message;
pub mod tcp;
pub mod udp;


use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;

use crate::error::TransportError;
use message::Message;

/// Outbound half of a datagram transport.
///
/// Sends never block: a datagram that cannot go out right away is reported
/// and dropped.
pub trait Transport: Send + Sync {
    fn local_addr(&self) -> SocketAddr;
    fn send(&self, message: &Message, to: SocketAddr) -> Result<(), TransportError>;
    fn broadcast(&self, message: &Message) -> Result<(), TransportError>;
}

/// Callback run by receive loops for every decoded datagram.
pub type MessageHandler = Arc<dyn Fn(Message, SocketAddr) + Send + Sync>;

/// IP of the interface that routes to the outside world, or loopback.
///
/// Connecting a UDP socket sends nothing; it only makes the kernel pick a
/// source address.
pub fn detect_local_ip() -> IpAddr {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
