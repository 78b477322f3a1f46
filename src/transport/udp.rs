use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, ErrorKind};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use super::message::Message;
use super::{MessageHandler, Transport};
use crate::config::PeerConfig;
use crate::error::TransportError;

const RECV_BUFFER_SIZE: usize = 65536;

/// Real datagram transport: one unicast socket (source of everything we
/// send) and one listener on the shared broadcast port.
pub struct UdpTransport {
    unicast: Arc<UdpSocket>,
    broadcast: Arc<UdpSocket>,
    local_addr: SocketAddr,
    broadcast_addr: SocketAddr,
    max_datagram_size: usize,
}

impl UdpTransport {
    pub async fn bind(config: &PeerConfig) -> Result<Self, TransportError> {
        let unicast_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.udp_port);
        let unicast = UdpSocket::bind(unicast_addr)
            .await
            .map_err(|source| TransportError::Bind {
                what: "unicast socket",
                addr: unicast_addr,
                source,
            })?;
        unicast
            .set_broadcast(true)
            .map_err(|source| TransportError::Bind {
                what: "unicast socket",
                addr: unicast_addr,
                source,
            })?;
        let local_addr = unicast.local_addr().map_err(TransportError::Receive)?;

        let broadcast_bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.broadcast_port);
        let broadcast = bind_shared(broadcast_bind)
            .and_then(UdpSocket::from_std)
            .map_err(|source| TransportError::Bind {
                what: "broadcast socket",
                addr: broadcast_bind,
                source,
            })?;

        tracing::info!(
            "UDP transport bound: unicast {} broadcast {} (sending to {})",
            local_addr,
            broadcast_bind,
            config.broadcast_addr
        );

        Ok(Self {
            unicast: Arc::new(unicast),
            broadcast: Arc::new(broadcast),
            local_addr,
            broadcast_addr: config.broadcast_addr,
            max_datagram_size: config.max_datagram_size,
        })
    }

    /// Spawns one receive loop per socket. Each loop hands decoded messages
    /// to `handler` and exits within `poll` of `shutdown` being set.
    pub fn listen(
        &self,
        handler: MessageHandler,
        shutdown: Arc<AtomicBool>,
        poll: Duration,
    ) -> Vec<JoinHandle<()>> {
        [("unicast", self.unicast.clone()), ("broadcast", self.broadcast.clone())]
            .into_iter()
            .map(|(name, socket)| {
                let handler = handler.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    receive_loop(name, socket, handler, shutdown, poll).await;
                })
            })
            .collect()
    }

    fn send_bytes(&self, bytes: &[u8], to: SocketAddr) -> Result<(), TransportError> {
        self.unicast
            .try_send_to(bytes, to)
            .map(|_| ())
            .map_err(|source| TransportError::Send { addr: to, source })
    }
}

impl Transport for UdpTransport {
    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn send(&self, message: &Message, to: SocketAddr) -> Result<(), TransportError> {
        let bytes = message.encode(self.max_datagram_size)?;
        self.send_bytes(&bytes, to)
    }

    fn broadcast(&self, message: &Message) -> Result<(), TransportError> {
        let bytes = message.encode(self.max_datagram_size)?;
        self.send_bytes(&bytes, self.broadcast_addr)
    }
}

/// Binds a UDP socket that other local processes may bind too, so several
/// peers on one host can all hear the broadcast port.
fn bind_shared(addr: SocketAddr) -> io::Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_broadcast(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    Ok(socket.into())
}

async fn receive_loop(
    name: &'static str,
    socket: Arc<UdpSocket>,
    handler: MessageHandler,
    shutdown: Arc<AtomicBool>,
    poll: Duration,
) {
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];

    while !shutdown.load(Ordering::Relaxed) {
        let received = match tokio::time::timeout(poll, socket.recv_from(&mut buf)).await {
            Ok(received) => received,
            Err(_) => continue,
        };

        match received {
            Ok((len, src)) => match Message::decode(&buf[..len]) {
                Ok(message) => handler(message, src),
                Err(e) => {
                    tracing::warn!("Dropping malformed datagram from {}: {}", src, e);
                }
            },
            // ICMP port-unreachable from an earlier send surfaces here on
            // some platforms; it says nothing about this socket.
            Err(e) if matches!(e.kind(), ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset) => {
                tracing::debug!("Ignoring {} socket error: {}", name, e);
            }
            Err(e) => {
                tracing::error!("{} receive loop aborted: {}", name, TransportError::Receive(e));
                return;
            }
        }
    }

    tracing::debug!("{} receive loop stopped", name);
}
