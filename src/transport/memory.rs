//! In-process datagram network.
//!
//! Datagrams are queued, not delivered: the owner drains the queue and
//! routes each one, which makes multi-peer scenarios run in a fixed order.
//! Every datagram still goes through the JSON codec and the size limit.

use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use super::Transport;
use super::message::Message;
use crate::config::MAX_DATAGRAM_SIZE;
use crate::error::TransportError;

#[derive(Debug, Clone)]
pub struct Datagram {
    pub from: SocketAddr,
    pub to: SocketAddr,
    pub message: Message,
}

#[derive(Debug)]
pub struct MemoryNetwork {
    queue: Mutex<VecDeque<Datagram>>,
    members: DashMap<SocketAddr, ()>,
    down: DashSet<SocketAddr>,
    /// Pairs that cannot reach each other, stored in both directions.
    cut: DashSet<(SocketAddr, SocketAddr)>,
    next_port: AtomicU16,
    max_datagram_size: usize,
}

impl MemoryNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            members: DashMap::new(),
            down: DashSet::new(),
            cut: DashSet::new(),
            next_port: AtomicU16::new(40000),
            max_datagram_size: MAX_DATAGRAM_SIZE,
        })
    }

    /// Attaches a new endpoint on `127.0.0.1` with a fresh port.
    pub fn join(self: &Arc<Self>) -> Arc<MemoryTransport> {
        let port = self.next_port.fetch_add(1, Ordering::Relaxed);
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
        self.members.insert(addr, ());
        Arc::new(MemoryTransport {
            network: self.clone(),
            addr,
        })
    }

    /// Simulates a crash: nothing is delivered to or sent from `addr`.
    pub fn take_down(&self, addr: SocketAddr) {
        self.down.insert(addr);
        self.queue
            .lock()
            .retain(|datagram| datagram.to != addr && datagram.from != addr);
    }

    pub fn bring_up(&self, addr: SocketAddr) {
        self.down.remove(&addr);
    }

    /// Cuts every link between the two groups.
    pub fn partition(&self, left: &[SocketAddr], right: &[SocketAddr]) {
        for a in left {
            for b in right {
                self.cut.insert((*a, *b));
                self.cut.insert((*b, *a));
            }
        }
    }

    pub fn heal(&self) {
        self.cut.clear();
    }

    /// Takes every queued datagram, oldest first.
    pub fn drain(&self) -> Vec<Datagram> {
        self.queue.lock().drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    fn reachable(&self, from: SocketAddr, to: SocketAddr) -> bool {
        !self.down.contains(&from) && !self.down.contains(&to) && !self.cut.contains(&(from, to))
    }

    fn enqueue(&self, from: SocketAddr, to: SocketAddr, message: &Message) -> Result<(), TransportError> {
        let bytes = message.encode(self.max_datagram_size)?;
        if !self.reachable(from, to) {
            return Ok(());
        }
        let message = Message::decode(&bytes)?;
        self.queue.lock().push_back(Datagram { from, to, message });
        Ok(())
    }
}

#[derive(Debug)]
pub struct MemoryTransport {
    network: Arc<MemoryNetwork>,
    addr: SocketAddr,
}

impl Transport for MemoryTransport {
    fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    fn send(&self, message: &Message, to: SocketAddr) -> Result<(), TransportError> {
        self.network.enqueue(self.addr, to, message)
    }

    fn broadcast(&self, message: &Message) -> Result<(), TransportError> {
        let targets: Vec<SocketAddr> = self.network.members.iter().map(|entry| *entry.key()).collect();
        for to in targets {
            self.network.enqueue(self.addr, to, message)?;
        }
        Ok(())
    }
}
