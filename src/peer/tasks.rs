use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::events::EventKind;
use super::node::PeerNode;
use crate::election::engine::ElectionOutcome;
use crate::files::transfer::serve_request;
use crate::heartbeat::detector::sweep_dead_peers;
use crate::membership::types::Role;
use crate::transport::MessageHandler;
use crate::transport::message::Message;

impl PeerNode {
    /// Spawns the receive loops, the file server and every periodic worker,
    /// then starts discovery.
    pub fn start(self: &Arc<Self>) {
        tracing::info!("Starting peer {}...", self.id);
        let poll = self.config.timings.poll_interval;
        let timings = self.config.timings.clone();
        let mut handles = Vec::new();

        if let Some(udp) = &self.udp {
            let node = self.clone();
            let handler: MessageHandler =
                Arc::new(move |message: Message, src: SocketAddr| node.handle_message(message, src));
            handles.extend(udp.listen(handler, self.shutdown.clone(), poll));
        }

        if let Some(handle) = self.spawn_file_server() {
            handles.push(handle);
        }

        handles.push(self.spawn_periodic(
            "leader heartbeat",
            timings.leader_heartbeat_interval,
            PeerNode::leader_heartbeat_cycle,
        ));
        handles.push(self.spawn_periodic(
            "follower heartbeat",
            timings.follower_heartbeat_interval,
            PeerNode::follower_heartbeat_cycle,
        ));
        handles.push(self.spawn_periodic(
            "liveness sweep",
            timings.liveness_sweep_interval,
            PeerNode::liveness_sweep_cycle,
        ));
        handles.push(self.spawn_periodic(
            "leader check",
            timings.leader_check_interval,
            PeerNode::leader_check_cycle,
        ));
        handles.push(self.spawn_periodic("deadline poller", poll, PeerNode::poll_deadlines));

        self.tasks.lock().extend(handles);
        tracing::info!("All background tasks started");

        self.discover();
    }

    /// Serves download requests on the TCP listener. Only the first call
    /// starts it.
    pub fn spawn_file_server(&self) -> Option<JoinHandle<()>> {
        let server = self.tcp.lock().take()?;
        let store = self.store.clone();
        let chunk_size = self.config.chunk_size;

        Some(server.serve(
            move |stream, addr| {
                let store = store.clone();
                async move {
                    if let Err(e) = serve_request(stream, &store, chunk_size).await {
                        tracing::warn!("Transfer to {} failed: {}", addr, e);
                    }
                }
            },
            self.shutdown.clone(),
            self.config.timings.poll_interval,
        ))
    }

    fn spawn_periodic(self: &Arc<Self>, name: &'static str, period: Duration, cycle: fn(&PeerNode)) -> JoinHandle<()> {
        let node = self.clone();
        let poll = node.config.timings.poll_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            while !node.shutdown.load(Ordering::Relaxed) {
                if tokio::time::timeout(poll, interval.tick()).await.is_ok() {
                    cycle(&node);
                }
            }
            tracing::debug!("{} loop stopped", name);
        })
    }

    // ============================================================
    // PERIODIC CYCLES
    // ============================================================

    /// Leader: broadcast `HEARTBEAT{role=LEADER}`.
    pub fn leader_heartbeat_cycle(&self) {
        if self.role() != Role::Leader {
            return;
        }
        let message = Message::Heartbeat {
            sender_id: self.id.clone(),
            role: Some(Role::Leader),
        };
        if let Err(e) = self.transport.broadcast(&message) {
            tracing::warn!("Failed to broadcast leader heartbeat: {}", e);
        }
    }

    /// Follower: unicast `HEARTBEAT` to the known leader.
    pub fn follower_heartbeat_cycle(&self) {
        let leader_id = {
            let state = self.state.lock();
            if state.role == Role::Leader {
                return;
            }
            match &state.leader_id {
                Some(leader_id) => leader_id.clone(),
                None => return,
            }
        };

        let Some(leader_addr) = self.directory.addr_of(&leader_id) else {
            tracing::debug!("No address for leader {}, heartbeat skipped", leader_id);
            return;
        };
        let message = Message::Heartbeat {
            sender_id: self.id.clone(),
            role: None,
        };
        if let Err(e) = self.transport.send(&message, leader_addr) {
            tracing::warn!("Failed to send heartbeat to leader {}: {}", leader_id, e);
        }
    }

    /// Leader: evict silent peers and purge their catalog entries.
    pub fn liveness_sweep_cycle(&self) {
        if self.role() != Role::Leader {
            return;
        }

        let report = sweep_dead_peers(
            &self.directory,
            &self.catalog,
            self.clock.now(),
            self.config.timings.peer_timeout,
            &self.id,
        );
        if report.is_empty() {
            return;
        }

        for (record, removed) in report.evicted {
            tracing::warn!(
                "Peer {} timed out, removed with {} catalog entr(ies)",
                record.peer_id,
                removed
            );
            self.events.record(EventKind::PeerEvicted {
                peer_id: record.peer_id,
                entries_removed: removed,
            });
        }
        self.bump_catalog();
    }

    /// Follower: re-elect once the leader has been silent too long.
    pub fn leader_check_cycle(&self) {
        let now = self.clock.now();
        let lost = {
            let mut state = self.state.lock();
            let expired = state.role == Role::Follower
                && state.leader_id.is_some()
                && state
                    .leader_watch
                    .is_expired(now, self.config.timings.leader_timeout);
            if expired { state.leader_id.take() } else { None }
        };

        if let Some(leader_id) = lost {
            tracing::warn!("Leader {} timed out", leader_id);
            self.events.record(EventKind::LeaderLost { leader_id });
            self.start_election();
        }
    }

    /// Fires the discovery and election deadlines that have passed.
    pub fn poll_deadlines(&self) {
        let now = self.clock.now();
        let (discovery_expired, outcome, leader_known) = {
            let mut state = self.state.lock();
            let discovery_expired = state.discovery_deadline.is_some_and(|deadline| now >= deadline);
            if discovery_expired {
                state.discovery_deadline = None;
            }
            let outcome = state.election.poll(now);
            (discovery_expired, outcome, state.leader_id.is_some())
        };

        if discovery_expired && !leader_known {
            tracing::info!("No leader answered discovery");
            self.events.record(EventKind::DiscoveryTimedOut);
            self.start_election();
        }

        match outcome {
            ElectionOutcome::Victory => self.declare_victory(),
            ElectionOutcome::YieldExpired if !leader_known => {
                tracing::warn!("No coordinator after yielding, retrying election");
                self.start_election();
            }
            ElectionOutcome::YieldExpired | ElectionOutcome::Pending => {}
        }
    }

    fn declare_victory(&self) {
        let resumed = {
            let mut state = self.state.lock();
            state.role = Role::Leader;
            state.leader_id = Some(self.id.clone());
            std::mem::take(&mut state.resume_leadership)
        };

        if !resumed {
            self.catalog.clear();
            self.bump_catalog();
        }

        let message = Message::Coordinator {
            sender_id: self.id.clone(),
            addr: self.advertised,
        };
        if let Err(e) = self.transport.broadcast(&message) {
            tracing::warn!("Failed to broadcast COORDINATOR: {}", e);
        }

        self.events.record(EventKind::BecameLeader { resumed });
        tracing::info!("Became leader");
        self.republish();
    }
}
