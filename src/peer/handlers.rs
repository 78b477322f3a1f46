use std::net::SocketAddr;

use super::events::EventKind;
use super::node::PeerNode;
use crate::catalog::types::{CatalogSnapshot, FileSet};
use crate::election::engine::ElectionReaction;
use crate::membership::types::{PeerId, Role};
use crate::transport::message::Message;

/// How a LEADER-role heartbeat changes who we follow.
enum LeaderChange {
    None,
    /// Same leader as before.
    Refreshed,
    /// Adopted the sender as a (new) leader.
    Adopted,
    /// We were leader and the sender outranks us.
    SteppedDown,
}

impl PeerNode {
    /// Entry point of both receive loops.
    pub fn handle_message(&self, message: Message, src: SocketAddr) {
        if message.sender_id() == &self.id {
            return;
        }
        tracing::debug!(
            "Received {} from {} ({})",
            message.kind(),
            message.sender_id(),
            src
        );

        match message {
            Message::Discovery { sender_id, addr } => self.handle_discovery(sender_id, addr, src),
            Message::DiscoveryResponse {
                sender_id,
                leader_id,
            } => self.handle_discovery_response(sender_id, leader_id, src),
            Message::Heartbeat { sender_id, role } => self.handle_heartbeat(sender_id, role, src),
            Message::Election { sender_id } => self.handle_election(sender_id),
            Message::Coordinator { sender_id, addr } => self.handle_coordinator(sender_id, addr),
            Message::Publish {
                sender_id,
                files,
                tcp_port,
            } => self.handle_publish(sender_id, files, tcp_port, src),
            Message::QueryFiles { sender_id } => self.handle_query_files(sender_id, src),
            Message::FileList { sender_id, catalog } => self.handle_file_list(sender_id, catalog),
        }
    }

    fn handle_discovery(&self, sender_id: PeerId, addr: SocketAddr, src: SocketAddr) {
        if self.role() != Role::Leader {
            return;
        }

        tracing::info!("Discovery from {} (announced {})", sender_id, addr);
        self.record_contact(&sender_id, src);

        let reply = Message::DiscoveryResponse {
            sender_id: self.id.clone(),
            leader_id: self.id.clone(),
        };
        if let Err(e) = self.transport.send(&reply, src) {
            tracing::warn!("Failed to answer discovery from {}: {}", sender_id, e);
        }
    }

    fn handle_discovery_response(&self, sender_id: PeerId, leader_id: PeerId, src: SocketAddr) {
        let now = self.clock.now();
        {
            let mut state = self.state.lock();
            if state.role == Role::Leader {
                tracing::debug!("Ignoring discovery response from {} while leading", sender_id);
                return;
            }
            state.role = Role::Follower;
            state.leader_id = Some(leader_id.clone());
            state.election.clear();
            state.discovery_deadline = None;
            state.leader_watch.reset(now);
        }

        self.directory.touch(&leader_id, src, now);
        self.events.record(EventKind::LeaderFound {
            leader_id: leader_id.clone(),
        });
        tracing::info!("Found leader {} at {}", leader_id, src);
        self.republish();
    }

    fn handle_heartbeat(&self, sender_id: PeerId, role: Option<Role>, src: SocketAddr) {
        let now = self.clock.now();

        if role != Some(Role::Leader) {
            if self.role() == Role::Leader {
                self.record_contact(&sender_id, src);
            }
            return;
        }

        let change = {
            let mut state = self.state.lock();
            let change = match (state.role, state.leader_id.as_ref()) {
                (Role::Leader, _) if sender_id > self.id => LeaderChange::SteppedDown,
                (Role::Follower, Some(current)) if *current == sender_id => LeaderChange::Refreshed,
                (Role::Follower, Some(current)) if sender_id > *current => LeaderChange::Adopted,
                (Role::Follower, None) => LeaderChange::Adopted,
                _ => LeaderChange::None,
            };

            match change {
                LeaderChange::Refreshed => state.leader_watch.observe(now),
                LeaderChange::Adopted | LeaderChange::SteppedDown => {
                    state.role = Role::Follower;
                    state.leader_id = Some(sender_id.clone());
                    state.election.clear();
                    state.discovery_deadline = None;
                    state.resume_leadership = false;
                    state.leader_watch.reset(now);
                }
                LeaderChange::None => {}
            }
            change
        };

        match change {
            LeaderChange::None => {}
            LeaderChange::Refreshed => {
                self.directory.touch(&sender_id, src, now);
            }
            LeaderChange::Adopted => {
                self.directory.touch(&sender_id, src, now);
                self.catalog.clear();
                self.events.record(EventKind::LeaderFound {
                    leader_id: sender_id.clone(),
                });
                tracing::info!("Following leader {} after its heartbeat", sender_id);
                self.republish();
            }
            LeaderChange::SteppedDown => {
                self.directory.touch(&sender_id, src, now);
                self.catalog.clear();
                self.events.record(EventKind::SteppedDown {
                    to: sender_id.clone(),
                });
                tracing::warn!("Stepping down: {} is also leading and outranks us", sender_id);
                self.republish();
            }
        }
    }

    fn handle_election(&self, sender_id: PeerId) {
        let now = self.clock.now();
        let reaction = {
            let mut state = self.state.lock();
            let reaction = state.election.on_election(&self.id, &sender_id, now);
            if reaction == ElectionReaction::Yield {
                if state.role == Role::Leader {
                    state.leader_id = None;
                }
                state.role = Role::Follower;
                state.resume_leadership = false;
            }
            reaction
        };

        match reaction {
            ElectionReaction::Yield => {
                self.events.record(EventKind::ElectionYielded {
                    to: sender_id.clone(),
                });
                tracing::info!("Yielding to higher candidate {}", sender_id);
            }
            ElectionReaction::Compete => {
                tracing::info!("Lower candidate {} is running, competing", sender_id);
                self.start_election();
            }
            ElectionReaction::Ignore => {}
        }
    }

    fn handle_coordinator(&self, sender_id: PeerId, addr: SocketAddr) {
        let now = self.clock.now();
        {
            let mut state = self.state.lock();
            state.role = Role::Follower;
            state.leader_id = Some(sender_id.clone());
            state.election.clear();
            state.discovery_deadline = None;
            state.resume_leadership = false;
            state.leader_watch.reset(now);
        }

        self.directory.touch(&sender_id, addr, now);
        self.catalog.clear();
        self.events.record(EventKind::LeaderAnnounced {
            leader_id: sender_id.clone(),
        });
        tracing::info!("New leader announced: {} at {}", sender_id, addr);
        self.republish();
    }

    fn handle_publish(&self, sender_id: PeerId, files: FileSet, tcp_port: u16, src: SocketAddr) {
        if self.role() != Role::Leader {
            tracing::debug!("Ignoring PUBLISH from {}: not leader", sender_id);
            return;
        }

        self.record_contact(&sender_id, src);
        let host = src.ip().to_string();
        let count = self.catalog.publish(&sender_id, &host, tcp_port, files);
        self.bump_catalog();

        self.events.record(EventKind::FilesPublished {
            peer_id: sender_id.clone(),
            count,
        });
        tracing::info!("Catalog: {} published {} file(s) at {}:{}", sender_id, count, host, tcp_port);
    }

    fn handle_query_files(&self, sender_id: PeerId, src: SocketAddr) {
        if self.role() != Role::Leader {
            return;
        }

        let reply = Message::FileList {
            sender_id: self.id.clone(),
            catalog: self.catalog.snapshot(),
        };
        if let Err(e) = self.transport.send(&reply, src) {
            tracing::warn!("Failed to send FILE_LIST to {}: {}", sender_id, e);
        }
    }

    fn handle_file_list(&self, sender_id: PeerId, catalog: CatalogSnapshot) {
        if self.role() == Role::Leader {
            tracing::debug!("Ignoring FILE_LIST from {} while leading", sender_id);
            return;
        }

        let files = catalog.len();
        self.catalog.replace(catalog);
        self.bump_catalog();
        self.events.record(EventKind::CatalogReceived { files });
        tracing::debug!("Catalog view replaced: {} file(s) from {}", files, sender_id);
    }

    /// Stamps `peer_id` as alive in the directory.
    fn record_contact(&self, peer_id: &PeerId, src: SocketAddr) {
        if self.directory.touch(peer_id, src, self.clock.now()) {
            self.events.record(EventKind::PeerJoined {
                peer_id: peer_id.clone(),
            });
            tracing::info!("Peer {} joined from {}", peer_id, src);
        }
    }
}
