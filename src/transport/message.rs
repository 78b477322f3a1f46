use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::catalog::types::{CatalogSnapshot, FileSet};
use crate::error::ProtocolError;
use crate::membership::types::{PeerId, Role};

/// The control protocol exchanged as UDP datagrams.
///
/// Encoded as JSON objects tagged by `type`
/// (e.g. `{"type":"ELECTION","sender_id":"..."}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Broadcast by a starting peer looking for the leader.
    Discovery { sender_id: PeerId, addr: SocketAddr },

    /// Unicast by the leader to a DISCOVERY sender.
    DiscoveryResponse { sender_id: PeerId, leader_id: PeerId },

    /// Broadcast by the leader with `role = LEADER`, unicast by followers to
    /// the leader without a role. Older followers name the id `peer_id`.
    Heartbeat {
        #[serde(alias = "peer_id")]
        sender_id: PeerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<Role>,
    },

    Election { sender_id: PeerId },

    /// Broadcast by the winner of an election.
    Coordinator { sender_id: PeerId, addr: SocketAddr },

    Publish {
        sender_id: PeerId,
        files: FileSet,
        tcp_port: u16,
    },

    QueryFiles { sender_id: PeerId },

    FileList {
        sender_id: PeerId,
        catalog: CatalogSnapshot,
    },
}

impl Message {
    pub fn sender_id(&self) -> &PeerId {
        match self {
            Message::Discovery { sender_id, .. }
            | Message::DiscoveryResponse { sender_id, .. }
            | Message::Heartbeat { sender_id, .. }
            | Message::Election { sender_id }
            | Message::Coordinator { sender_id, .. }
            | Message::Publish { sender_id, .. }
            | Message::QueryFiles { sender_id }
            | Message::FileList { sender_id, .. } => sender_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Message::Discovery { .. } => "DISCOVERY",
            Message::DiscoveryResponse { .. } => "DISCOVERY_RESPONSE",
            Message::Heartbeat { .. } => "HEARTBEAT",
            Message::Election { .. } => "ELECTION",
            Message::Coordinator { .. } => "COORDINATOR",
            Message::Publish { .. } => "PUBLISH",
            Message::QueryFiles { .. } => "QUERY_FILES",
            Message::FileList { .. } => "FILE_LIST",
        }
    }

    /// Encodes to a datagram, refusing anything larger than `limit` bytes.
    pub fn encode(&self, limit: usize) -> Result<Vec<u8>, ProtocolError> {
        let bytes = serde_json::to_vec(self)?;
        if bytes.len() > limit {
            return Err(ProtocolError::Oversized {
                size: bytes.len(),
                limit,
            });
        }
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
