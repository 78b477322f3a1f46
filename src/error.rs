//! Error taxonomy.
//!
//! Each concurrent unit catches failures at its own boundary and logs them;
//! only socket binding during construction is fatal to the caller.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Bind, send or receive failure on a datagram or stream socket.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind {what} on {addr}: {source}")]
    Bind {
        what: &'static str,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to send to {addr}: {source}")]
    Send {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// A control message that cannot be encoded or decoded.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("encoded message is {size} bytes, limit is {limit}")]
    Oversized { size: usize, limit: usize },
}

/// Aborted file transfer. The partial file, if any, is left on disk.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid file name {0:?}")]
    InvalidName(String),
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("peer closed the connection before sending a length header")]
    MissingHeader,
    #[error("transfer interrupted after {received} of {expected} bytes")]
    Incomplete { received: u64, expected: u64 },
    #[error("transfer i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Post-transfer hash mismatch. Reported as a warning; the file is kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("content hash mismatch: expected {expected}, got {actual}")]
pub struct IntegrityError {
    pub expected: String,
    pub actual: String,
}

/// Errors surfaced by the public peer operations.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    #[error("no leader known")]
    NoLeader,
    #[error("leader address unknown")]
    LeaderAddressUnknown,
    #[error("{filename:?} is not in the catalog")]
    CatalogMiss { filename: String },
    #[error("file {0} not found")]
    FileNotFound(PathBuf),
    #[error("timed out waiting for the catalog")]
    QueryTimeout,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = PeerError> = std::result::Result<T, E>;
