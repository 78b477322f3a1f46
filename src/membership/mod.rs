//! Membership & Discovery Module
//!
//! Keeps the local view of the group: who is out there, where to reach them,
//! and when each one last showed a sign of life.
//!
//! ## Core Mechanisms
//! - **Identity**: every peer draws a random `PeerId` at start; ids are totally
//!   ordered and the order decides elections.
//! - **Directory**: `PeerDirectory` is filled by DISCOVERY and HEARTBEAT contact
//!   and drained by the leader's liveness sweep.
//! - **Discovery**: the DISCOVERY / DISCOVERY_RESPONSE exchange itself is driven
//!   by `crate::peer`, which owns the sockets and the role state.

pub mod directory;
pub mod types;
