//! Peer-to-Peer File Sharing Library
//!
//! A self-organizing group of peers elects one leader, the leader keeps a
//! catalog of which peer hosts which file, and files move directly between
//! peers over TCP.
//!
//! ## Architecture Modules
//! - **`transport`**: best-effort UDP unicast/broadcast, an in-memory test
//!   network behind the same trait, and length-prefixed TCP framing.
//! - **`membership`**: peer identity, roles and the peer directory.
//! - **`election`**: timeout-driven election where the highest id wins.
//! - **`heartbeat`**: leader and follower liveness tracking.
//! - **`catalog`**: the leader-held filename → hosting peers table.
//! - **`files`**: the shared directory, direct transfers and hash checks.
//! - **`peer`**: the aggregate that owns all state and runs the workers.
//! - **`api`**: local HTTP control surface for the console.
//! - **`config`**, **`error`**, **`clock`**: configuration, error types and
//!   injectable time.

pub mod api;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod election;
pub mod error;
pub mod files;
pub mod heartbeat;
pub mod membership;
pub mod peer;
pub mod transport;
