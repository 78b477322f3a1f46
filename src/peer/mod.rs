//! Peer Aggregate
//!
//! `PeerNode` owns all coordination state of one peer (role, leader,
//! election round, directory, catalog) and is the only thing the control
//! API and the binary talk to.
//!
//! ## Core Mechanisms
//! - **Dispatch**: both receive loops call `handle_message`, an exhaustive
//!   match over the message set. Handlers are synchronous and never hold the
//!   coordination lock while sending.
//! - **Deadlines**: discovery and election timeouts are instants stored in
//!   the state and fired by `poll_deadlines` against the injected clock.
//! - **Periodic workers**: heartbeats, the leader's liveness sweep and the
//!   followers' leader check run as independent tokio tasks.
//! - **Leader change**: the catalog is discarded and peers that published
//!   before replay their last listing to the new leader.
//!
//! ## Submodules
//! - **`node`**: construction and public operations.
//! - **`handlers`**: one handler per control message.
//! - **`tasks`**: background loops and the cycles they run.
//! - **`events`**: bounded event stream for the console.

pub mod events;
pub mod handlers;
pub mod node;
pub mod tasks;
pub mod types;
