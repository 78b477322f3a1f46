//! Heartbeat & Failure Detector
//!
//! Liveness runs in both directions:
//! - the leader broadcasts `HEARTBEAT{role=LEADER}` and followers track its
//!   age with a `LeaderWatch`; a stale watch triggers a new election.
//! - followers unicast `HEARTBEAT` to the leader, which stamps them in the
//!   directory; `sweep_dead_peers` evicts the silent ones along with their
//!   catalog entries.
//!
//! Scheduling of both sides lives in `crate::peer::tasks`.

pub mod detector;

#[cfg(test)]
mod tests;
