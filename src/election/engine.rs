use std::time::{Duration, Instant};

use crate::config::Timings;
use crate::membership::types::PeerId;

/// Where the local peer stands in the current election round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionPhase {
    Idle,
    Electing { started_at: Instant, decide_at: Instant },
    /// Saw a higher candidate; waiting for its COORDINATOR.
    Yielded { since: Instant, retry_at: Instant },
}

/// What the caller should do about an incoming ELECTION.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionReaction {
    /// A higher id is running; stand down.
    Yield,
    /// A lower id is running and we are idle; run our own round.
    Compete,
    Ignore,
}

/// Outcome of checking the round's deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionOutcome {
    /// The decision window closed with nobody higher heard: we won.
    Victory,
    /// We yielded and the COORDINATOR never came.
    YieldExpired,
    Pending,
}

/// Bully-style election, highest id wins.
///
/// There is no explicit vote: a candidate wins by not hearing from anyone
/// higher before its decision deadline. The engine holds no sockets; it
/// only keeps the phase and the deadlines, and the caller polls it.
#[derive(Debug, Clone)]
pub struct ElectionEngine {
    phase: ElectionPhase,
    election_timeout: Duration,
    yield_timeout: Duration,
    rounds_started: u64,
}

impl ElectionEngine {
    pub fn new(timings: &Timings) -> Self {
        Self {
            phase: ElectionPhase::Idle,
            election_timeout: timings.election_timeout,
            yield_timeout: timings.yield_timeout,
            rounds_started: 0,
        }
    }

    pub fn phase(&self) -> ElectionPhase {
        self.phase
    }

    pub fn is_electing(&self) -> bool {
        matches!(self.phase, ElectionPhase::Electing { .. })
    }

    /// Total rounds this peer has opened.
    pub fn rounds_started(&self) -> u64 {
        self.rounds_started
    }

    /// Opens a round and arms the decision deadline. Returns `false` when a
    /// round is already open; the caller broadcasts ELECTION only on `true`.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.is_electing() {
            return false;
        }
        self.phase = ElectionPhase::Electing {
            started_at: now,
            decide_at: now + self.election_timeout,
        };
        self.rounds_started += 1;
        true
    }

    /// Reacts to `ELECTION` from `sender`.
    ///
    /// A lower candidate only provokes a competing round from a fully idle
    /// peer: one that already yielded leaves the field to the higher id.
    pub fn on_election(&mut self, self_id: &PeerId, sender: &PeerId, now: Instant) -> ElectionReaction {
        if sender > self_id {
            self.phase = ElectionPhase::Yielded {
                since: now,
                retry_at: now + self.yield_timeout,
            };
            ElectionReaction::Yield
        } else if sender < self_id && self.phase == ElectionPhase::Idle {
            ElectionReaction::Compete
        } else {
            ElectionReaction::Ignore
        }
    }

    /// Checks the armed deadline. Either deadline fires once and returns the
    /// engine to `Idle`.
    pub fn poll(&mut self, now: Instant) -> ElectionOutcome {
        match self.phase {
            ElectionPhase::Electing { decide_at, .. } if now >= decide_at => {
                self.phase = ElectionPhase::Idle;
                ElectionOutcome::Victory
            }
            ElectionPhase::Yielded { retry_at, .. } if now >= retry_at => {
                self.phase = ElectionPhase::Idle;
                ElectionOutcome::YieldExpired
            }
            _ => ElectionOutcome::Pending,
        }
    }

    /// Drops any round in flight (a COORDINATOR was seen).
    pub fn clear(&mut self) {
        self.phase = ElectionPhase::Idle;
    }
}
