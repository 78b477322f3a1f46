//! Election Engine
//!
//! Timeout-driven leader election where the highest identifier wins.
//!
//! A candidate broadcasts ELECTION and arms a decision deadline. Hearing a
//! higher candidate makes it yield; hearing a lower one while idle makes it
//! run its own round. Whoever is still a candidate when its deadline
//! passes declares victory and broadcasts COORDINATOR.
//!
//! Convergence depends on every broadcast landing inside the decision
//! window. When one is missed two leaders can coexist for a while; the
//! leader heartbeat override in `crate::peer` settles it.

pub mod engine;

#[cfg(test)]
mod tests;
