//! Catalog Service
//!
//! The leader-held directory of shared files. Peers PUBLISH what they host,
//! anyone may QUERY_FILES for a full snapshot, and the leader purges a
//! peer's entries when the liveness sweep evicts it.
//!
//! The catalog is never replicated: a new leader starts empty and is
//! refilled by fresh publishes.

pub mod service;
pub mod types;

#[cfg(test)]
mod tests;
