use dashmap::DashMap;

use super::types::{CatalogEntry, CatalogSnapshot, FileSet};
use crate::membership::types::PeerId;

/// Filename → hosting peers.
///
/// At the leader this is the authoritative catalog built from PUBLISH
/// messages. At a follower it holds the last FILE_LIST snapshot received.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: DashMap<String, Vec<CatalogEntry>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a publish from `peer_id`, reachable for transfers at
    /// `host:port`.
    ///
    /// For every announced filename the peer's previous entry is dropped and
    /// a fresh one appended, so the newest publish always wins. Files the
    /// peer announced earlier but left out this time are untouched.
    /// Returns the number of entries written.
    pub fn publish(&self, peer_id: &PeerId, host: &str, port: u16, files: FileSet) -> usize {
        let listing = files.into_listing();
        let written = listing.len();

        for (filename, meta) in listing {
            let mut hosts = self.entries.entry(filename).or_default();
            hosts.retain(|entry| &entry.peer_id != peer_id);
            hosts.push(CatalogEntry {
                peer_id: peer_id.clone(),
                host: host.to_string(),
                port,
                size: meta.size,
                hash: meta.hash,
            });
        }

        written
    }

    /// Drops every entry attributed to `peer_id`. Filenames left without a
    /// host disappear. Returns how many entries were removed.
    pub fn purge_peer(&self, peer_id: &PeerId) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, hosts| {
            let before = hosts.len();
            hosts.retain(|entry| &entry.peer_id != peer_id);
            removed += before - hosts.len();
            !hosts.is_empty()
        });
        removed
    }

    pub fn lookup(&self, filename: &str) -> Option<Vec<CatalogEntry>> {
        self.entries
            .get(filename)
            .map(|hosts| hosts.value().clone())
            .filter(|hosts| !hosts.is_empty())
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Swaps the whole content for `snapshot` (follower side of FILE_LIST).
    pub fn replace(&self, snapshot: CatalogSnapshot) {
        self.entries.clear();
        for (filename, hosts) in snapshot {
            if !hosts.is_empty() {
                self.entries.insert(filename, hosts);
            }
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
