use crate::membership::types::PeerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata a peer announces for one of its shared files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMeta {
    #[serde(default)]
    pub size: u64,
    /// Lowercase hex SHA-256 of the content. `None` for entries published by
    /// peers that only announce names.
    #[serde(default)]
    pub hash: Option<String>,
}

/// The `files` payload of a PUBLISH.
///
/// Current publishers send a name → metadata map; older ones send a bare
/// list of names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FileSet {
    Listing(BTreeMap<String, FileMeta>),
    Names(Vec<String>),
}

impl FileSet {
    pub fn into_listing(self) -> BTreeMap<String, FileMeta> {
        match self {
            FileSet::Listing(listing) => listing,
            FileSet::Names(names) => names
                .into_iter()
                .map(|name| (name, FileMeta::default()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FileSet::Listing(listing) => listing.len(),
            FileSet::Names(names) => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One hosting peer of one file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub peer_id: PeerId,
    pub host: String,
    pub port: u16,
    pub size: u64,
    pub hash: Option<String>,
}

/// Full catalog as shipped in FILE_LIST: filename → hosting peers, oldest
/// publish first.
pub type CatalogSnapshot = BTreeMap<String, Vec<CatalogEntry>>;
