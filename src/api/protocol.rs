//! Control API Protocol
//!
//! Endpoints and DTOs of the local HTTP surface the console uses. Nothing
//! here is spoken between peers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::catalog::types::{CatalogSnapshot, FileMeta};
use crate::files::download::{CandidatePolicy, DownloadReport};
use crate::peer::events::PeerEvent;

// --- API Endpoints ---

/// Role, leader and counters of this peer.
pub const ENDPOINT_STATUS: &str = "/status";
/// Event stream, `?since=<seq>`.
pub const ENDPOINT_EVENTS: &str = "/events";
/// Files in the local shared directory.
pub const ENDPOINT_FILES: &str = "/files";
/// The catalog as this peer currently sees it.
pub const ENDPOINT_CATALOG: &str = "/catalog";
pub const ENDPOINT_SHARE: &str = "/share";
pub const ENDPOINT_PUBLISH: &str = "/publish";
/// Refreshes the catalog view from the leader.
pub const ENDPOINT_QUERY: &str = "/query";
pub const ENDPOINT_DOWNLOAD: &str = "/download";

// --- Data Transfer Objects ---

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub since: u64,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub latest_seq: u64,
    pub events: Vec<PeerEvent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilesResponse {
    pub files: BTreeMap<String, FileMeta>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub catalog: CatalogSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareRequest {
    pub path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareResponse {
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    pub published: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// How long to wait for the leader's reply. Defaults to 2000 ms.
    #[serde(default)]
    pub wait_ms: Option<u64>,
}

/// Either `host` and `port` together (direct) or neither (catalog lookup).
#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadBody {
    pub filename: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub save_dir: Option<PathBuf>,
    #[serde(default)]
    pub policy: CandidatePolicy,
    #[serde(default)]
    pub expected_hash: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    #[serde(flatten)]
    pub report: DownloadReport,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
