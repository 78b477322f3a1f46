use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::store::hash_file;
use crate::catalog::types::CatalogEntry;
use crate::error::IntegrityError;

/// Where to fetch a file from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSource {
    Direct { host: String, port: u16 },
    /// Look the file up in the local catalog view and pick a host.
    Catalog(CandidatePolicy),
}

/// Which catalog entry to download from when several peers host a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePolicy {
    #[default]
    First,
    /// The peer that published the file last.
    MostRecent,
    Random,
}

impl CandidatePolicy {
    pub fn select<'a>(&self, candidates: &'a [CatalogEntry]) -> Option<&'a CatalogEntry> {
        match self {
            CandidatePolicy::First => candidates.first(),
            CandidatePolicy::MostRecent => candidates.last(),
            CandidatePolicy::Random => candidates.choose(&mut rand::thread_rng()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub filename: String,
    pub source: DownloadSource,
    /// Defaults to the shared directory.
    pub save_dir: Option<PathBuf>,
    /// Overrides the hash taken from the catalog.
    pub expected_hash: Option<String>,
}

impl DownloadRequest {
    pub fn from_catalog(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            source: DownloadSource::Catalog(CandidatePolicy::default()),
            save_dir: None,
            expected_hash: None,
        }
    }

    pub fn direct(filename: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            filename: filename.into(),
            source: DownloadSource::Direct {
                host: host.into(),
                port,
            },
            save_dir: None,
            expected_hash: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
    Verified,
    Mismatch { expected: String, actual: String },
    /// No expected hash was known.
    Skipped,
}

impl Verification {
    pub fn integrity_error(&self) -> Option<IntegrityError> {
        match self {
            Verification::Mismatch { expected, actual } => Some(IntegrityError {
                expected: expected.clone(),
                actual: actual.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    pub filename: String,
    pub path: PathBuf,
    pub host: String,
    pub port: u16,
    pub bytes: u64,
    pub verification: Verification,
}

/// Recomputes the hash of a downloaded file and compares it with
/// `expected`. The file is kept either way.
pub async fn verify(path: &Path, expected: Option<&str>) -> std::io::Result<Verification> {
    let Some(expected) = expected else {
        return Ok(Verification::Skipped);
    };

    let actual = hash_file(path).await?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(Verification::Verified)
    } else {
        Ok(Verification::Mismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}
