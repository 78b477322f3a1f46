use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use crate::catalog::types::FileMeta;
use crate::config::CHUNK_SIZE;
use crate::error::{PeerError, TransferError};

/// The local shared directory: what this peer publishes and serves.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens `root`, creating it when missing.
    pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Regular, non-hidden files of the shared directory with their size and
    /// SHA-256. Files that vanish or fail to read mid-scan are skipped.
    pub async fn list_files(&self) -> std::io::Result<BTreeMap<String, FileMeta>> {
        let mut files = BTreeMap::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;

        while let Some(entry) = dir.next_entry().await? {
            let name = match entry.file_name().into_string() {
                Ok(name) if !name.starts_with('.') => name,
                _ => continue,
            };
            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                _ => continue,
            };

            match hash_file(&entry.path()).await {
                Ok(hash) => {
                    files.insert(
                        name,
                        FileMeta {
                            size: metadata.len(),
                            hash: Some(hash),
                        },
                    );
                }
                Err(e) => tracing::warn!("Skipping {}: {}", name, e),
            }
        }

        Ok(files)
    }

    /// Copies `source` into the shared directory and returns its file name.
    /// A source that already is the shared copy is left alone.
    pub async fn share_file(&self, source: &Path) -> Result<String, PeerError> {
        let metadata = match tokio::fs::metadata(source).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return Err(PeerError::FileNotFound(source.to_path_buf())),
        };

        let name = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| PeerError::FileNotFound(source.to_path_buf()))?
            .to_string();
        validate_file_name(&name)?;

        let target = self.root.join(&name);
        if !self.is_same_file(source, &target).await {
            tokio::fs::copy(source, &target).await?;
            tracing::info!("Shared {} ({} bytes)", name, metadata.len());
        }

        Ok(name)
    }

    /// Path of a shared file by name. Anything other than a plain file name
    /// is refused.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, TransferError> {
        validate_file_name(name)?;
        Ok(self.root.join(name))
    }

    async fn is_same_file(&self, a: &Path, b: &Path) -> bool {
        match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

/// A transferable name is a single path component.
pub fn validate_file_name(name: &str) -> Result<(), TransferError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(TransferError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Hex SHA-256 of a file, read in fixed-size blocks.
pub async fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}
