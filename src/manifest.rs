//! History Manifest
//!
//! Durable mapping from local file identity to the remote object that file was
//! last uploaded as. Loaded once per run, mutated in memory, and written back
//! wholesale so an interrupted run resumes past everything already recorded.

use crate::error::SyncError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

/// Canonical local path of a file, used as the manifest key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileIdentity(String);

impl FileIdentity {
    /// Paths that are not valid UTF-8 have no identity; a lossy conversion
    /// would let two distinct files share one key.
    pub fn from_path(path: &Path) -> Result<Self, SyncError> {
        path.to_str()
            .map(|s| FileIdentity(s.to_string()))
            .ok_or_else(|| {
                SyncError::Traversal(format!("{} is not valid UTF-8", path.display()))
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last known remote state of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub title: String,
    /// Local modification time observed when the content was last sent.
    pub last_update_at: DateTime<Utc>,
    #[serde(default)]
    pub parent_folder_refs: BTreeSet<String>,
    pub remote_object_id: String,
}

/// In-memory manifest. Single writer; no locking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryManifest {
    records: BTreeMap<FileIdentity, RemoteRecord>,
}

impl HistoryManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the manifest stored at `location`.
    ///
    /// A missing file yields an empty manifest. Unparseable content is
    /// reported as [`SyncError::CorruptState`].
    pub fn load(location: &Path) -> Result<Self, SyncError> {
        let bytes = match std::fs::read(location) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %location.display(), "No history manifest found, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(SyncError::Io(e)),
        };

        let records: BTreeMap<FileIdentity, RemoteRecord> = serde_json::from_slice(&bytes)
            .map_err(|e| SyncError::CorruptState {
                path: location.to_path_buf(),
                message: e.to_string(),
            })?;

        tracing::debug!(path = %location.display(), records = records.len(), "Loaded history manifest");
        Ok(Self { records })
    }

    pub fn lookup(&self, identity: &FileIdentity) -> Option<&RemoteRecord> {
        self.records.get(identity)
    }

    /// Insert or replace the record for `identity`. In-memory only.
    pub fn put(&mut self, identity: FileIdentity, record: RemoteRecord) {
        self.records.insert(identity, record);
    }

    /// Overwrite `location` with the full manifest.
    pub fn persist(&self, location: &Path) -> Result<(), SyncError> {
        let json = serde_json::to_vec_pretty(&self.records).map_err(|e| {
            SyncError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to serialize history manifest: {}", e),
            ))
        })?;

        if let Some(parent) = location.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(location, json)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FileIdentity, &RemoteRecord)> {
        self.records.iter()
    }
}
