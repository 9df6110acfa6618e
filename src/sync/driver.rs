//! Sync Driver
//!
//! Processes one root at a time, one file at a time. The manifest is written
//! after every file that changed it, after the root completes, and before any
//! error is handed back, so a crash loses at most the file in flight.

use super::walker::{LocalFile, Walker};
use super::{destination, SyncRoot};
use crate::error::SyncError;
use crate::manifest::{FileIdentity, HistoryManifest, RemoteRecord};
use crate::remote::{RemoteFile, RemoteStore};
use crate::resolver::FolderResolver;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Per-root counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RootReport {
    pub uploaded: usize,
    pub updated: usize,
    pub unchanged: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Uploaded,
    Updated,
    Unchanged,
}

pub struct SyncDriver<'a> {
    store: &'a dyn RemoteStore,
    resolver: FolderResolver<'a>,
    root_folder_id: String,
    manifest_path: PathBuf,
    ignore_patterns: Vec<String>,
}

impl<'a> SyncDriver<'a> {
    pub fn new(
        store: &'a dyn RemoteStore,
        root_folder_id: impl Into<String>,
        manifest_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            resolver: FolderResolver::new(store),
            root_folder_id: root_folder_id.into(),
            manifest_path: manifest_path.into(),
            ignore_patterns: Vec::new(),
        }
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn with_strict_folder_match(mut self, strict: bool) -> Self {
        self.resolver = FolderResolver::new(self.store).strict(strict);
        self
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Mirror `root` into the remote store, recording results in `manifest`.
    ///
    /// Stops at the first failing file. Records made before the failure are
    /// kept and persisted.
    pub async fn run(
        &self,
        root: &SyncRoot,
        manifest: &mut HistoryManifest,
    ) -> Result<RootReport, SyncError> {
        match self.sync_root(root, manifest).await {
            Ok(report) => {
                manifest.persist(&self.manifest_path)?;
                info!(
                    root = %root.local_path.display(),
                    uploaded = report.uploaded,
                    updated = report.updated,
                    unchanged = report.unchanged,
                    "Root synchronized"
                );
                Ok(report)
            }
            Err(err) => {
                if let Err(persist_err) = manifest.persist(&self.manifest_path) {
                    error!(
                        path = %self.manifest_path.display(),
                        error = %persist_err,
                        "Failed to persist history manifest after sync error"
                    );
                }
                Err(err)
            }
        }
    }

    async fn sync_root(
        &self,
        root: &SyncRoot,
        manifest: &mut HistoryManifest,
    ) -> Result<RootReport, SyncError> {
        let local_root = dunce::canonicalize(&root.local_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SyncError::LocalPathMissing(root.local_path.clone())
            } else {
                SyncError::Io(e)
            }
        })?;

        let walker = Walker::new(local_root.clone())
            .with_ignore_patterns(self.ignore_patterns.clone());
        let manifest_file = self.manifest_file()?;
        let mut report = RootReport::default();

        for file in walker.files() {
            let file = file?;
            if file.path == manifest_file {
                debug!(path = %file.path.display(), "Skipping history manifest");
                continue;
            }
            match self.sync_file(root, &local_root, &file, manifest).await? {
                FileOutcome::Uploaded => {
                    report.uploaded += 1;
                    manifest.persist(&self.manifest_path)?;
                }
                FileOutcome::Updated => {
                    report.updated += 1;
                    manifest.persist(&self.manifest_path)?;
                }
                FileOutcome::Unchanged => report.unchanged += 1,
            }
        }

        Ok(report)
    }

    /// Canonical location of the manifest, so a root containing it does not
    /// upload it. The manifest and its parent directories may not exist yet.
    fn manifest_file(&self) -> Result<PathBuf, SyncError> {
        let absolute = if self.manifest_path.is_absolute() {
            self.manifest_path.clone()
        } else {
            std::env::current_dir()?.join(&self.manifest_path)
        };

        // Canonicalize the deepest existing ancestor and re-append the rest.
        let mut existing = absolute.as_path();
        let mut missing = Vec::new();
        loop {
            if let Ok(canonical) = dunce::canonicalize(existing) {
                let mut resolved = canonical;
                resolved.extend(missing.iter().rev());
                return Ok(resolved);
            }
            match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name);
                    existing = parent;
                }
                _ => break,
            }
        }
        Ok(absolute)
    }

    async fn sync_file(
        &self,
        root: &SyncRoot,
        local_root: &Path,
        file: &LocalFile,
        manifest: &mut HistoryManifest,
    ) -> Result<FileOutcome, SyncError> {
        let identity = FileIdentity::from_path(&file.path)?;

        match manifest.lookup(&identity) {
            None => {
                let dest = destination(local_root, &root.remote_path, &file.path)?;
                let content = read_content(&file.path)?;
                let folder_id = self
                    .resolver
                    .resolve(&dest.folders, &self.root_folder_id)
                    .await?;
                let created = self
                    .store
                    .create_file(&dest.title, &folder_id, content)
                    .await?;

                info!(
                    path = %file.path.display(),
                    remote = %format!("{}/{}", dest.folders.join("/"), dest.title),
                    remote_id = %created.id,
                    "Uploaded"
                );
                manifest.put(identity, to_record(created, file));
                Ok(FileOutcome::Uploaded)
            }
            Some(record) if record.last_update_at == file.modified => {
                debug!(path = %file.path.display(), "Unchanged");
                Ok(FileOutcome::Unchanged)
            }
            Some(record) => {
                let remote_id = record.remote_object_id.clone();
                let title = record.title.clone();
                let content = read_content(&file.path)?;
                let updated = self
                    .store
                    .update_file_content(&remote_id, &title, content)
                    .await?;

                info!(
                    path = %file.path.display(),
                    title = %title,
                    remote_id = %updated.id,
                    "Updated"
                );
                manifest.put(identity, to_record(updated, file));
                Ok(FileOutcome::Updated)
            }
        }
    }
}

fn to_record(remote: RemoteFile, file: &LocalFile) -> RemoteRecord {
    RemoteRecord {
        title: remote.title,
        last_update_at: file.modified,
        parent_folder_refs: remote.parent_refs.into_iter().collect(),
        remote_object_id: remote.id,
    }
}

/// Read the whole file; the handle is closed before this returns.
fn read_content(path: &Path) -> Result<Vec<u8>, SyncError> {
    let mut file = std::fs::File::open(path)?;
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(content)
}
