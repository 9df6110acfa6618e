//! Sync engine
//!
//! Mirrors configured local roots into the remote store: new files are
//! uploaded, files whose modification time moved are re-sent to their existing
//! remote object, everything else is left alone.

use crate::error::SyncError;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

pub mod driver;
pub mod uploader;
pub mod walker;

pub use driver::{RootReport, SyncDriver};
pub use uploader::{SyncReport, Uploader};
pub use walker::{LocalFile, Walker};

/// A configured `(local path, remote path)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRoot {
    pub local_path: PathBuf,
    /// Slash-separated path below the configured remote root folder
    pub remote_path: String,
}

impl SyncRoot {
    pub fn new(local_path: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            remote_path: remote_path.into(),
        }
    }

    /// Fail with [`SyncError::LocalPathMissing`] if the local path is gone.
    pub fn check(&self) -> Result<(), SyncError> {
        match std::fs::metadata(&self.local_path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SyncError::LocalPathMissing(self.local_path.clone()))
            }
            Err(e) => Err(SyncError::Io(e)),
        }
    }
}

/// Where a local file lands remotely: the folder chain and the file's title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub folders: Vec<String>,
    pub title: String,
}

/// Map `file` (beneath `local_root`) to its remote destination by replacing the
/// root's local prefix with `remote_path`.
///
/// The last segment becomes the file title. When `local_root` is the file
/// itself, `remote_path` names the file; if that is empty the local file name
/// is used.
pub fn destination(
    local_root: &Path,
    remote_path: &str,
    file: &Path,
) -> Result<Destination, SyncError> {
    let relative = file.strip_prefix(local_root).map_err(|_| {
        SyncError::Traversal(format!(
            "{} is not beneath {}",
            file.display(),
            local_root.display()
        ))
    })?;

    let mut segments: Vec<String> = remote_path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    for component in relative.components() {
        if let Component::Normal(name) = component {
            segments.push(utf8_segment(name, file)?);
        }
    }

    let title = match segments.pop() {
        Some(title) => title,
        None => {
            let name = file.file_name().ok_or_else(|| {
                SyncError::Traversal(format!("{} has no file name", file.display()))
            })?;
            utf8_segment(name, file)?
        }
    };

    Ok(Destination {
        folders: segments,
        title,
    })
}

fn utf8_segment(name: &OsStr, file: &Path) -> Result<String, SyncError> {
    name.to_str().map(str::to_string).ok_or_else(|| {
        SyncError::Traversal(format!("{} is not valid UTF-8", file.display()))
    })
}
