//! Local tree traversal for a sync root

use crate::error::SyncError;
use chrono::{DateTime, Utc};
use std::path::{Component, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A non-directory entry found under a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

/// Filesystem walker
///
/// Visits entries depth-first in filesystem enumeration order. A root that is
/// itself a file yields exactly that file. Symbolic links are not followed.
pub struct Walker {
    root: PathBuf,
    ignore_patterns: Vec<String>,
}

impl Walker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ignore_patterns: Vec::new(),
        }
    }

    /// Skip any entry with a path component (below the root) equal to one of
    /// `patterns`.
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Lazily yield every file. Traversal errors surface at the point they
    /// occur, after the files visited before them.
    pub fn files(&self) -> impl Iterator<Item = Result<LocalFile, SyncError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |entry| !self.should_ignore(entry))
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_dir() => None,
                Ok(entry) => Some(Self::to_local_file(entry)),
                Err(e) => Some(Err(SyncError::from(e))),
            })
    }

    fn to_local_file(entry: DirEntry) -> Result<LocalFile, SyncError> {
        let metadata = entry.metadata()?;
        let modified = metadata.modified()?;
        Ok(LocalFile {
            path: entry.into_path(),
            modified: DateTime::<Utc>::from(modified),
        })
    }

    fn should_ignore(&self, entry: &DirEntry) -> bool {
        if self.ignore_patterns.is_empty() {
            return false;
        }
        let Ok(relative) = entry.path().strip_prefix(&self.root) else {
            return false;
        };

        relative.components().any(|component| match component {
            Component::Normal(name) => {
                let name = name.to_string_lossy();
                self.ignore_patterns.iter().any(|p| p.as_str() == name)
            }
            _ => false,
        })
    }
}
