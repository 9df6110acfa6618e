//! Error types for the drivesync engine.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`SyncError`], used by callers that only care
/// about which failure class aborted a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LocalPathMissing,
    CorruptState,
    RemoteUnavailable,
    RemoteRejected,
    RemoteAmbiguousMatch,
    Local,
    Config,
}

/// Errors raised while checking, preparing or running a sync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Local path does not exist: {0}")]
    LocalPathMissing(PathBuf),

    #[error("History manifest at {path} is corrupt: {message}")]
    CorruptState { path: PathBuf, message: String },

    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Remote store rejected request{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    RemoteRejected {
        status: Option<u16>,
        message: String,
    },

    #[error("Title '{title}' matched {matches} remote objects")]
    RemoteAmbiguousMatch { title: String, matches: usize },

    #[error("Failed to traverse local tree: {0}")]
    Traversal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::LocalPathMissing(_) => ErrorKind::LocalPathMissing,
            SyncError::CorruptState { .. } => ErrorKind::CorruptState,
            SyncError::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            SyncError::RemoteRejected { .. } => ErrorKind::RemoteRejected,
            SyncError::RemoteAmbiguousMatch { .. } => ErrorKind::RemoteAmbiguousMatch,
            SyncError::Traversal(_) | SyncError::Io(_) => ErrorKind::Local,
            SyncError::ConfigError(_) => ErrorKind::Config,
        }
    }

    /// Whether the failure came from talking to the remote store.
    pub fn is_remote(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RemoteUnavailable
                | ErrorKind::RemoteRejected
                | ErrorKind::RemoteAmbiguousMatch
        )
    }
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        SyncError::ConfigError(err.to_string())
    }
}

impl From<walkdir::Error> for SyncError {
    fn from(err: walkdir::Error) -> Self {
        let path = err
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        SyncError::Traversal(format!("{}: {}", path, err))
    }
}
