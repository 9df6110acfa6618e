//! Remote Store Abstraction
//!
//! The capability the sync engine needs from a hierarchical object store:
//! look objects up by title, create folders, create files and replace file
//! content. Implementations propagate failures; nothing here retries.

use crate::error::SyncError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod drive;
pub mod memory;

pub use drive::DriveClient;
pub use memory::{MemoryStore, StoreCall};

/// Kind of a remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Folder,
    File,
}

/// Entry returned by a title listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub id: String,
    pub title: String,
    pub kind: ItemKind,
}

/// A freshly created folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFolder {
    pub id: String,
    pub title: String,
}

/// A file object after create or content replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub title: String,
    pub parent_refs: Vec<String>,
}

/// Remote store client trait
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List every object titled `title`, folders first, then by creation time.
    ///
    /// The query is not scoped to any parent folder.
    async fn list_by_title(&self, title: &str) -> Result<Vec<RemoteItem>, SyncError>;

    /// Create a folder named `title` under `parent_id`.
    async fn create_folder(&self, title: &str, parent_id: &str)
        -> Result<RemoteFolder, SyncError>;

    /// Create a file object with `content` under `parent_id`.
    async fn create_file(
        &self,
        title: &str,
        parent_id: &str,
        content: Vec<u8>,
    ) -> Result<RemoteFile, SyncError>;

    /// Replace the content of the file object `id`, keeping its title.
    async fn update_file_content(
        &self,
        id: &str,
        title: &str,
        content: Vec<u8>,
    ) -> Result<RemoteFile, SyncError>;

    /// Short name used in log output.
    fn store_name(&self) -> &str;
}
