//! In-process [`RemoteStore`] that keeps objects in memory and records every
//! call made against it. Used to exercise the sync engine without a network.

use super::{ItemKind, RemoteFile, RemoteFolder, RemoteItem, RemoteStore};
use crate::error::SyncError;
use async_trait::async_trait;
use parking_lot::Mutex;

/// A call observed by the store, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListByTitle(String),
    CreateFolder { title: String, parent_id: String },
    CreateFile { title: String, parent_id: String },
    UpdateFileContent { id: String, title: String },
}

/// Stored remote object
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub id: String,
    pub title: String,
    pub kind: ItemKind,
    pub parents: Vec<String>,
    pub content: Vec<u8>,
}

#[derive(Default)]
struct State {
    objects: Vec<StoredObject>,
    calls: Vec<StoreCall>,
    next_id: u64,
    /// Remaining file writes (create or update) before writes start failing.
    file_write_budget: Option<usize>,
    listing_budget: Option<usize>,
    folder_create_budget: Option<usize>,
}

/// Memory-backed remote store
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a folder directly, without recording a call. Returns its id.
    pub fn seed_folder(&self, title: &str, parent_id: &str) -> String {
        let mut state = self.state.lock();
        Self::insert(&mut state, title, ItemKind::Folder, parent_id, Vec::new())
    }

    /// Allow `writes` more successful file writes; later ones are rejected.
    pub fn fail_file_writes_after(&self, writes: usize) {
        self.state.lock().file_write_budget = Some(writes);
    }

    /// Allow `listings` more successful title queries; later ones fail as if
    /// the store were unreachable.
    pub fn fail_listing_after(&self, listings: usize) {
        self.state.lock().listing_budget = Some(listings);
    }

    /// Allow `creates` more successful folder creations; later ones are rejected.
    pub fn fail_folder_creates_after(&self, creates: usize) {
        self.state.lock().folder_create_budget = Some(creates);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.state.lock().objects.clone()
    }

    pub fn object(&self, id: &str) -> Option<StoredObject> {
        self.state.lock().objects.iter().find(|o| o.id == id).cloned()
    }

    fn insert(
        state: &mut State,
        title: &str,
        kind: ItemKind,
        parent_id: &str,
        content: Vec<u8>,
    ) -> String {
        state.next_id += 1;
        let id = format!("obj-{}", state.next_id);
        state.objects.push(StoredObject {
            id: id.clone(),
            title: title.to_string(),
            kind,
            parents: vec![parent_id.to_string()],
            content,
        });
        id
    }

    /// Spend one unit of `budget`; `false` once it is exhausted.
    fn take_permit(budget: &mut Option<usize>) -> bool {
        match budget {
            Some(0) => false,
            Some(remaining) => {
                *remaining -= 1;
                true
            }
            None => true,
        }
    }

    fn take_write_permit(state: &mut State) -> Result<(), SyncError> {
        if Self::take_permit(&mut state.file_write_budget) {
            Ok(())
        } else {
            Err(SyncError::RemoteRejected {
                status: Some(500),
                message: "injected write failure".to_string(),
            })
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_by_title(&self, title: &str) -> Result<Vec<RemoteItem>, SyncError> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::ListByTitle(title.to_string()));
        if !Self::take_permit(&mut state.listing_budget) {
            return Err(SyncError::RemoteUnavailable(format!(
                "injected listing failure for '{}'",
                title
            )));
        }

        // Objects are kept in creation order; folders sort ahead of files.
        let mut items: Vec<RemoteItem> = state
            .objects
            .iter()
            .filter(|o| o.title == title)
            .map(|o| RemoteItem {
                id: o.id.clone(),
                title: o.title.clone(),
                kind: o.kind,
            })
            .collect();
        items.sort_by_key(|item| item.kind != ItemKind::Folder);
        Ok(items)
    }

    async fn create_folder(
        &self,
        title: &str,
        parent_id: &str,
    ) -> Result<RemoteFolder, SyncError> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::CreateFolder {
            title: title.to_string(),
            parent_id: parent_id.to_string(),
        });
        if !Self::take_permit(&mut state.folder_create_budget) {
            return Err(SyncError::RemoteRejected {
                status: Some(403),
                message: format!("injected folder create failure for '{}'", title),
            });
        }
        let id = Self::insert(&mut state, title, ItemKind::Folder, parent_id, Vec::new());
        Ok(RemoteFolder {
            id,
            title: title.to_string(),
        })
    }

    async fn create_file(
        &self,
        title: &str,
        parent_id: &str,
        content: Vec<u8>,
    ) -> Result<RemoteFile, SyncError> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::CreateFile {
            title: title.to_string(),
            parent_id: parent_id.to_string(),
        });
        Self::take_write_permit(&mut state)?;

        let id = Self::insert(&mut state, title, ItemKind::File, parent_id, content);
        Ok(RemoteFile {
            id,
            title: title.to_string(),
            parent_refs: vec![parent_id.to_string()],
        })
    }

    async fn update_file_content(
        &self,
        id: &str,
        title: &str,
        content: Vec<u8>,
    ) -> Result<RemoteFile, SyncError> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::UpdateFileContent {
            id: id.to_string(),
            title: title.to_string(),
        });
        Self::take_write_permit(&mut state)?;

        let object = state
            .objects
            .iter_mut()
            .find(|o| o.id == id && o.kind == ItemKind::File)
            .ok_or_else(|| SyncError::RemoteRejected {
                status: Some(404),
                message: format!("File not found: {}", id),
            })?;
        object.title = title.to_string();
        object.content = content;

        Ok(RemoteFile {
            id: object.id.clone(),
            title: object.title.clone(),
            parent_refs: object.parents.clone(),
        })
    }

    fn store_name(&self) -> &str {
        "memory"
    }
}
