//! Folder Resolver
//!
//! Walks a remote-relative folder path segment by segment, adopting an existing
//! folder whose title matches or creating one under the current parent.
//!
//! Title lookups are not scoped to the current parent: a same-titled object
//! anywhere in the store is adopted. Nothing is cached between calls, so every
//! file pays one listing per path segment.

use crate::error::SyncError;
use crate::remote::{ItemKind, RemoteItem, RemoteStore};
use tracing::{debug, warn};

pub struct FolderResolver<'a> {
    store: &'a dyn RemoteStore,
    strict: bool,
}

impl<'a> FolderResolver<'a> {
    pub fn new(store: &'a dyn RemoteStore) -> Self {
        Self {
            store,
            strict: false,
        }
    }

    /// Fail with [`SyncError::RemoteAmbiguousMatch`] instead of adopting the
    /// first of several (or a non-folder) title matches.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Resolve `segments` beneath `root_folder_id` and return the id of the
    /// deepest folder, creating missing folders on the way.
    ///
    /// An empty path resolves to `root_folder_id` itself.
    pub async fn resolve(
        &self,
        segments: &[String],
        root_folder_id: &str,
    ) -> Result<String, SyncError> {
        let mut parent_id = root_folder_id.to_string();

        for segment in segments {
            let listed = self.store.list_by_title(segment).await?;
            let matches: Vec<&RemoteItem> =
                listed.iter().filter(|item| item.title == *segment).collect();

            parent_id = match self.pick(segment, &matches)? {
                Some(item) => {
                    debug!(title = %segment, folder_id = %item.id, "Adopting existing folder");
                    item.id.clone()
                }
                None => {
                    let created = self.store.create_folder(segment, &parent_id).await?;
                    debug!(title = %segment, folder_id = %created.id, parent_id = %parent_id, "Created folder");
                    created.id
                }
            };
        }

        Ok(parent_id)
    }

    fn pick<'m>(
        &self,
        segment: &str,
        matches: &[&'m RemoteItem],
    ) -> Result<Option<&'m RemoteItem>, SyncError> {
        let Some(first) = matches.first() else {
            return Ok(None);
        };

        let suspicious = matches.len() > 1 || first.kind != ItemKind::Folder;
        if suspicious {
            if self.strict {
                return Err(SyncError::RemoteAmbiguousMatch {
                    title: segment.to_string(),
                    matches: matches.len(),
                });
            }
            warn!(
                title = %segment,
                matches = matches.len(),
                adopted = %first.id,
                "Folder title is not unique in the remote store; adopting first match"
            );
        }

        Ok(Some(*first))
    }
}
