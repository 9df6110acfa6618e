//! CLI output: error mapping from domain errors to the CLI surface.

use crate::error::{ErrorKind, SyncError};

/// Map engine errors to a string for CLI output, adding a hint where the
/// operator can act on it.
pub fn map_error(e: &SyncError) -> String {
    match e.kind() {
        ErrorKind::LocalPathMissing => {
            format!("{}\n  hint: fix the 'from' entry in the uploads list", e)
        }
        ErrorKind::CorruptState => format!(
            "{}\n  hint: restore or remove the history file; removing it re-uploads everything",
            e
        ),
        _ if e.is_remote() => format!(
            "{}\n  hint: completed uploads are kept in the history file; rerun to resume",
            e
        ),
        _ => e.to_string(),
    }
}
