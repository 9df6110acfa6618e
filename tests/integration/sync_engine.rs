//! Integration tests for the sync engine against the in-memory store

use super::test_utils::{fixed_time, identity, mtime, set_mtime, Workspace};
use chrono::{DateTime, Utc};
use drivesync::error::SyncError;
use drivesync::manifest::HistoryManifest;
use drivesync::remote::{ItemKind, MemoryStore, StoreCall};
use drivesync::sync::{SyncDriver, SyncRoot, Uploader};
use std::fs;

/// Running twice with no local changes performs no remote calls the second time.
#[tokio::test]
async fn test_second_run_without_changes_is_silent() {
    let ws = Workspace::new();
    ws.write("src/a.txt", "a");
    ws.write("src/nested/b.txt", "b");
    ws.write("src/nested/deeper/c.txt", "c");
    let config = ws.config(&[("src", "dest")]);
    let store = MemoryStore::new();

    let mut first = Uploader::new(&config, &store);
    first.check().unwrap();
    first.prepare().unwrap();
    let report = first.run().await.unwrap();
    assert_eq!(report.totals().uploaded, 3);
    assert!(store.call_count() > 0);

    store.clear_calls();
    let mut second = Uploader::new(&config, &store);
    second.prepare().unwrap();
    let report = second.run().await.unwrap();

    assert_eq!(store.call_count(), 0);
    assert_eq!(report.totals().unchanged, 3);
    assert_eq!(report.totals().uploaded + report.totals().updated, 0);
}

/// Modification time is the only change signal.
#[tokio::test]
async fn test_content_change_with_same_mtime_is_not_uploaded() {
    let ws = Workspace::new();
    let file = ws.write("src/a.txt", "original");
    set_mtime(&file, fixed_time(0));
    let config = ws.config(&[("src", "dest")]);
    let store = MemoryStore::new();

    Uploader::new(&config, &store).run().await.unwrap();

    fs::write(&file, "rewritten with different bytes").unwrap();
    set_mtime(&file, fixed_time(0));
    store.clear_calls();

    let report = Uploader::new(&config, &store).run().await.unwrap();
    assert_eq!(store.call_count(), 0);
    assert_eq!(report.totals().unchanged, 1);

    let file_object = store
        .objects()
        .into_iter()
        .find(|o| o.kind == ItemKind::File)
        .unwrap();
    assert_eq!(file_object.content, b"original".to_vec());
}

/// `root/a/b/c.txt` with root mapped to `dest` resolves dest, a, b in order
/// and creates `c.txt` under `b`.
#[tokio::test]
async fn test_new_file_resolves_folders_in_order() {
    let ws = Workspace::new();
    ws.write("root/a/b/c.txt", "content");
    let store = MemoryStore::new();
    let driver = SyncDriver::new(&store, "top", ws.history_file());
    let mut manifest = HistoryManifest::new();

    driver
        .run(&SyncRoot::new(ws.path().join("root"), "dest"), &mut manifest)
        .await
        .unwrap();

    assert_eq!(
        store.calls(),
        vec![
            StoreCall::ListByTitle("dest".into()),
            StoreCall::CreateFolder { title: "dest".into(), parent_id: "top".into() },
            StoreCall::ListByTitle("a".into()),
            StoreCall::CreateFolder { title: "a".into(), parent_id: "obj-1".into() },
            StoreCall::ListByTitle("b".into()),
            StoreCall::CreateFolder { title: "b".into(), parent_id: "obj-2".into() },
            StoreCall::CreateFile { title: "c.txt".into(), parent_id: "obj-3".into() },
        ]
    );

    let record = manifest
        .lookup(&identity(&ws.path().join("root/a/b/c.txt")))
        .unwrap();
    assert_eq!(record.title, "c.txt");
    assert!(record.parent_folder_refs.contains("obj-3"));
}

/// Existing folders are adopted instead of created.
#[tokio::test]
async fn test_existing_folders_are_reused() {
    let ws = Workspace::new();
    ws.write("root/a/one.txt", "1");
    let store = MemoryStore::new();
    let dest = store.seed_folder("dest", "top");
    let driver = SyncDriver::new(&store, "top", ws.history_file());

    driver
        .run(&SyncRoot::new(ws.path().join("root"), "dest"), &mut HistoryManifest::new())
        .await
        .unwrap();

    let created_folders: Vec<StoreCall> = store
        .calls()
        .into_iter()
        .filter(|c| matches!(c, StoreCall::CreateFolder { .. }))
        .collect();
    assert_eq!(
        created_folders,
        vec![StoreCall::CreateFolder { title: "a".into(), parent_id: dest }]
    );
}

/// When the N-th upload fails, the persisted manifest holds exactly the first
/// N-1 files and the run reports the error.
#[tokio::test]
async fn test_failure_keeps_records_of_completed_files() {
    let ws = Workspace::new();
    ws.write("src/one.txt", "1");
    ws.write("src/two.txt", "2");
    ws.write("src/three.txt", "3");
    ws.write("src/four.txt", "4");
    let config = ws.config(&[("src", "dest")]);
    let store = MemoryStore::new();
    store.fail_file_writes_after(2);

    let err = Uploader::new(&config, &store).run().await.unwrap_err();
    assert!(matches!(err, SyncError::RemoteRejected { .. }));

    let persisted = HistoryManifest::load(&ws.history_file()).unwrap();
    assert_eq!(persisted.len(), 2);
    for (_, record) in persisted.iter() {
        assert!(store.object(&record.remote_object_id).is_some());
    }

    // The next run resumes past the recorded files.
    store.fail_file_writes_after(usize::MAX);
    store.clear_calls();
    let report = Uploader::new(&config, &store).run().await.unwrap();
    assert_eq!(report.totals().unchanged, 2);
    assert_eq!(report.totals().uploaded, 2);
    assert_eq!(HistoryManifest::load(&ws.history_file()).unwrap().len(), 4);
}

/// A root that is a single file behaves like a directory root holding only it.
#[tokio::test]
async fn test_single_file_root_matches_directory_root() {
    let ws = Workspace::new();
    ws.write("dir/report.csv", "x,y");
    let single = ws.write("single/report.csv", "x,y");

    let dir_store = MemoryStore::new();
    let dir_config = ws.config(&[("dir", "dest")]);
    let mut dir_uploader = Uploader::new(&dir_config, &dir_store);
    dir_uploader.run().await.unwrap();

    fs::remove_file(ws.history_file()).unwrap();

    let file_store = MemoryStore::new();
    let file_config = ws.config(&[("single/report.csv", "dest/report.csv")]);
    let mut file_uploader = Uploader::new(&file_config, &file_store);
    let report = file_uploader.run().await.unwrap();

    assert_eq!(report.totals().uploaded, 1);
    assert_eq!(file_store.calls(), dir_store.calls());
    assert!(file_uploader
        .manifest()
        .unwrap()
        .lookup(&identity(&single))
        .is_some());

    // Unchanged on the next pass, updated once the mtime moves.
    file_store.clear_calls();
    let report = Uploader::new(&file_config, &file_store).run().await.unwrap();
    assert_eq!(report.totals().unchanged, 1);
    assert_eq!(file_store.call_count(), 0);

    set_mtime(&single, fixed_time(42));
    let report = Uploader::new(&file_config, &file_store).run().await.unwrap();
    assert_eq!(report.totals().updated, 1);
}

/// A changed mtime replaces content on the stored object id and refreshes the
/// recorded timestamp.
#[tokio::test]
async fn test_changed_mtime_updates_by_stored_id() {
    let ws = Workspace::new();
    let file = ws.write("src/notes.md", "v1");
    set_mtime(&file, fixed_time(1));
    let config = ws.config(&[("src", "dest")]);
    let store = MemoryStore::new();

    Uploader::new(&config, &store).run().await.unwrap();
    let before = HistoryManifest::load(&ws.history_file()).unwrap();
    let original = before.lookup(&identity(&file)).unwrap().clone();
    assert_eq!(original.last_update_at, DateTime::<Utc>::from(fixed_time(1)));

    fs::write(&file, "v2").unwrap();
    set_mtime(&file, fixed_time(2));
    store.clear_calls();

    let report = Uploader::new(&config, &store).run().await.unwrap();
    assert_eq!(report.totals().updated, 1);
    assert_eq!(
        store.calls(),
        vec![StoreCall::UpdateFileContent {
            id: original.remote_object_id.clone(),
            title: "notes.md".into(),
        }]
    );

    let after = HistoryManifest::load(&ws.history_file()).unwrap();
    let updated = after.lookup(&identity(&file)).unwrap();
    assert_eq!(updated.remote_object_id, original.remote_object_id);
    assert_eq!(updated.last_update_at, DateTime::<Utc>::from(mtime(&file)));
    assert_eq!(updated.last_update_at, DateTime::<Utc>::from(fixed_time(2)));
    assert_eq!(
        store.object(&original.remote_object_id).unwrap().content,
        b"v2".to_vec()
    );
}

/// A missing source path fails the check before any remote call.
#[tokio::test]
async fn test_check_rejects_missing_root_before_remote_work() {
    let ws = Workspace::new();
    ws.write("present/a.txt", "a");
    let config = ws.config(&[("present", "p"), ("absent", "q")]);
    let store = MemoryStore::new();

    let uploader = Uploader::new(&config, &store);
    let err = uploader.check().unwrap_err();
    assert!(matches!(err, SyncError::LocalPathMissing(ref p) if p.ends_with("absent")));
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_corrupt_history_fails_prepare() {
    let ws = Workspace::new();
    ws.write("src/a.txt", "a");
    fs::write(ws.history_file(), "[1, 2").unwrap();
    let config = ws.config(&[("src", "dest")]);
    let store = MemoryStore::new();

    let mut uploader = Uploader::new(&config, &store);
    let err = uploader.prepare().unwrap_err();
    assert!(matches!(err, SyncError::CorruptState { .. }));
    assert_eq!(store.call_count(), 0);
}

/// Roots run in configured order; a failing root stops the run.
#[tokio::test]
async fn test_roots_run_sequentially_and_stop_on_failure() {
    let ws = Workspace::new();
    ws.write("first/a.txt", "a");
    ws.write("second/b.txt", "b");
    let config = ws.config(&[("first", "one"), ("gone", "two"), ("second", "three")]);
    let store = MemoryStore::new();

    let err = Uploader::new(&config, &store).run().await.unwrap_err();
    assert!(matches!(err, SyncError::LocalPathMissing(_)));

    let persisted = HistoryManifest::load(&ws.history_file()).unwrap();
    assert_eq!(persisted.len(), 1);
    assert!(persisted.lookup(&identity(&ws.path().join("first/a.txt"))).is_some());
    assert!(!store
        .calls()
        .iter()
        .any(|c| matches!(c, StoreCall::ListByTitle(t) if t == "three")));
}

/// A rename is a new identity: the file is uploaded again and the old record
/// stays behind.
#[tokio::test]
async fn test_renamed_file_is_uploaded_as_new() {
    let ws = Workspace::new();
    let old = ws.write("src/old.txt", "same");
    let config = ws.config(&[("src", "")]);
    let store = MemoryStore::new();

    Uploader::new(&config, &store).run().await.unwrap();
    let new = ws.path().join("src/new.txt");
    fs::rename(&old, &new).unwrap();

    let report = Uploader::new(&config, &store).run().await.unwrap();
    assert_eq!(report.totals().uploaded, 1);

    let persisted = HistoryManifest::load(&ws.history_file()).unwrap();
    assert_eq!(persisted.len(), 2);
    assert!(persisted.lookup(&identity(&new)).is_some());
    let files = store
        .objects()
        .into_iter()
        .filter(|o| o.kind == ItemKind::File)
        .count();
    assert_eq!(files, 2);
}

/// A listing failure while resolving the N-th file's folder aborts the run
/// with the first N-1 files recorded.
#[tokio::test]
async fn test_listing_failure_keeps_earlier_records() {
    let ws = Workspace::new();
    ws.write("src/a/one.txt", "1");
    ws.write("src/b/two.txt", "2");
    ws.write("src/c/three.txt", "3");
    let config = ws.config(&[("src", "")]);
    let store = MemoryStore::new();
    store.fail_listing_after(2);

    let err = Uploader::new(&config, &store).run().await.unwrap_err();
    assert!(matches!(err, SyncError::RemoteUnavailable(_)));
    assert!(err.is_remote());

    let persisted = HistoryManifest::load(&ws.history_file()).unwrap();
    assert_eq!(persisted.len(), 2);
    let created_files = store
        .calls()
        .iter()
        .filter(|c| matches!(c, StoreCall::CreateFile { .. }))
        .count();
    assert_eq!(created_files, 2);
}

/// A rejected folder creation aborts resolution before the file is sent.
#[tokio::test]
async fn test_folder_create_failure_keeps_earlier_records() {
    let ws = Workspace::new();
    ws.write("src/a/one.txt", "1");
    ws.write("src/b/two.txt", "2");
    let config = ws.config(&[("src", "")]);
    let store = MemoryStore::new();
    store.fail_folder_creates_after(1);

    let err = Uploader::new(&config, &store).run().await.unwrap_err();
    assert!(matches!(err, SyncError::RemoteRejected { status: Some(403), .. }));

    let persisted = HistoryManifest::load(&ws.history_file()).unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(
        store
            .objects()
            .iter()
            .filter(|o| o.kind == ItemKind::File)
            .count(),
        1
    );
}

/// A failed content replace leaves that file's old record in place while the
/// updates before it are persisted.
#[tokio::test]
async fn test_update_failure_keeps_earlier_updates() {
    let ws = Workspace::new();
    let one = ws.write("src/one.txt", "1");
    let two = ws.write("src/two.txt", "2");
    set_mtime(&one, fixed_time(1));
    set_mtime(&two, fixed_time(1));
    let config = ws.config(&[("src", "dest")]);
    let store = MemoryStore::new();
    Uploader::new(&config, &store).run().await.unwrap();

    fs::write(&one, "1b").unwrap();
    fs::write(&two, "2b").unwrap();
    set_mtime(&one, fixed_time(2));
    set_mtime(&two, fixed_time(2));
    store.fail_file_writes_after(1);

    let err = Uploader::new(&config, &store).run().await.unwrap_err();
    assert!(matches!(err, SyncError::RemoteRejected { status: Some(500), .. }));

    let persisted = HistoryManifest::load(&ws.history_file()).unwrap();
    assert_eq!(persisted.len(), 2);
    let fresh = persisted
        .iter()
        .filter(|(_, r)| r.last_update_at == DateTime::<Utc>::from(fixed_time(2)))
        .count();
    let stale = persisted
        .iter()
        .filter(|(_, r)| r.last_update_at == DateTime::<Utc>::from(fixed_time(1)))
        .count();
    assert_eq!((fresh, stale), (1, 1));
}

/// Names that are not valid UTF-8 abort the run instead of collapsing onto a
/// shared identity.
#[cfg(unix)]
#[tokio::test]
async fn test_non_utf8_names_are_not_merged() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let ws = Workspace::new();
    let src = ws.path().join("src");
    fs::create_dir_all(&src).unwrap();
    let first = src.join(OsStr::from_bytes(b"a\xff.txt"));
    let second = src.join(OsStr::from_bytes(b"a\xfe.txt"));
    fs::write(&first, "AAAA").unwrap();
    fs::write(&second, "BBBB").unwrap();
    set_mtime(&first, fixed_time(1));
    set_mtime(&second, fixed_time(2));
    let config = ws.config(&[("src", "dest")]);
    let store = MemoryStore::new();

    let err = Uploader::new(&config, &store).run().await.unwrap_err();
    assert!(matches!(err, SyncError::Traversal(_)));

    let persisted = HistoryManifest::load(&ws.history_file()).unwrap();
    assert!(persisted.is_empty());
    assert!(!store.calls().iter().any(|c| matches!(
        c,
        StoreCall::CreateFile { .. } | StoreCall::UpdateFileContent { .. }
    )));
}
