mod helpers;

use helpers::{backdate_archive, backdate_chunk, insert_chunk, insert_chunk_with, test_store};
use rlm::store::chunks;
use rlm::store::retention::{archive_candidates, preview, restore_chunk, run};

#[test]
fn fresh_chunks_are_not_archive_candidates() {
    let (_dir, store) = test_store();
    insert_chunk(&store, "created just now");

    assert!(archive_candidates(&store).unwrap().is_empty());
}

#[test]
fn aged_unread_chunk_is_archived() {
    let (_dir, store) = test_store();
    let id = insert_chunk(&store, "old forgotten notes");
    backdate_chunk(&store, &id, 35);

    let report = run(&store, true, false).unwrap();
    assert_eq!(report.archived, vec![id.clone()]);
    assert!(report.errors.is_empty());

    // Active file gone, .gz present, index flagged
    assert!(!store.chunks_dir().join(format!("{id}.md")).exists());
    assert!(store.archive_dir().join(format!("{id}.md.gz")).exists());
    let meta = store.load_index().unwrap().find(&id).unwrap().clone();
    assert!(meta.archived);

    let archive = store.load_archive_index().unwrap();
    assert!(archive.find(&id).is_some());
}

#[test]
fn peek_auto_restores_an_archived_chunk() {
    let (_dir, store) = test_store();
    let id = insert_chunk(&store, "content that comes back");
    backdate_chunk(&store, &id, 35);
    run(&store, true, false).unwrap();

    let peeked = chunks::peek(&store, &id, None, None).unwrap();
    assert!(peeked.restored);
    assert_eq!(peeked.content, "content that comes back");

    // Back in the active zone, unflagged, archive entry gone
    assert!(store.chunks_dir().join(format!("{id}.md")).exists());
    assert!(!store.archive_dir().join(format!("{id}.md.gz")).exists());
    assert!(!store.load_index().unwrap().find(&id).unwrap().archived);
    assert!(store.load_archive_index().unwrap().find(&id).is_none());
}

#[test]
fn explicit_restore_matches_auto_restore() {
    let (_dir, store) = test_store();
    let id = insert_chunk(&store, "explicitly restored content");
    backdate_chunk(&store, &id, 40);
    run(&store, true, false).unwrap();

    restore_chunk(&store, &id).unwrap();

    let meta = store.load_index().unwrap().find(&id).unwrap().clone();
    assert!(!meta.archived);
    let peeked = chunks::peek(&store, &id, None, None).unwrap();
    assert!(!peeked.restored);
    assert_eq!(peeked.content, "explicitly restored content");
}

#[test]
fn accessed_chunks_are_never_candidates() {
    let (_dir, store) = test_store();
    let id = insert_chunk(&store, "read once, kept forever");
    chunks::peek(&store, &id, None, None).unwrap();
    backdate_chunk(&store, &id, 100);

    assert!(archive_candidates(&store).unwrap().is_empty());
}

#[test]
fn protected_keyword_grants_immunity() {
    let (_dir, store) = test_store();
    let id = insert_chunk(&store, "DECISION: go with option B\nrationale follows");
    backdate_chunk(&store, &id, 100);

    assert!(archive_candidates(&store).unwrap().is_empty());
}

#[test]
fn protected_tag_grants_immunity() {
    let (_dir, store) = test_store();
    let id = insert_chunk_with(&store, "tagged content", None, None, &["keep"]);
    backdate_chunk(&store, &id, 100);

    assert!(archive_candidates(&store).unwrap().is_empty());
}

#[test]
fn purge_requires_explicit_flag_and_logs_metadata_only() {
    let (_dir, store) = test_store();
    let id = insert_chunk(&store, "destined for the void");
    backdate_chunk(&store, &id, 35);
    run(&store, true, false).unwrap();
    backdate_archive(&store, &id, 200);

    // archive-only pass leaves the archive alone
    let report = run(&store, true, false).unwrap();
    assert!(report.purged.is_empty());
    assert!(store.archive_dir().join(format!("{id}.md.gz")).exists());

    // explicit purge removes file, archive entry and index entry
    let report = run(&store, false, true).unwrap();
    assert_eq!(report.purged, vec![id.clone()]);
    assert!(!store.archive_dir().join(format!("{id}.md.gz")).exists());
    assert!(store.load_archive_index().unwrap().find(&id).is_none());
    assert!(store.load_index().unwrap().find(&id).is_none());

    // tombstone carries metadata, never content
    let log: serde_json::Value =
        serde_json::from_slice(&std::fs::read(store.purge_log_file()).unwrap()).unwrap();
    let purged = log["purged"].as_array().unwrap();
    assert_eq!(purged.len(), 1);
    assert_eq!(purged[0]["id"], id.as_str());
    assert!(purged[0].get("content").is_none());
}

#[test]
fn preview_is_read_only_and_stable() {
    let (_dir, store) = test_store();
    let id = insert_chunk(&store, "stable candidate");
    backdate_chunk(&store, &id, 45);

    let first = preview(&store).unwrap();
    let second = preview(&store).unwrap();
    assert_eq!(first.archive_candidates.len(), 1);
    assert_eq!(
        first.archive_candidates[0].id,
        second.archive_candidates[0].id
    );

    // still active on disk
    assert!(store.chunks_dir().join(format!("{id}.md")).exists());
}

#[test]
fn archive_then_restore_preserves_index_semantics() {
    let (_dir, store) = test_store();
    let id = insert_chunk(&store, "roundtrip me");
    let before = store.load_index().unwrap().find(&id).unwrap().clone();

    backdate_chunk(&store, &id, 35);
    run(&store, true, false).unwrap();
    restore_chunk(&store, &id).unwrap();

    let after = store.load_index().unwrap().find(&id).unwrap().clone();
    assert_eq!(after.id, before.id);
    assert_eq!(after.summary, before.summary);
    assert_eq!(after.content_hash, before.content_hash);
    assert_eq!(after.access_count, before.access_count);
    assert!(!after.archived);
}
