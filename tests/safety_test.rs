mod helpers;

use helpers::{insert_chunk, test_store};
use rlm::error::MemoryError;
use rlm::store::chunks;

#[test]
fn traversal_ids_are_rejected_before_touching_disk() {
    let (_dir, store) = test_store();

    for id in ["../../etc/passwd", "a/b", "..", "", "nul\0byte"] {
        let err = chunks::peek(&store, id, None, None).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidId(_)), "{id:?}");
    }
}

#[test]
fn stored_path_escaping_the_root_is_a_path_escape() {
    let (_dir, store) = test_store();
    let id = insert_chunk(&store, "innocent content");

    // Corrupt the index entry so its path points outside the root
    let index_path = store.index_file();
    let mut doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&index_path).unwrap()).unwrap();
    doc["chunks"][0]["path"] = serde_json::Value::String("../outside.md".into());
    std::fs::write(&index_path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();

    let err = chunks::peek(&store, &id, None, None).unwrap_err();
    assert!(matches!(err, MemoryError::PathEscape(_)));
}

#[test]
fn absolute_stored_path_is_a_path_escape() {
    let (_dir, store) = test_store();
    let id = insert_chunk(&store, "more innocent content");

    let index_path = store.index_file();
    let mut doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&index_path).unwrap()).unwrap();
    doc["chunks"][0]["path"] = serde_json::Value::String("/etc/passwd".into());
    std::fs::write(&index_path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();

    let err = chunks::peek(&store, &id, None, None).unwrap_err();
    assert!(matches!(err, MemoryError::PathEscape(_)));
}

#[test]
fn concurrent_chunk_writers_never_collide_on_ids() {
    let (_dir, store) = test_store();
    let store = std::sync::Arc::new(store);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = std::sync::Arc::clone(&store);
            std::thread::spawn(move || {
                chunks::create_chunk(
                    store.as_ref(),
                    chunks::ChunkRequest {
                        content: format!("unique content number {i}"),
                        project: Some("race".into()),
                        ..Default::default()
                    },
                )
                .unwrap()
                .chunk_id
            })
        })
        .collect();

    let mut ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8, "sequence allocation must be race-free");
}
