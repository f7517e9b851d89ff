mod helpers;

use helpers::test_store;
use rlm::error::MemoryError;
use rlm::store::insights::{forget, recall, remember};
use rlm::store::types::{Category, Importance};
use rlm::store::ContextStore;

fn add(store: &ContextStore, content: &str, category: Category, tags: &[&str]) -> String {
    remember(
        store,
        content,
        category,
        Importance::Medium,
        tags.iter().map(|t| t.to_string()).collect(),
    )
    .unwrap()
    .id
}

#[test]
fn remember_then_recall_returns_the_insight() {
    let (_dir, store) = test_store();

    let id = add(&store, "User prefers rebase over merge", Category::Preference, &[]);

    let results = recall(&store, None, None, None, 10).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, id);
    assert_eq!(results[0].content, "User prefers rebase over merge");
    assert_eq!(results[0].category, Category::Preference);
}

#[test]
fn recall_filters_by_category_and_importance() {
    let (_dir, store) = test_store();

    add(&store, "We chose postgres", Category::Decision, &[]);
    add(&store, "The cache is write-through", Category::Fact, &[]);
    remember(
        &store,
        "Ship by friday",
        Category::Todo,
        Importance::Critical,
        vec![],
    )
    .unwrap();

    let decisions = recall(&store, None, Some(Category::Decision), None, 10).unwrap();
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].content, "We chose postgres");

    let critical = recall(&store, None, None, Some(Importance::Critical), 10).unwrap();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].content, "Ship by friday");
}

#[test]
fn recall_ranks_by_fraction_of_query_tokens() {
    let (_dir, store) = test_store();

    let full = add(
        &store,
        "The odoo migration requires a database backup",
        Category::Finding,
        &[],
    );
    let partial = add(&store, "The odoo instance is on the VPS", Category::Fact, &[]);
    add(&store, "Unrelated note about lunch", Category::General, &[]);

    let results = recall(&store, Some("odoo migration"), None, None, 10).unwrap();
    assert_eq!(results.len(), 2);
    // Both query tokens hit the first insight; only one hits the second
    assert_eq!(results[0].id, full);
    assert_eq!(results[1].id, partial);
}

#[test]
fn recall_matches_against_tags_too() {
    let (_dir, store) = test_store();

    let tagged = add(&store, "Something brief", Category::General, &["deployment"]);
    add(&store, "Another note entirely", Category::General, &[]);

    let results = recall(&store, Some("deployment"), None, None, 10).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, tagged);
}

#[test]
fn stopword_only_query_falls_back_to_substring_match() {
    let (_dir, store) = test_store();

    // "est" is a French stopword, so the tokenizer strips the whole query;
    // raw substring matching should still find it inside "test".
    let id = add(&store, "le test passe", Category::General, &[]);
    add(&store, "nothing relevant", Category::General, &[]);

    let results = recall(&store, Some("est"), None, None, 10).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, id);
}

#[test]
fn recall_without_query_sorts_newest_first() {
    let (_dir, store) = test_store();

    add(&store, "first", Category::General, &[]);
    std::thread::sleep(std::time::Duration::from_millis(5));
    add(&store, "second", Category::General, &[]);

    let results = recall(&store, None, None, None, 10).unwrap();
    assert_eq!(results[0].content, "second");
    assert_eq!(results[1].content, "first");
}

#[test]
fn forget_removes_the_insight() {
    let (_dir, store) = test_store();

    let id = add(&store, "Temporary note", Category::General, &[]);
    let remaining = forget(&store, &id).unwrap();
    assert_eq!(remaining, 0);

    assert!(recall(&store, None, None, None, 10).unwrap().is_empty());
}

#[test]
fn forget_unknown_id_is_not_found() {
    let (_dir, store) = test_store();
    add(&store, "Still here", Category::General, &[]);

    let err = forget(&store, "does-not-exist").unwrap_err();
    assert!(matches!(err, MemoryError::NotFound(_)));

    // Nothing was deleted
    assert_eq!(recall(&store, None, None, None, 10).unwrap().len(), 1);
}
