//! Unit tests for the tag store: resolution, listing and renaming.

use std::collections::HashMap;
use std::thread;

use rstest::rstest;
use tempfile::TempDir;

use tagmark::database::Database;
use tagmark::managers::link_manager::{LinkManager, LinkManagerTrait};
use tagmark::managers::tag_manager::{TagManager, TagManagerTrait};
use tagmark::types::errors::BookmarkError;

fn setup() -> Database {
    Database::open_in_memory().expect("Failed to open in-memory database")
}

fn insert_bookmark(db: &Database, url: &str) -> i64 {
    db.connection()
        .execute(
            "INSERT INTO bookmark (url, title, modified) VALUES (?1, 't', '2024-01-01 00:00:00')",
            [url],
        )
        .unwrap();
    db.connection().last_insert_rowid()
}

#[rstest]
#[case("Rust", "rust")]
#[case("  rust  ", "rust")]
#[case("Web   Dev", "web dev")]
#[case("web\tdev", "web dev")]
#[case("ÜBER", "über")]
fn test_resolve_normalizes(#[case] input: &str, #[case] expected: &str) {
    let db = setup();
    let tag = TagManager::new(db.connection()).resolve_or_create(input).unwrap();
    assert_eq!(tag.name, expected);
}

#[test]
fn test_resolve_is_idempotent_across_spellings() {
    let db = setup();
    let mgr = TagManager::new(db.connection());
    let a = mgr.resolve_or_create("Machine Learning").unwrap();
    let b = mgr.resolve_or_create("machine   learning").unwrap();
    let c = mgr.resolve_or_create(" MACHINE learning ").unwrap();
    assert_eq!(a, b);
    assert_eq!(b, c);

    let count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM tag", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_resolve_blank_is_validation_error() {
    let db = setup();
    let result = TagManager::new(db.connection()).resolve_or_create("   ");
    assert!(matches!(result, Err(BookmarkError::Validation(_))));
}

#[test]
fn test_batch_dedups_and_keeps_order() {
    let db = setup();
    let mgr = TagManager::new(db.connection());
    let names: Vec<String> = ["Rust", "go", "", "RUST", "web dev", "  "]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let tags = mgr.resolve_or_create_batch(&names).unwrap();
    let resolved: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(resolved, vec!["rust", "go", "web dev"]);
}

#[test]
fn test_get_and_find() {
    let db = setup();
    let mgr = TagManager::new(db.connection());
    let tag = mgr.resolve_or_create("go").unwrap();

    assert_eq!(mgr.get_tag(tag.id).unwrap(), tag);
    assert_eq!(mgr.find_by_name("GO").unwrap(), Some(tag));
    assert_eq!(mgr.find_by_name("python").unwrap(), None);
    assert!(matches!(mgr.get_tag(9999), Err(BookmarkError::NotFound(_))));
}

#[test]
fn test_list_all_counts_and_orders_by_name() {
    let db = setup();
    let tags = TagManager::new(db.connection());
    let links = LinkManager::new(db.connection());

    let rust = tags.resolve_or_create("rust").unwrap();
    let go = tags.resolve_or_create("go").unwrap();
    let unused = tags.resolve_or_create("unused").unwrap();

    let b1 = insert_bookmark(&db, "https://a.io");
    let b2 = insert_bookmark(&db, "https://b.io");
    links.reconcile(b1, &[rust.id, go.id]).unwrap();
    links.reconcile(b2, &[rust.id]).unwrap();

    let listed = tags.list_all().unwrap();
    let summary: Vec<(&str, i64)> = listed.iter().map(|t| (t.name.as_str(), t.bookmark_count)).collect();
    assert_eq!(summary, vec![("go", 1), ("rust", 2)]);
    assert!(listed.iter().all(|t| t.id != unused.id));
}

#[test]
fn test_rename_normalizes() {
    let db = setup();
    let mgr = TagManager::new(db.connection());
    let tag = mgr.resolve_or_create("golang").unwrap();

    let renamed = mgr.rename(tag.id, "  Go  Lang ").unwrap();
    assert_eq!(renamed.id, tag.id);
    assert_eq!(renamed.name, "go lang");
    assert_eq!(mgr.get_tag(tag.id).unwrap().name, "go lang");
}

#[test]
fn test_rename_to_own_name_is_noop() {
    let db = setup();
    let mgr = TagManager::new(db.connection());
    let tag = mgr.resolve_or_create("rust").unwrap();
    assert_eq!(mgr.rename(tag.id, "RUST").unwrap(), tag);
}

#[test]
fn test_rename_collision_is_conflict() {
    let db = setup();
    let mgr = TagManager::new(db.connection());
    let rust = mgr.resolve_or_create("rust").unwrap();
    let go = mgr.resolve_or_create("go").unwrap();

    let result = mgr.rename(go.id, "Rust");
    assert!(matches!(result, Err(BookmarkError::Conflict(_))));
    assert_eq!(mgr.get_tag(go.id).unwrap().name, "go");
    assert_eq!(mgr.get_tag(rust.id).unwrap().name, "rust");
}

#[test]
fn test_rename_errors() {
    let db = setup();
    let mgr = TagManager::new(db.connection());
    let tag = mgr.resolve_or_create("rust").unwrap();

    assert!(matches!(mgr.rename(tag.id, "   "), Err(BookmarkError::Validation(_))));
    assert!(matches!(mgr.rename(424242, "new"), Err(BookmarkError::NotFound(_))));
}

#[test]
fn test_concurrent_resolution_creates_each_tag_once() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("tags.db");
    drop(Database::open(&path).unwrap());

    let per_thread: Vec<Vec<(String, i64)>> = thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let db = Database::open(&path).unwrap();
                    let mgr = TagManager::new(db.connection());
                    (0..50)
                        .map(|i| {
                            let tag = mgr.resolve_or_create(&format!(" Tag{} ", i)).unwrap();
                            (tag.name, tag.id)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    let mut ids: HashMap<String, i64> = HashMap::new();
    for (name, id) in per_thread.into_iter().flatten() {
        assert_eq!(*ids.entry(name).or_insert(id), id);
    }
    assert_eq!(ids.len(), 50);

    let db = Database::open(&path).unwrap();
    let rows: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM tag", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, 50);
}
