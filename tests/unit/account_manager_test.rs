//! Unit tests for the account store.

use tagmark::database::Database;
use tagmark::managers::account_manager::{AccountManager, AccountManagerTrait};
use tagmark::types::account::AccountQuery;
use tagmark::types::errors::BookmarkError;

fn setup() -> Database {
    Database::open_in_memory().expect("Failed to open in-memory database")
}

fn usernames(query: &AccountQuery, mgr: &AccountManager) -> Vec<String> {
    mgr.list(query).unwrap().into_iter().map(|a| a.username).collect()
}

#[test]
fn test_save_creates_then_updates() {
    let db = setup();
    let mgr = AccountManager::new(db.connection());

    let created = mgr.save("alice", "$2a$10$hash1", false).unwrap();
    assert!(created.id > 0);
    assert!(!created.owner);

    let updated = mgr.save("alice", "$2a$10$hash2", true).unwrap();
    assert_eq!(updated.id, created.id);
    assert!(updated.owner);
    assert_eq!(mgr.get("alice").unwrap().password_hash, "$2a$10$hash2");
}

#[test]
fn test_save_validation() {
    let db = setup();
    let mgr = AccountManager::new(db.connection());
    assert!(matches!(mgr.save("  ", "hash", false), Err(BookmarkError::Validation(_))));
    assert!(matches!(mgr.save("bob", "", false), Err(BookmarkError::Validation(_))));
}

#[test]
fn test_get_missing_is_not_found() {
    let db = setup();
    let mgr = AccountManager::new(db.connection());
    assert!(matches!(mgr.get("nobody"), Err(BookmarkError::NotFound(_))));
}

#[test]
fn test_list_filters_and_hides_hashes() {
    let db = setup();
    let mgr = AccountManager::new(db.connection());
    mgr.save("carol", "h", true).unwrap();
    mgr.save("alice", "h", false).unwrap();
    mgr.save("al_bert", "h", false).unwrap();

    let all = mgr.list(&AccountQuery::default()).unwrap();
    assert_eq!(
        all.iter().map(|a| a.username.as_str()).collect::<Vec<_>>(),
        vec!["al_bert", "alice", "carol"]
    );
    assert!(all.iter().all(|a| a.password_hash.is_empty()));

    let query = AccountQuery { keyword: "AL".to_string(), owner_only: false };
    assert_eq!(usernames(&query, &mgr), vec!["al_bert", "alice"]);

    let query = AccountQuery { keyword: "l_".to_string(), owner_only: false };
    assert_eq!(usernames(&query, &mgr), vec!["al_bert"]);

    let query = AccountQuery { keyword: String::new(), owner_only: true };
    assert_eq!(usernames(&query, &mgr), vec!["carol"]);
}

#[test]
fn test_delete_counts_existing() {
    let db = setup();
    let mgr = AccountManager::new(db.connection());
    mgr.save("dave", "h", false).unwrap();
    mgr.save("erin", "h", false).unwrap();

    let removed = mgr
        .delete(&["dave".to_string(), "ghost".to_string()])
        .unwrap();
    assert_eq!(removed, 1);
    assert!(mgr.get("dave").is_err());
    assert!(mgr.get("erin").is_ok());
}
