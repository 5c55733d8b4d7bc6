//! Unit tests for the upsert pipeline: create, update, atomicity and delete.

use std::cell::{Cell, RefCell};

use tagmark::database::Database;
use tagmark::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use tagmark::managers::link_manager::{LinkManager, LinkManagerTrait};
use tagmark::services::bookmark_pipeline::BookmarkPipeline;
use tagmark::services::thumbnail_store::ThumbnailStore;
use tagmark::services::title_fetcher::TitleFetcher;
use tagmark::types::bookmark::BookmarkDraft;
use tagmark::types::errors::{BookmarkError, FetchError, ThumbnailError};

/// Returns a fixed title, or fails when `title` is `None`. Counts calls.
struct StubFetcher {
    title: Option<&'static str>,
    calls: Cell<usize>,
}

impl StubFetcher {
    fn returning(title: &'static str) -> Self {
        Self { title: Some(title), calls: Cell::new(0) }
    }

    fn failing() -> Self {
        Self { title: None, calls: Cell::new(0) }
    }
}

impl TitleFetcher for StubFetcher {
    fn fetch_page_title(&self, url: &str) -> Result<String, FetchError> {
        self.calls.set(self.calls.get() + 1);
        self.title
            .map(str::to_string)
            .ok_or_else(|| FetchError::Network(format!("unreachable: {}", url)))
    }
}

/// Records deleted thumbnail names; optionally fails every deletion.
#[derive(Default)]
struct RecordingThumbnails {
    deleted: RefCell<Vec<String>>,
    fail: bool,
}

impl ThumbnailStore for RecordingThumbnails {
    fn save_thumbnail(&self, _data: &[u8]) -> Result<String, ThumbnailError> {
        Ok("shot.jpg".to_string())
    }

    fn delete_thumbnail(&self, name: &str) -> Result<(), ThumbnailError> {
        self.deleted.borrow_mut().push(name.to_string());
        if self.fail {
            return Err(ThumbnailError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )));
        }
        Ok(())
    }
}

fn setup() -> Database {
    Database::open_in_memory().expect("Failed to open in-memory database")
}

fn names(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

fn table_count(db: &Database, table: &str) -> i64 {
    db.connection()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}

// ─── Create ───

#[test]
fn test_create_returns_populated_bookmark() {
    let db = setup();
    let fetcher = StubFetcher::returning("unused");
    let thumbs = RecordingThumbnails::default();
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);

    let mut draft = BookmarkDraft::new("https://rust-lang.org", "Rust");
    draft.excerpt = "A language".to_string();
    draft.owner_id = 3;
    draft.public = true;
    let saved = pipeline
        .create_or_update(draft, &names(&["Web", "rust", "WEB", " "]))
        .unwrap();

    assert!(saved.id > 0);
    assert_eq!(saved.title, "Rust");
    assert_eq!(saved.owner_id, 3);
    assert!(saved.public);
    assert_eq!(saved.tag_names(), vec!["web", "rust"]);
    assert_eq!(saved.modified.len(), "2024-01-01 00:00:00".len());
    assert_eq!(fetcher.calls.get(), 0);

    let stored = BookmarkManager::new(db.connection()).get(saved.id).unwrap();
    assert_eq!(stored.url, "https://rust-lang.org");
    assert_eq!(stored.tag_names(), vec!["rust", "web"]);
}

#[test]
fn test_blank_title_is_fetched() {
    let db = setup();
    let fetcher = StubFetcher::returning("Fetched Title");
    let thumbs = RecordingThumbnails::default();
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);

    let saved = pipeline
        .create_or_update(BookmarkDraft::new("https://example.com", "  "), &[])
        .unwrap();
    assert_eq!(saved.title, "Fetched Title");
    assert_eq!(fetcher.calls.get(), 1);
}

#[test]
fn test_failed_fetch_saves_empty_title() {
    let db = setup();
    let fetcher = StubFetcher::failing();
    let thumbs = RecordingThumbnails::default();
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);

    let saved = pipeline
        .create_or_update(BookmarkDraft::new("https://offline.example", ""), &names(&["x"]))
        .unwrap();
    assert_eq!(saved.title, "");
    assert_eq!(saved.tag_names(), vec!["x"]);
    assert_eq!(table_count(&db, "bookmark"), 1);
}

#[test]
fn test_missing_or_invalid_url_is_rejected_without_writes() {
    let db = setup();
    let fetcher = StubFetcher::returning("t");
    let thumbs = RecordingThumbnails::default();
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);

    for url in ["", "   ", "not a url"] {
        let result = pipeline.create_or_update(BookmarkDraft::new(url, "T"), &names(&["go"]));
        assert!(matches!(result, Err(BookmarkError::Validation(_))), "url {:?}", url);
    }
    assert_eq!(table_count(&db, "bookmark"), 0);
    assert_eq!(table_count(&db, "tag"), 0);
}

#[test]
fn test_tracking_params_are_stripped() {
    let db = setup();
    let fetcher = StubFetcher::returning("t");
    let thumbs = RecordingThumbnails::default();
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);

    let saved = pipeline
        .create_or_update(
            BookmarkDraft::new("https://blog.dev/p?id=1&utm_source=rss", "Post"),
            &[],
        )
        .unwrap();
    assert_eq!(saved.url, "https://blog.dev/p?id=1");
}

#[test]
fn test_duplicate_url_is_conflict_and_rolls_back_tags() {
    let db = setup();
    let fetcher = StubFetcher::returning("t");
    let thumbs = RecordingThumbnails::default();
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);

    pipeline
        .create_or_update(BookmarkDraft::new("https://dup.dev", "A"), &names(&["first"]))
        .unwrap();
    let result = pipeline.create_or_update(BookmarkDraft::new("https://dup.dev", "B"), &names(&["second"]));

    assert!(matches!(result, Err(BookmarkError::Conflict(_))));
    assert_eq!(table_count(&db, "bookmark"), 1);
    assert_eq!(table_count(&db, "tag"), 1, "tag created by the failed write must be rolled back");
}

// ─── Update ───

#[test]
fn test_update_replaces_row_and_tags() {
    let db = setup();
    let fetcher = StubFetcher::returning("t");
    let thumbs = RecordingThumbnails::default();
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);

    let created = pipeline
        .create_or_update(BookmarkDraft::new("https://a.dev", "Old"), &names(&["go", "web"]))
        .unwrap();

    let mut draft = BookmarkDraft::from_bookmark(&created);
    draft.title = "New".to_string();
    draft.modified = Some("2030-01-01 00:00:00".to_string());
    let updated = pipeline.create_or_update(draft, &names(&["rust", "go"])).unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "New");
    assert_eq!(updated.modified, "2030-01-01 00:00:00");
    assert_eq!(updated.tag_names(), vec!["rust", "go"]);

    let links = LinkManager::new(db.connection()).tags_for(created.id).unwrap();
    let linked: Vec<&str> = links.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(linked, vec!["go", "rust"]);
}

#[test]
fn test_update_missing_id_is_not_found_and_atomic() {
    let db = setup();
    let fetcher = StubFetcher::returning("t");
    let thumbs = RecordingThumbnails::default();
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);

    let mut draft = BookmarkDraft::new("https://ghost.dev", "Ghost");
    draft.id = Some(404);
    let result = pipeline.create_or_update(draft, &names(&["phantom"]));

    assert!(matches!(result, Err(BookmarkError::NotFound(_))));
    assert_eq!(table_count(&db, "tag"), 0);
    assert_eq!(table_count(&db, "bookmark_content"), 0);
}

#[test]
fn test_content_record_is_upserted() {
    let db = setup();
    let fetcher = StubFetcher::returning("t");
    let thumbs = RecordingThumbnails::default();
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);
    let mgr = BookmarkManager::new(db.connection());

    let mut draft = BookmarkDraft::new("https://c.dev", "C");
    draft.content = Some("body text".to_string());
    let created = pipeline.create_or_update(draft, &[]).unwrap();

    let mut keep = BookmarkDraft::from_bookmark(&created);
    keep.content = None;
    keep.title = "C2".to_string();
    pipeline.create_or_update(keep, &[]).unwrap();
    assert_eq!(mgr.get(created.id).unwrap().content.as_deref(), Some("body text"));

    let mut replace = BookmarkDraft::from_bookmark(&created);
    replace.content = Some("fresh".to_string());
    pipeline.create_or_update(replace, &[]).unwrap();
    assert_eq!(mgr.get(created.id).unwrap().content.as_deref(), Some("fresh"));

    assert_eq!(table_count(&db, "bookmark_content"), 1);
    let content_title: String = db
        .connection()
        .query_row("SELECT title FROM bookmark_content WHERE docid = ?1", [created.id], |r| r.get(0))
        .unwrap();
    assert_eq!(content_title, "C");
}

// ─── Delete ───

#[test]
fn test_delete_removes_everything_and_thumbnail() {
    let db = setup();
    let fetcher = StubFetcher::returning("t");
    let thumbs = RecordingThumbnails::default();
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);

    let mut draft = BookmarkDraft::new("https://d.dev", "D");
    draft.image_url = Some("d.jpg".to_string());
    let saved = pipeline.create_or_update(draft, &names(&["go"])).unwrap();

    pipeline.delete(saved.id).unwrap();
    assert_eq!(table_count(&db, "bookmark"), 0);
    assert_eq!(table_count(&db, "bookmark_tag"), 0);
    assert_eq!(table_count(&db, "bookmark_content"), 0);
    assert_eq!(*thumbs.deleted.borrow(), vec!["d.jpg".to_string()]);
}

#[test]
fn test_thumbnail_failure_does_not_fail_delete() {
    let db = setup();
    let fetcher = StubFetcher::returning("t");
    let thumbs = RecordingThumbnails { fail: true, ..Default::default() };
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);

    let mut draft = BookmarkDraft::new("https://e.dev", "E");
    draft.image_url = Some("e.jpg".to_string());
    let saved = pipeline.create_or_update(draft, &[]).unwrap();

    assert!(pipeline.delete(saved.id).is_ok());
    assert_eq!(table_count(&db, "bookmark"), 0);
    assert_eq!(thumbs.deleted.borrow().len(), 1);
}

#[test]
fn test_delete_without_thumbnail_skips_store() {
    let db = setup();
    let fetcher = StubFetcher::returning("t");
    let thumbs = RecordingThumbnails::default();
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);

    let saved = pipeline.create_or_update(BookmarkDraft::new("https://f.dev", "F"), &[]).unwrap();
    pipeline.delete(saved.id).unwrap();
    assert!(thumbs.deleted.borrow().is_empty());
}

#[test]
fn test_delete_missing_is_not_found() {
    let db = setup();
    let fetcher = StubFetcher::returning("t");
    let thumbs = RecordingThumbnails::default();
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);

    assert!(matches!(pipeline.delete(12), Err(BookmarkError::NotFound(_))));
    assert!(matches!(
        pipeline.delete_by_url("https://nowhere.dev"),
        Err(BookmarkError::NotFound(_))
    ));
}

#[test]
fn test_delete_by_url() {
    let db = setup();
    let fetcher = StubFetcher::returning("t");
    let thumbs = RecordingThumbnails::default();
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);

    pipeline.create_or_update(BookmarkDraft::new("https://g.dev", "G"), &[]).unwrap();
    pipeline.delete_by_url(" https://g.dev ").unwrap();
    assert_eq!(table_count(&db, "bookmark"), 0);
}

#[test]
fn test_delete_many_skips_unknown_ids() {
    let db = setup();
    let fetcher = StubFetcher::returning("t");
    let thumbs = RecordingThumbnails::default();
    let pipeline = BookmarkPipeline::new(db.connection(), &fetcher, &thumbs);

    let a = pipeline.create_or_update(BookmarkDraft::new("https://h.dev", "H"), &names(&["x"])).unwrap();
    let b = pipeline.create_or_update(BookmarkDraft::new("https://i.dev", "I"), &[]).unwrap();
    let c = pipeline.create_or_update(BookmarkDraft::new("https://j.dev", "J"), &[]).unwrap();

    let removed = pipeline.delete_many(&[a.id, c.id, 999]).unwrap();
    assert_eq!(removed, 2);
    assert_eq!(table_count(&db, "bookmark"), 1);
    assert!(BookmarkManager::new(db.connection()).get(b.id).is_ok());
}
