//! RPC method handler for the tagmark JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches JSON-RPC method calls to the
//! managers and the upsert pipeline via the `App` struct.

use std::sync::Mutex;

use serde_json::{json, Value};
use tracing::{error, warn};

use crate::app::App;
use crate::managers::account_manager::{AccountManager, AccountManagerTrait};
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::managers::tag_manager::{TagManager, TagManagerTrait};
use crate::services::settings_engine::SettingsEngineTrait;
use crate::services::thumbnail_store::decode_base64_image;
use crate::types::account::AccountQuery;
use crate::types::bookmark::BookmarkDraft;
use crate::types::errors::BookmarkError;
use crate::types::filter::{BookmarkFilter, OrderMethod};

/// Storage failures are logged here; caller errors are only reported back.
fn failure(e: BookmarkError) -> String {
    if !e.is_client_error() {
        error!(error = %e, "request failed in storage");
    }
    e.to_string()
}

fn str_param<'v>(params: &'v Value, key: &str) -> Option<&'v str> {
    params.get(key).and_then(|v| v.as_str())
}

fn id_param(params: &Value, key: &str) -> Result<i64, String> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| format!("missing {}", key))
}

/// Accepts `true`/`false` as well as the `0`/`1` integers older clients send.
fn flag_param(params: &Value, key: &str) -> bool {
    match params.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        _ => false,
    }
}

/// Splits a comma-separated list, dropping blank entries.
pub fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits the tag field of a save request: on commas when present, else on spaces.
pub fn split_save_tags(input: &str) -> Vec<String> {
    if input.contains(',') {
        split_csv(input)
    } else {
        input.split_whitespace().map(str::to_string).collect()
    }
}

fn string_list(params: &Value, key: &str) -> Vec<String> {
    match params.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str()).map(str::to_string).collect(),
        Some(Value::String(s)) => split_csv(s),
        _ => Vec::new(),
    }
}

fn parse_filter(params: &Value) -> Result<BookmarkFilter, String> {
    match params.get("filter") {
        Some(filter) => serde_json::from_value(filter.clone()).map_err(|e| format!("invalid filter: {}", e)),
        None => Ok(BookmarkFilter::new()),
    }
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Bookmarks ───
        "bookmark.list" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            let page_size = a.page_size();
            let page = params.get("page").and_then(|v| v.as_i64()).unwrap_or(1).max(1);
            let filter = BookmarkFilter::new()
                .keyword(str_param(params, "keyword").unwrap_or(""))
                .include_tags(&string_list(params, "tags"))
                .exclude_tags(&string_list(params, "exclude"))
                .order(OrderMethod::LastAdded)
                .page(page_size, (page - 1).saturating_mul(page_size));

            let mgr = BookmarkManager::new(a.db.connection());
            let (bookmarks, total) = mgr.search(&filter).map_err(failure)?;
            let max_page = (total + page_size - 1) / page_size;
            Ok(json!({"page": page, "maxPage": max_page, "bookmarks": bookmarks}))
        }
        "bookmark.search" => {
            let filter = parse_filter(params)?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let mgr = BookmarkManager::new(a.db.connection());
            let (bookmarks, total) = mgr.search(&filter).map_err(failure)?;
            Ok(json!({"bookmarks": bookmarks, "total": total}))
        }
        "bookmark.count" => {
            let filter = parse_filter(params)?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let mgr = BookmarkManager::new(a.db.connection());
            let total = mgr.count(&filter).map_err(failure)?;
            Ok(json!({"count": total}))
        }
        "bookmark.get" => {
            let id = id_param(params, "id")?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let bookmark = BookmarkManager::new(a.db.connection()).get(id).map_err(failure)?;
            serde_json::to_value(bookmark).map_err(|e| e.to_string())
        }
        "bookmark.save" => {
            let url = str_param(params, "url").filter(|u| !u.trim().is_empty()).ok_or("missing url")?;
            let url = crate::url_utils::clean_url(url).map_err(failure)?;
            let mut tags = split_save_tags(str_param(params, "tags").unwrap_or(""));

            let a = app.lock().map_err(|e| e.to_string())?;
            let existing = BookmarkManager::new(a.db.connection())
                .get_by_url(&url)
                .map_err(failure)?;

            let mut draft = match &existing {
                Some(bookmark) => BookmarkDraft::from_bookmark(bookmark),
                None => BookmarkDraft::default(),
            };
            draft.url = url;
            draft.title = str_param(params, "title").unwrap_or("").to_string();
            draft.excerpt = str_param(params, "excerpt").unwrap_or("").to_string();
            draft.public = flag_param(params, "public");
            draft.owner_id = params.get("uid").and_then(|v| v.as_i64()).unwrap_or(0);

            match &existing {
                Some(bookmark) => {
                    // Saves from the browser extension keep the tags already stored.
                    if str_param(params, "from") == Some("ext") {
                        tags.extend(bookmark.tags.iter().map(|t| t.name.clone()));
                    }
                }
                None => {
                    if let Some(image) = str_param(params, "imgbase64").filter(|s| !s.is_empty()) {
                        match decode_base64_image(image).and_then(|bytes| a.thumbnails.save_thumbnail(&bytes)) {
                            Ok(name) => draft.image_url = Some(name),
                            Err(e) => warn!(error = %e, "thumbnail not saved"),
                        }
                    }
                }
            }

            let screenshot = if existing.is_none() { draft.image_url.clone() } else { None };
            let saved = match a.pipeline().create_or_update(draft, &tags) {
                Ok(saved) => saved,
                Err(e) => {
                    if let Some(name) = screenshot {
                        if let Err(cleanup) = a.thumbnails.delete_thumbnail(&name) {
                            warn!(name = %name, error = %cleanup, "orphaned thumbnail not removed");
                        }
                    }
                    return Err(failure(e));
                }
            };
            serde_json::to_value(saved).map_err(|e| e.to_string())
        }
        "bookmark.delete" => {
            let id = id_param(params, "id")?;
            let a = app.lock().map_err(|e| e.to_string())?;
            a.pipeline().delete(id).map_err(failure)?;
            Ok(json!({"ok": true}))
        }
        "bookmark.deleteUrl" => {
            let url = str_param(params, "url").ok_or("missing url")?;
            let a = app.lock().map_err(|e| e.to_string())?;
            a.pipeline().delete_by_url(url).map_err(failure)?;
            Ok(json!({"ok": true}))
        }
        "bookmark.deleteMany" => {
            let ids: Vec<i64> = params
                .get("ids")
                .and_then(|v| v.as_array())
                .ok_or("missing ids")?
                .iter()
                .filter_map(|v| v.as_i64())
                .collect();
            let a = app.lock().map_err(|e| e.to_string())?;
            let removed = a.pipeline().delete_many(&ids).map_err(failure)?;
            Ok(json!({"removed": removed}))
        }

        // ─── Tags ───
        "tag.list" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            let tags = TagManager::new(a.db.connection()).list_all().map_err(failure)?;
            serde_json::to_value(tags).map_err(|e| e.to_string())
        }
        "tag.get" => {
            let id = id_param(params, "id")?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let tag = TagManager::new(a.db.connection()).get_tag(id).map_err(failure)?;
            serde_json::to_value(tag).map_err(|e| e.to_string())
        }
        "tag.rename" => {
            let id = id_param(params, "id")?;
            let name = str_param(params, "name").ok_or("missing name")?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let tag = TagManager::new(a.db.connection()).rename(id, name).map_err(failure)?;
            serde_json::to_value(tag).map_err(|e| e.to_string())
        }

        // ─── Accounts ───
        "account.save" => {
            let username = str_param(params, "username").ok_or("missing username")?;
            let hash = str_param(params, "password_hash").ok_or("missing password_hash")?;
            let owner = flag_param(params, "owner");
            let a = app.lock().map_err(|e| e.to_string())?;
            let account = AccountManager::new(a.db.connection())
                .save(username, hash, owner)
                .map_err(failure)?;
            serde_json::to_value(account).map_err(|e| e.to_string())
        }
        "account.list" => {
            let query = AccountQuery {
                keyword: str_param(params, "keyword").unwrap_or("").to_string(),
                owner_only: flag_param(params, "owner_only"),
            };
            let a = app.lock().map_err(|e| e.to_string())?;
            let accounts = AccountManager::new(a.db.connection()).list(&query).map_err(failure)?;
            serde_json::to_value(accounts).map_err(|e| e.to_string())
        }
        "account.delete" => {
            let usernames = string_list(params, "usernames");
            if usernames.is_empty() {
                return Err("missing usernames".to_string());
            }
            let a = app.lock().map_err(|e| e.to_string())?;
            let removed = AccountManager::new(a.db.connection())
                .delete(&usernames)
                .map_err(failure)?;
            Ok(json!({"removed": removed}))
        }

        // ─── Settings ───
        "settings.get" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(a.settings_engine.get_settings()).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = str_param(params, "key").ok_or("missing key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.settings_engine.set_value(key, value).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
