//! SQL rendering for bookmark searches.
//!
//! The list query and the count query share [`render_predicates`], so the two
//! can never disagree on which rows match.

use rusqlite::types::Value;

use super::link_manager::placeholders;
use crate::types::filter::{OrderMethod, ResolvedFilter, TagScope};

/// Columns selected for a bookmark row, in `BookmarkManager::row_to_bookmark` order.
pub const BOOKMARK_COLUMNS: &str =
    "b.id, b.url, b.title, b.excerpt, b.uid, b.public, b.image_url, b.modified";

/// A rendered statement and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Escapes `%`, `_` and the escape character itself for `LIKE ... ESCAPE '\'`.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Renders the `WHERE` predicates shared by search and count.
fn render_predicates(filter: &ResolvedFilter, sql: &mut String, params: &mut Vec<Value>) {
    sql.push_str(" WHERE 1 = 1");

    if !filter.ids.is_empty() {
        sql.push_str(&format!(" AND b.id IN ({})", placeholders(filter.ids.len())));
        params.extend(filter.ids.iter().map(|id| Value::Integer(*id)));
    }

    if let Some(keyword) = &filter.keyword {
        let pattern = format!("%{}%", escape_like(keyword));
        sql.push_str(" AND (b.url LIKE ? ESCAPE '\\' OR b.excerpt LIKE ? ESCAPE '\\')");
        params.push(Value::Text(pattern.clone()));
        params.push(Value::Text(pattern));
    }

    match filter.scope {
        TagScope::Untagged => {
            sql.push_str(" AND b.id NOT IN (SELECT bookmark_id FROM bookmark_tag)");
        }
        TagScope::Tagged => {
            sql.push_str(" AND b.id IN (SELECT bookmark_id FROM bookmark_tag)");
        }
        TagScope::Any => {}
    }

    // AND semantics: the number of matching links must equal the number of
    // requested names (names are deduplicated during resolution).
    if !filter.include_tags.is_empty() {
        sql.push_str(&format!(
            " AND b.id IN (\
             SELECT bt.bookmark_id FROM bookmark_tag bt \
             JOIN tag t ON t.id = bt.tag_id \
             WHERE t.name IN ({}) \
             GROUP BY bt.bookmark_id \
             HAVING COUNT(bt.tag_id) = ?)",
            placeholders(filter.include_tags.len())
        ));
        params.extend(filter.include_tags.iter().map(|t| Value::Text(t.clone())));
        params.push(Value::Integer(filter.include_tags.len() as i64));
    }

    if !filter.exclude_tags.is_empty() {
        sql.push_str(&format!(
            " AND b.id NOT IN (\
             SELECT bt.bookmark_id FROM bookmark_tag bt \
             JOIN tag t ON t.id = bt.tag_id \
             WHERE t.name IN ({}))",
            placeholders(filter.exclude_tags.len())
        ));
        params.extend(filter.exclude_tags.iter().map(|t| Value::Text(t.clone())));
    }
}

/// Renders the paginated, ordered list query.
pub fn render_search(filter: &ResolvedFilter) -> RenderedQuery {
    let mut sql = format!("SELECT {} FROM bookmark b", BOOKMARK_COLUMNS);
    let mut params = Vec::new();
    render_predicates(filter, &mut sql, &mut params);

    sql.push_str(match filter.order {
        OrderMethod::LastAdded => " ORDER BY b.id DESC",
        OrderMethod::LastModified => " ORDER BY b.modified DESC, b.id DESC",
        OrderMethod::Default => " ORDER BY b.id",
    });

    if let Some((limit, offset)) = filter.pagination {
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(Value::Integer(limit));
        params.push(Value::Integer(offset));
    }

    RenderedQuery { sql, params }
}

/// Renders the count query: same predicates, no ordering or pagination.
pub fn render_count(filter: &ResolvedFilter) -> RenderedQuery {
    let mut sql = String::from("SELECT COUNT(b.id) FROM bookmark b");
    let mut params = Vec::new();
    render_predicates(filter, &mut sql, &mut params);
    RenderedQuery { sql, params }
}
