//! URL clean-up applied to bookmark URLs before they are stored.

use reqwest::Url;

use crate::types::errors::BookmarkError;

/// Removes `utm_*` tracking parameters from `raw`.
///
/// URLs without tracking parameters are returned exactly as given (trimmed),
/// so re-saving a bookmark never rewrites its key.
pub fn clean_url(raw: &str) -> Result<String, BookmarkError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(BookmarkError::Validation("URL must not be empty".to_string()));
    }

    let mut url = Url::parse(raw)
        .map_err(|e| BookmarkError::Validation(format!("invalid URL {}: {}", raw, e)))?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let kept: Vec<&(String, String)> = pairs.iter().filter(|(k, _)| !is_tracking_param(k)).collect();
    if kept.len() == pairs.len() {
        return Ok(raw.to_string());
    }

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    Ok(url.to_string())
}

fn is_tracking_param(key: &str) -> bool {
    key.len() > 4 && key.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("utm_"))
}
