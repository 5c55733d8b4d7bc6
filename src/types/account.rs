use serde::{Deserialize, Serialize};

/// A login identity that owns bookmarks.
///
/// `password_hash` is an opaque, already-hashed value; it is never returned by
/// listing queries and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    /// Administrators may manage other accounts.
    pub owner: bool,
}

/// Options for listing accounts.
#[derive(Debug, Clone, Default)]
pub struct AccountQuery {
    pub keyword: String,
    pub owner_only: bool,
}
