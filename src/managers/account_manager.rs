//! Account Manager for tagmark.
//!
//! Accounts are the owners referenced by `bookmark.uid`. Password hashing is
//! done by the caller; this store only keeps the opaque hash.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::database::in_transaction;
use crate::managers::bookmark_query::escape_like;
use crate::types::account::{Account, AccountQuery};
use crate::types::errors::BookmarkError;

/// Trait defining account operations.
pub trait AccountManagerTrait {
    fn save(&self, username: &str, password_hash: &str, owner: bool) -> Result<Account, BookmarkError>;
    fn get(&self, username: &str) -> Result<Account, BookmarkError>;
    fn list(&self, query: &AccountQuery) -> Result<Vec<Account>, BookmarkError>;
    fn delete(&self, usernames: &[String]) -> Result<usize, BookmarkError>;
}

/// Account store backed by a SQLite connection.
pub struct AccountManager<'a> {
    conn: &'a Connection,
}

impl<'a> AccountManager<'a> {
    /// Creates a new `AccountManager` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl<'a> AccountManagerTrait for AccountManager<'a> {
    /// Creates the account, or updates hash and owner flag when the username exists.
    fn save(&self, username: &str, password_hash: &str, owner: bool) -> Result<Account, BookmarkError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(BookmarkError::Validation("username must not be empty".to_string()));
        }
        if password_hash.is_empty() {
            return Err(BookmarkError::Validation("password hash must not be empty".to_string()));
        }

        self.conn.execute(
            "INSERT INTO account (username, password, owner) VALUES (?1, ?2, ?3) \
             ON CONFLICT(username) DO UPDATE SET password = excluded.password, owner = excluded.owner",
            params![username, password_hash, owner],
        )?;
        self.get(username)
    }

    /// Fetches one account including its password hash.
    fn get(&self, username: &str) -> Result<Account, BookmarkError> {
        self.conn
            .query_row(
                "SELECT id, username, password, owner FROM account WHERE username = ?1",
                params![username],
                |row| {
                    Ok(Account {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                        owner: row.get(3)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| BookmarkError::NotFound(format!("account {}", username)))
    }

    /// Lists accounts ordered by username. Password hashes are never loaded.
    fn list(&self, query: &AccountQuery) -> Result<Vec<Account>, BookmarkError> {
        let mut sql = String::from("SELECT id, username, owner FROM account WHERE 1 = 1");
        let mut args: Vec<String> = Vec::new();

        let keyword = query.keyword.trim();
        if !keyword.is_empty() {
            sql.push_str(" AND username LIKE ?1 ESCAPE '\\'");
            args.push(format!("%{}%", escape_like(keyword)));
        }
        if query.owner_only {
            sql.push_str(" AND owner = 1");
        }
        sql.push_str(" ORDER BY username");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
            Ok(Account {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: String::new(),
                owner: row.get(2)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Deletes the named accounts in one transaction, returning how many existed.
    fn delete(&self, usernames: &[String]) -> Result<usize, BookmarkError> {
        let removed = in_transaction(self.conn, |conn| {
            let mut stmt = conn.prepare_cached("DELETE FROM account WHERE username = ?1")?;
            let mut removed = 0;
            for username in usernames {
                removed += stmt.execute(params![username])?;
            }
            Ok::<_, BookmarkError>(removed)
        })?;
        info!(removed, "deleted accounts");
        Ok(removed)
    }
}
