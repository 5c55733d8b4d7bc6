//! Unit-of-work helper shared by every mutating operation.

use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Runs `f` atomically.
///
/// When `conn` is already inside a transaction, `f` joins it and the caller
/// keeps ownership of commit/rollback. Otherwise an IMMEDIATE transaction is
/// opened, committed when `f` succeeds, and rolled back (on drop) when it fails.
///
/// IMMEDIATE takes SQLite's write lock up front, so two writers serialize on
/// the busy timeout instead of failing a read-to-write lock upgrade.
pub fn in_transaction<T, E, F>(conn: &Connection, f: F) -> Result<T, E>
where
    E: From<rusqlite::Error>,
    F: FnOnce(&Connection) -> Result<T, E>,
{
    if !conn.is_autocommit() {
        return f(conn);
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let out = f(&tx)?;
    tx.commit()?;
    Ok(out)
}
