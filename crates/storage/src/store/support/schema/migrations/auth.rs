#![forbid(unsafe_code)]

use super::super::super::super::StoreError;
use super::util::ensure_column;
use rusqlite::Connection;

// Older databases deleted remember tokens on use instead of marking them spent.
pub(super) fn apply(conn: &Connection) -> Result<(), StoreError> {
    ensure_column(conn, "remember_tokens", "consumed_at_ms", "INTEGER")?;
    Ok(())
}
