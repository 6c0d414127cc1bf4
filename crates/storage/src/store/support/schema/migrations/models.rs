#![forbid(unsafe_code)]

use super::super::super::super::StoreError;
use super::util::ensure_column;
use rusqlite::Connection;

// Databases created before state edits were persisted lack the edit timestamp.
pub(super) fn apply(conn: &Connection) -> Result<(), StoreError> {
    ensure_column(conn, "models", "updated_at_ms", "INTEGER")?;
    conn.execute(
        "UPDATE models SET updated_at_ms=created_at_ms WHERE updated_at_ms IS NULL",
        [],
    )?;
    Ok(())
}
