#![forbid(unsafe_code)]

mod error;
mod models;
mod requests;
mod support;
mod tokens;
mod types;
mod users;

pub use error::StoreError;
pub use requests::*;
pub use support::token_digest;
pub use types::*;

use rusqlite::{Connection, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;
use support::migrate_sqlite_schema;

const DB_FILE_NAME: &str = "streamstory.db";

pub const GROUP_ADMIN: i64 = 1;
pub const GROUP_USER: i64 = 2;

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        migrate_sqlite_schema(&conn)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn schema_version(&self) -> Result<String, StoreError> {
        Ok(self.conn.query_row(
            "SELECT value FROM meta WHERE key='schema_version'",
            [],
            |row| row.get::<_, String>(0),
        )?)
    }
}

const USER_COLUMNS: &str =
    "id, email, password_hash, group_id, active, last_login_ms, created_at_ms";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        group_id: row.get(3)?,
        active: row.get::<_, i64>(4)? != 0,
        last_login_ms: row.get(5)?,
        created_at_ms: row.get(6)?,
    })
}
