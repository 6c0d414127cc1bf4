#![forbid(unsafe_code)]

mod auth;
mod models;
mod util;

use super::super::super::StoreError;
use rusqlite::Connection;

pub(super) fn apply(conn: &Connection) -> Result<(), StoreError> {
    auth::apply(conn)?;
    models::apply(conn)?;
    Ok(())
}
