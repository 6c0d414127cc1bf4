#![forbid(unsafe_code)]

mod digest;
mod input;
mod schema;

pub use digest::token_digest;
pub(super) use input::*;
pub(super) use schema::migrate_sqlite_schema;
