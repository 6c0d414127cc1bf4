#![forbid(unsafe_code)]

mod auth;
mod core;
mod indexes;
mod models;
mod pragmas;

pub(super) fn full_schema_sql() -> String {
    let mut sql = String::new();
    sql.push_str(pragmas::SQL);
    sql.push_str(core::SQL);
    sql.push_str(auth::SQL);
    sql.push_str(models::SQL);
    sql.push_str(indexes::SQL);
    sql
}
