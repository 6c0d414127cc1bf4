#![forbid(unsafe_code)]

use super::DAY_MS;

pub(crate) const SESSION_COOKIE: &str = "ss_session";
pub(crate) const REMEMBER_COOKIE: &str = "remember_me";

pub(crate) const SESSION_TTL_MS: i64 = DAY_MS;
pub(crate) const REMEMBER_TTL_MS: i64 = 30 * DAY_MS;

pub(crate) fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax")
}

pub(crate) fn remember_cookie(token: &str) -> String {
    format!(
        "{REMEMBER_COOKIE}={token}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        REMEMBER_TTL_MS / 1000
    )
}

pub(crate) fn expired_cookie(name: &str) -> String {
    format!("{name}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax")
}
