#![forbid(unsafe_code)]

use super::StoreError;
use ss_core::Model;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub group_id: i64,
    pub active: bool,
    pub last_login_ms: Option<i64>,
    pub created_at_ms: i64,
}

/// How long a spent remember token keeps answering as recently spent, so parallel
/// requests that raced the rotation are not treated as a stolen cookie.
pub const REMEMBER_REUSE_GRACE_MS: i64 = 60_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RememberLookup {
    /// Live token, now spent; carries the owning user id.
    Live(i64),
    /// Spent within the grace window by another request.
    RecentlySpent,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelRow {
    pub id: i64,
    pub name: String,
    pub owner_id: Option<i64>,
    pub model_json: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl ModelRow {
    pub fn model(&self) -> Result<Model, StoreError> {
        Ok(Model::from_json(&self.model_json)?)
    }
}
