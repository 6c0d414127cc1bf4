#![forbid(unsafe_code)]

use super::support::require_token;
use super::{
    IssueTokenRequest, REMEMBER_REUSE_GRACE_MS, RememberLookup, SqliteStore, StoreError,
    USER_COLUMNS, UserRow, token_digest, user_from_row,
};
use rusqlite::{OptionalExtension, params};

#[derive(Clone, Copy)]
enum TokenTable {
    Sessions,
    RememberTokens,
}

impl TokenTable {
    fn name(self) -> &'static str {
        match self {
            TokenTable::Sessions => "sessions",
            TokenTable::RememberTokens => "remember_tokens",
        }
    }
}

impl SqliteStore {
    pub fn open_session(&mut self, request: IssueTokenRequest) -> Result<(), StoreError> {
        self.issue_token(TokenTable::Sessions, request)
    }

    /// Active user behind a live session token.
    pub fn session_user(&self, token: &str, now_ms: i64) -> Result<Option<UserRow>, StoreError> {
        let digest = token_digest(require_token(token)?);
        let columns = USER_COLUMNS
            .split(", ")
            .map(|column| format!("u.{column}"))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {columns} FROM sessions s JOIN users u ON u.id = s.user_id \
                     WHERE s.digest=?1 AND s.expires_ms > ?2 AND u.active=1"
                ),
                params![digest, now_ms],
                user_from_row,
            )
            .optional()?)
    }

    pub fn close_session(&mut self, token: &str) -> Result<bool, StoreError> {
        self.delete_token(TokenTable::Sessions, token)
    }

    pub fn issue_remember_token(&mut self, request: IssueTokenRequest) -> Result<(), StoreError> {
        self.issue_token(TokenTable::RememberTokens, request)
    }

    /// Remember tokens are single-use. A live token is marked spent and yields its user;
    /// a token spent less than [`REMEMBER_REUSE_GRACE_MS`] ago reports
    /// [`RememberLookup::RecentlySpent`]. Expired tokens are deleted.
    pub fn consume_remember_token(
        &mut self,
        token: &str,
        now_ms: i64,
    ) -> Result<RememberLookup, StoreError> {
        let digest = token_digest(require_token(token)?);
        let tx = self.conn.transaction()?;
        let found = tx
            .query_row(
                "SELECT user_id, expires_ms, consumed_at_ms FROM remember_tokens WHERE digest=?1",
                params![digest],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                    ))
                },
            )
            .optional()?;
        let lookup = match found {
            None => RememberLookup::Unknown,
            Some((_, expires_ms, _)) if expires_ms <= now_ms => {
                tx.execute(
                    "DELETE FROM remember_tokens WHERE digest=?1",
                    params![digest],
                )?;
                RememberLookup::Unknown
            }
            Some((_, _, Some(consumed_at_ms))) => {
                if now_ms - consumed_at_ms < REMEMBER_REUSE_GRACE_MS {
                    RememberLookup::RecentlySpent
                } else {
                    RememberLookup::Unknown
                }
            }
            Some((user_id, _, None)) => {
                tx.execute(
                    "UPDATE remember_tokens SET consumed_at_ms=?2 WHERE digest=?1",
                    params![digest, now_ms],
                )?;
                RememberLookup::Live(user_id)
            }
        };
        tx.commit()?;
        Ok(lookup)
    }

    /// Drops a remember token outright, spent or not.
    pub fn revoke_remember_token(&mut self, token: &str) -> Result<bool, StoreError> {
        self.delete_token(TokenTable::RememberTokens, token)
    }

    /// Drops expired sessions and remember tokens, plus remember tokens spent before the
    /// grace window; returns how many rows went away.
    pub fn purge_expired_tokens(&mut self, now_ms: i64) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let mut removed = 0usize;
        for table in [TokenTable::Sessions, TokenTable::RememberTokens] {
            removed += tx.execute(
                &format!("DELETE FROM {} WHERE expires_ms <= ?1", table.name()),
                params![now_ms],
            )?;
        }
        removed += tx.execute(
            "DELETE FROM remember_tokens WHERE consumed_at_ms <= ?1",
            params![now_ms - REMEMBER_REUSE_GRACE_MS],
        )?;
        tx.commit()?;
        Ok(removed)
    }

    fn issue_token(
        &mut self,
        table: TokenTable,
        request: IssueTokenRequest,
    ) -> Result<(), StoreError> {
        let token = require_token(&request.token)?;
        if request.expires_ms <= request.created_at_ms {
            return Err(StoreError::InvalidInput("token must expire after it is issued"));
        }
        let insert = self.conn.execute(
            &format!(
                "INSERT INTO {}(digest, user_id, created_at_ms, expires_ms) VALUES (?1, ?2, ?3, ?4)",
                table.name()
            ),
            params![
                token_digest(token),
                request.user_id,
                request.created_at_ms,
                request.expires_ms,
            ],
        );
        match insert {
            Ok(_) => Ok(()),
            Err(err) if is_foreign_key_violation(&err) => Err(StoreError::UnknownId),
            Err(err) if super::support::is_constraint_violation(&err) => {
                Err(StoreError::Conflict("token already issued"))
            }
            Err(err) => Err(StoreError::Sql(err)),
        }
    }

    fn delete_token(&mut self, table: TokenTable, token: &str) -> Result<bool, StoreError> {
        let digest = token_digest(require_token(token)?);
        let deleted = self.conn.execute(
            &format!("DELETE FROM {} WHERE digest=?1", table.name()),
            params![digest],
        )?;
        Ok(deleted > 0)
    }
}

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(_, Some(message)) if message.contains("FOREIGN KEY")
    )
}
