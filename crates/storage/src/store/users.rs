#![forbid(unsafe_code)]

use super::support::{is_constraint_violation, normalize_email, require_token};
use super::{
    AddUserRequest, PasswordResetTokenRequest, ResetPasswordRequest, SqliteStore, StoreError,
    USER_COLUMNS, UserRow, token_digest, user_from_row,
};
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>, StoreError> {
        let email = normalize_email(email)?;
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email=?1"),
                params![email],
                user_from_row,
            )
            .optional()?)
    }

    pub fn find_user_by_id(&self, user_id: i64) -> Result<Option<UserRow>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id=?1"),
                params![user_id],
                user_from_row,
            )
            .optional()?)
    }

    /// Inserts an inactive user awaiting activation through `activation_token`.
    pub fn add_user(&mut self, request: AddUserRequest) -> Result<UserRow, StoreError> {
        let email = normalize_email(&request.email)?;
        let token = require_token(&request.activation_token)?;
        if request.password_hash.is_empty() {
            return Err(StoreError::InvalidInput("password hash must not be empty"));
        }

        let tx = self.conn.transaction()?;
        let insert = tx.execute(
            "INSERT INTO users(email, password_hash, group_id, active, activation_digest, created_at_ms) \
             VALUES (?1, ?2, ?3, 0, ?4, ?5)",
            params![
                email,
                request.password_hash,
                request.group_id,
                token_digest(token),
                request.created_at_ms,
            ],
        );
        if let Err(err) = insert {
            if is_constraint_violation(&err) {
                return Err(StoreError::Conflict("email already registered"));
            }
            return Err(StoreError::Sql(err));
        }
        let id = tx.last_insert_rowid();
        tx.commit()?;

        self.find_user_by_id(id)?.ok_or(StoreError::UnknownId)
    }

    /// Returns the activated user, or `None` when no pending activation matches.
    pub fn activate_user(&mut self, token: &str) -> Result<Option<UserRow>, StoreError> {
        let digest = token_digest(require_token(token)?);
        let tx = self.conn.transaction()?;
        let user_id = tx
            .query_row(
                "SELECT id FROM users WHERE activation_digest=?1",
                params![digest],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        let Some(user_id) = user_id else {
            return Ok(None);
        };
        tx.execute(
            "UPDATE users SET active=1, activation_digest=NULL WHERE id=?1",
            params![user_id],
        )?;
        tx.commit()?;
        self.find_user_by_id(user_id)
    }

    pub fn record_login(&mut self, user_id: i64, now_ms: i64) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE users SET last_login_ms=?2 WHERE id=?1",
            params![user_id, now_ms],
        )?;
        if updated == 0 {
            return Err(StoreError::UnknownId);
        }
        Ok(())
    }

    /// Stores a reset token for an active account. Returns false when the email is
    /// unknown or the account is not activated.
    pub fn set_password_reset_token(
        &mut self,
        request: PasswordResetTokenRequest,
    ) -> Result<bool, StoreError> {
        let email = normalize_email(&request.email)?;
        let token = require_token(&request.token)?;
        let updated = self.conn.execute(
            "UPDATE users SET reset_digest=?2, reset_expires_ms=?3 WHERE email=?1 AND active=1",
            params![email, token_digest(token), request.expires_ms],
        )?;
        Ok(updated > 0)
    }

    /// Swaps the password hash when the reset token is known and unexpired. The token
    /// is single-use; every open session and remember token of the user is dropped.
    pub fn reset_password(
        &mut self,
        request: ResetPasswordRequest,
    ) -> Result<Option<UserRow>, StoreError> {
        let digest = token_digest(require_token(&request.token)?);
        if request.password_hash.is_empty() {
            return Err(StoreError::InvalidInput("password hash must not be empty"));
        }

        let tx = self.conn.transaction()?;
        let found = tx
            .query_row(
                "SELECT id, reset_expires_ms FROM users WHERE reset_digest=?1",
                params![digest],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<i64>>(1)?)),
            )
            .optional()?;
        let Some((user_id, expires_ms)) = found else {
            return Ok(None);
        };
        if expires_ms.is_none_or(|expires_ms| expires_ms <= request.now_ms) {
            tx.execute(
                "UPDATE users SET reset_digest=NULL, reset_expires_ms=NULL WHERE id=?1",
                params![user_id],
            )?;
            tx.commit()?;
            return Ok(None);
        }

        tx.execute(
            "UPDATE users SET password_hash=?2, reset_digest=NULL, reset_expires_ms=NULL WHERE id=?1",
            params![user_id, request.password_hash],
        )?;
        tx.execute("DELETE FROM sessions WHERE user_id=?1", params![user_id])?;
        tx.execute(
            "DELETE FROM remember_tokens WHERE user_id=?1",
            params![user_id],
        )?;
        tx.commit()?;
        self.find_user_by_id(user_id)
    }
}
