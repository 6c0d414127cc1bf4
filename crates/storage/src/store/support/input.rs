#![forbid(unsafe_code)]

use super::super::StoreError;
use rusqlite::ErrorCode;

pub(in crate::store) fn normalize_email(email: &str) -> Result<String, StoreError> {
    let email = email.trim().to_ascii_lowercase();
    if email.is_empty() {
        return Err(StoreError::InvalidInput("email must not be empty"));
    }
    if !email.contains('@') {
        return Err(StoreError::InvalidInput("email must contain '@'"));
    }
    Ok(email)
}

pub(in crate::store) fn require_token(token: &str) -> Result<&str, StoreError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(StoreError::InvalidInput("token must not be empty"));
    }
    Ok(token)
}

pub(in crate::store) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message
                    .as_deref()
                    .is_some_and(|value| value.contains("UNIQUE constraint failed"))
        }
        _ => false,
    }
}
