#![forbid(unsafe_code)]

use crate::mail::MailError;
use ss_storage::StoreError;
use thiserror::Error;

/// Failures that end a request with a generic 500. Expected outcomes (bad credentials,
/// validation) are answered by the handlers directly.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("password hashing: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Mail(#[from] MailError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
