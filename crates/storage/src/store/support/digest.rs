#![forbid(unsafe_code)]

use sha2::{Digest, Sha256};

/// Hex SHA-256 of a raw token. Only this form is ever written to the database.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let out = hasher.finalize();
    let mut s = String::with_capacity(64);
    for b in out {
        s.push_str(&format!("{b:02x}"));
    }
    s
}
