#![forbid(unsafe_code)]

use rand::RngCore;

pub(crate) const TOKEN_BYTES: usize = 32;

/// Opaque random token as lowercase hex (64 chars).
pub(crate) fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut s = String::with_capacity(TOKEN_BYTES * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}
