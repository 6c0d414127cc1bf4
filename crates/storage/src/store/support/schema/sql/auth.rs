#![forbid(unsafe_code)]

// Token columns hold SHA-256 digests; raw tokens only ever live in cookies and mails.
pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS users (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          email TEXT NOT NULL UNIQUE,
          password_hash TEXT NOT NULL,
          group_id INTEGER NOT NULL,
          active INTEGER NOT NULL DEFAULT 0,
          activation_digest TEXT,
          reset_digest TEXT,
          reset_expires_ms INTEGER,
          last_login_ms INTEGER,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sessions (
          digest TEXT PRIMARY KEY,
          user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
          created_at_ms INTEGER NOT NULL,
          expires_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS remember_tokens (
          digest TEXT PRIMARY KEY,
          user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
          created_at_ms INTEGER NOT NULL,
          expires_ms INTEGER NOT NULL,
          consumed_at_ms INTEGER
        );
"#;
