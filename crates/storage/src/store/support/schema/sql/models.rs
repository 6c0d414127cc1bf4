#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS models (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL,
          owner_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
          model_json TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL
        );
"#;
