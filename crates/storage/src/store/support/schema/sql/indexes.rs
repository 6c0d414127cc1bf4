#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE UNIQUE INDEX IF NOT EXISTS idx_users_activation ON users(activation_digest) WHERE activation_digest IS NOT NULL;
        CREATE UNIQUE INDEX IF NOT EXISTS idx_users_reset ON users(reset_digest) WHERE reset_digest IS NOT NULL;
        CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
        CREATE INDEX IF NOT EXISTS idx_remember_tokens_user ON remember_tokens(user_id);
        CREATE INDEX IF NOT EXISTS idx_models_owner ON models(owner_id, id);
"#;
