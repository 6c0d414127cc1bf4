#![forbid(unsafe_code)]

use ss_storage::{
    AddUserRequest, GROUP_USER, IssueTokenRequest, PasswordResetTokenRequest,
    ResetPasswordRequest, SqliteStore, StoreError,
};
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("ss_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn add_user(store: &mut SqliteStore, email: &str, activation_token: &str) -> i64 {
    store
        .add_user(AddUserRequest {
            email: email.to_string(),
            password_hash: "$2b$04$hash".to_string(),
            group_id: GROUP_USER,
            activation_token: activation_token.to_string(),
            created_at_ms: 1_000,
        })
        .expect("add user")
        .id
}

#[test]
fn registration_is_inactive_until_activated() {
    let storage_dir = temp_dir("registration_is_inactive_until_activated");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let id = add_user(&mut store, " Ana@Example.com ", "act-1");

    let user = store
        .find_user_by_email("ana@example.COM")
        .expect("lookup")
        .expect("user exists");
    assert_eq!(user.id, id);
    assert_eq!(user.email, "ana@example.com");
    assert_eq!(user.group_id, GROUP_USER);
    assert!(!user.active);
    assert_eq!(user.last_login_ms, None);

    assert!(store.activate_user("wrong").expect("activate").is_none());
    let activated = store.activate_user("act-1").expect("activate").expect("user");
    assert!(activated.active);
    // Activation tokens are single-use.
    assert!(store.activate_user("act-1").expect("activate").is_none());

    store.record_login(id, 5_000).expect("record login");
    let user = store.find_user_by_id(id).expect("lookup").expect("user");
    assert_eq!(user.last_login_ms, Some(5_000));
    assert!(matches!(
        store.record_login(999, 5_000),
        Err(StoreError::UnknownId)
    ));
}

#[test]
fn duplicate_email_is_a_conflict() {
    let storage_dir = temp_dir("duplicate_email_is_a_conflict");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    add_user(&mut store, "ana@example.com", "act-1");
    let err = store
        .add_user(AddUserRequest {
            email: "ANA@example.com".to_string(),
            password_hash: "x".to_string(),
            group_id: GROUP_USER,
            activation_token: "act-2".to_string(),
            created_at_ms: 2_000,
        })
        .expect_err("duplicate");
    assert!(matches!(err, StoreError::Conflict(_)));

    assert!(matches!(
        store.find_user_by_email("not-an-email"),
        Err(StoreError::InvalidInput(_))
    ));
}

#[test]
fn password_reset_requires_active_account_and_live_token() {
    let storage_dir = temp_dir("password_reset_requires_active_account_and_live_token");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let id = add_user(&mut store, "ana@example.com", "act-1");

    let request = |token: &str, expires_ms: i64| PasswordResetTokenRequest {
        email: "ana@example.com".to_string(),
        token: token.to_string(),
        expires_ms,
    };
    assert!(!store.set_password_reset_token(request("r-0", 10_000)).expect("set"));

    store.activate_user("act-1").expect("activate");
    assert!(store.set_password_reset_token(request("r-1", 10_000)).expect("set"));

    store
        .open_session(IssueTokenRequest {
            user_id: id,
            token: "sess".to_string(),
            created_at_ms: 1_000,
            expires_ms: 100_000,
        })
        .expect("open session");

    let reset = store
        .reset_password(ResetPasswordRequest {
            token: "r-1".to_string(),
            password_hash: "new-hash".to_string(),
            now_ms: 9_000,
        })
        .expect("reset")
        .expect("user");
    assert_eq!(reset.password_hash, "new-hash");
    assert!(store.session_user("sess", 9_000).expect("session").is_none());

    // Used once, gone.
    assert!(
        store
            .reset_password(ResetPasswordRequest {
                token: "r-1".to_string(),
                password_hash: "again".to_string(),
                now_ms: 9_000,
            })
            .expect("reset")
            .is_none()
    );

    assert!(store.set_password_reset_token(request("r-2", 10_000)).expect("set"));
    assert!(
        store
            .reset_password(ResetPasswordRequest {
                token: "r-2".to_string(),
                password_hash: "late".to_string(),
                now_ms: 10_000,
            })
            .expect("reset")
            .is_none()
    );
    let user = store.find_user_by_id(id).expect("lookup").expect("user");
    assert_eq!(user.password_hash, "new-hash");
}
