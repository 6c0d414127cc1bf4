#![forbid(unsafe_code)]

use ss_core::{Model, StateNo, StateUpdate};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddUserRequest {
    pub email: String,
    pub password_hash: String,
    pub group_id: i64,
    pub activation_token: String,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordResetTokenRequest {
    pub email: String,
    pub token: String,
    pub expires_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password_hash: String,
    pub now_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueTokenRequest {
    pub user_id: i64,
    pub token: String,
    pub created_at_ms: i64,
    pub expires_ms: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InsertModelRequest {
    pub name: String,
    pub owner_id: Option<i64>,
    pub model: Model,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateStateRequest {
    pub model_id: i64,
    pub initial_states: Vec<StateNo>,
    pub update: StateUpdate,
    pub updated_at_ms: i64,
}
