#![forbid(unsafe_code)]

use super::parse_body;
use crate::app::{App, RequestContext, api_error, field_error};
use crate::error::AppError;
use crate::http::{HttpRequest, HttpResponse};
use crate::mail::{activation_mail, password_reset_mail};
use crate::support::{
    DAY_MS, REMEMBER_COOKIE, SESSION_COOKIE, expired_cookie, now_ms_i64, random_token,
    remember_cookie, session_cookie, ts_ms_to_rfc3339,
};
use serde::Deserialize;
use serde_json::{Value, json};
use ss_storage::{
    AddUserRequest, GROUP_USER, PasswordResetTokenRequest, ResetPasswordRequest, StoreError,
    UserRow,
};

pub(crate) const MIN_PASSWORD_LENGTH: usize = 6;
const PASSWORD_RESET_TTL_MS: i64 = DAY_MS;

#[derive(Deserialize)]
struct LoginBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    remember: bool,
}

#[derive(Deserialize)]
struct RegisterBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    password2: String,
}

#[derive(Deserialize)]
struct TokenBody {
    #[serde(default)]
    token: String,
}

#[derive(Deserialize)]
struct EmailBody {
    #[serde(default)]
    email: String,
}

#[derive(Deserialize)]
struct ResetBody {
    #[serde(default)]
    token: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    password2: String,
}

pub(crate) fn user_payload(user: &UserRow) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "groupId": user.group_id,
        "lastLogin": user.last_login_ms.map(ts_ms_to_rfc3339),
    })
}

pub(super) fn login(
    app: &mut App,
    ctx: &mut RequestContext,
    request: &HttpRequest,
) -> Result<HttpResponse, AppError> {
    if let Some(user) = ctx.user.as_ref() {
        return Ok(HttpResponse::json(200, &json!({ "user": user_payload(user) })));
    }
    let body = match parse_body::<LoginBody>(request) {
        Ok(body) => body,
        Err(response) => return Ok(response),
    };

    let Some(mut user) = lookup_user(app, &body.email)?.filter(|user| user.active) else {
        return Ok(field_error(401, "email", "unknown_email"));
    };
    if !bcrypt::verify(&body.password, &user.password_hash)? {
        tracing::info!(user_id = user.id, "login rejected: wrong password");
        return Ok(field_error(401, "password", "invalid_password"));
    }

    let now_ms = now_ms_i64();
    app.store.record_login(user.id, now_ms)?;
    user.last_login_ms = Some(now_ms);

    let session = app.open_session(user.id, now_ms)?;
    let mut cookies = vec![session_cookie(&session)];
    if body.remember {
        let remember = app.issue_remember_token(user.id, now_ms)?;
        cookies.push(remember_cookie(&remember));
    }
    ctx.session_token = Some(session);
    tracing::info!(user_id = user.id, remember = body.remember, "login");

    Ok(HttpResponse::json(200, &json!({ "user": user_payload(&user) })).with_cookies(cookies))
}

pub(super) fn logout(app: &mut App, ctx: &mut RequestContext) -> Result<HttpResponse, AppError> {
    let mut cookies = Vec::new();
    if let Some(session) = ctx.session_token.take() {
        app.store.close_session(&session)?;
        cookies.push(expired_cookie(SESSION_COOKIE));
    }
    if let Some(remember) = ctx.remember_token.take() {
        app.store.revoke_remember_token(&remember)?;
        cookies.push(expired_cookie(REMEMBER_COOKIE));
    }
    if let Some(user) = ctx.user.take() {
        tracing::info!(user_id = user.id, "logout");
    }
    Ok(HttpResponse::json(200, &json!({ "success": true })).with_cookies(cookies))
}

pub(super) fn status(ctx: &RequestContext) -> HttpResponse {
    let user = ctx.user.as_ref().map(user_payload).unwrap_or(Value::Null);
    HttpResponse::json(200, &json!({ "user": user }))
}

pub(super) fn register(app: &mut App, request: &HttpRequest) -> Result<HttpResponse, AppError> {
    let body = match parse_body::<RegisterBody>(request) {
        Ok(body) => body,
        Err(response) => return Ok(response),
    };

    match app.store.find_user_by_email(&body.email) {
        Ok(Some(_)) => return Ok(field_error(409, "email", "registered_email")),
        Ok(None) => {}
        Err(StoreError::InvalidInput(_)) => {
            return Ok(field_error(422, "email", "invalid_email"));
        }
        Err(err) => return Err(err.into()),
    }
    if let Some(response) = check_new_password(&body.password, &body.password2) {
        return Ok(response);
    }

    let password_hash = bcrypt::hash(&body.password, app.config.bcrypt_cost)?;
    let activation_token = random_token();
    let added = app.store.add_user(AddUserRequest {
        email: body.email.clone(),
        password_hash,
        group_id: GROUP_USER,
        activation_token: activation_token.clone(),
        created_at_ms: now_ms_i64(),
    });
    let user = match added {
        Ok(user) => user,
        Err(StoreError::Conflict(_)) => return Ok(field_error(409, "email", "registered_email")),
        Err(err) => {
            tracing::error!(error = %err, "registration failed");
            return Ok(api_error(500, "registration_failed"));
        }
    };

    let mail = activation_mail(&user.email, &app.config.host_url, &activation_token);
    app.mailer.send(&mail)?;
    tracing::info!(user_id = user.id, "registered");

    Ok(HttpResponse::json(200, &json!({ "success": true })))
}

pub(super) fn activate(app: &mut App, request: &HttpRequest) -> Result<HttpResponse, AppError> {
    let body = match parse_body::<TokenBody>(request) {
        Ok(body) => body,
        Err(response) => return Ok(response),
    };
    match app.store.activate_user(&body.token) {
        Ok(Some(user)) => {
            tracing::info!(user_id = user.id, "account activated");
            Ok(HttpResponse::json(200, &json!({ "success": true })))
        }
        Ok(None) | Err(StoreError::InvalidInput(_)) => Ok(api_error(403, "activation_failed")),
        Err(err) => Err(err.into()),
    }
}

pub(super) fn initiate_password_reset(
    app: &mut App,
    request: &HttpRequest,
) -> Result<HttpResponse, AppError> {
    let body = match parse_body::<EmailBody>(request) {
        Ok(body) => body,
        Err(response) => return Ok(response),
    };
    let Some(user) = lookup_user(app, &body.email)?.filter(|user| user.active) else {
        return Ok(field_error(401, "email", "unknown_email"));
    };

    let token = random_token();
    let stored = app.store.set_password_reset_token(PasswordResetTokenRequest {
        email: user.email.clone(),
        token: token.clone(),
        expires_ms: now_ms_i64() + PASSWORD_RESET_TTL_MS,
    });
    match stored {
        Ok(true) => {}
        Ok(false) => {
            tracing::error!(user_id = user.id, "password reset token not stored");
            return Ok(api_error(500, "password_reset_initiation_failed"));
        }
        Err(err) => {
            tracing::error!(user_id = user.id, error = %err, "password reset token not stored");
            return Ok(api_error(500, "password_reset_initiation_failed"));
        }
    }

    let mail = password_reset_mail(&user.email, &app.config.host_url, &token);
    app.mailer.send(&mail)?;
    tracing::info!(user_id = user.id, "password reset initiated");

    Ok(HttpResponse::json(200, &json!({ "success": true })))
}

pub(super) fn reset_password(
    app: &mut App,
    request: &HttpRequest,
) -> Result<HttpResponse, AppError> {
    let body = match parse_body::<ResetBody>(request) {
        Ok(body) => body,
        Err(response) => return Ok(response),
    };
    if let Some(response) = check_new_password(&body.password, &body.password2) {
        return Ok(response);
    }

    let password_hash = bcrypt::hash(&body.password, app.config.bcrypt_cost)?;
    let reset = app.store.reset_password(ResetPasswordRequest {
        token: body.token,
        password_hash,
        now_ms: now_ms_i64(),
    });
    match reset {
        Ok(Some(user)) => {
            tracing::info!(user_id = user.id, "password reset");
            Ok(HttpResponse::json(200, &json!({ "success": true })))
        }
        Ok(None) => {
            tracing::info!("password reset rejected: unknown or expired token");
            Ok(api_error(500, "password_reset_failed"))
        }
        Err(err) => {
            tracing::error!(error = %err, "password reset failed");
            Ok(api_error(500, "password_reset_failed"))
        }
    }
}

/// Malformed addresses are treated like unknown ones.
fn lookup_user(app: &App, email: &str) -> Result<Option<UserRow>, AppError> {
    match app.store.find_user_by_email(email) {
        Ok(user) => Ok(user),
        Err(StoreError::InvalidInput(_)) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn check_new_password(password: &str, password2: &str) -> Option<HttpResponse> {
    // Length is counted in UTF-16 code units, as browsers count it.
    if password.encode_utf16().count() < MIN_PASSWORD_LENGTH {
        return Some(field_error(422, "password", "short_password"));
    }
    if password != password2 {
        return Some(field_error(422, "password2", "password_mismatch"));
    }
    None
}
