#![forbid(unsafe_code)]

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::http::{HttpRequest, HttpResponse};
use crate::mail::{LogMailer, Mailer, OutboxMailer};
use crate::routes;
use crate::support::{
    REMEMBER_COOKIE, REMEMBER_TTL_MS, SESSION_COOKIE, SESSION_TTL_MS, expired_cookie,
    now_ms_i64, random_token, remember_cookie, session_cookie,
};
use serde_json::json;
use ss_storage::{IssueTokenRequest, RememberLookup, SqliteStore, UserRow};
use std::time::Instant;

pub struct App {
    pub(crate) store: SqliteStore,
    pub(crate) config: ServerConfig,
    pub(crate) mailer: Box<dyn Mailer + Send>,
}

/// Who is calling and which cookies the response must carry regardless of route.
#[derive(Debug, Default)]
pub(crate) struct RequestContext {
    pub(crate) user: Option<UserRow>,
    pub(crate) session_token: Option<String>,
    pub(crate) remember_token: Option<String>,
    pub(crate) cookies: Vec<String>,
}

impl App {
    pub fn open(config: ServerConfig) -> Result<Self, AppError> {
        let mailer: Box<dyn Mailer + Send> = match config.mail_outbox.as_ref() {
            Some(dir) => Box::new(OutboxMailer::new(dir)?),
            None => Box::new(LogMailer),
        };
        Self::with_mailer(config, mailer)
    }

    pub fn with_mailer(
        config: ServerConfig,
        mailer: Box<dyn Mailer + Send>,
    ) -> Result<Self, AppError> {
        let mut store = SqliteStore::open(&config.storage_dir)?;
        let purged = store.purge_expired_tokens(now_ms_i64())?;
        if purged > 0 {
            tracing::debug!(purged, "dropped expired sessions and remember tokens");
        }
        Ok(Self {
            store,
            config,
            mailer,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn handle(&mut self, request: &HttpRequest) -> HttpResponse {
        let started = Instant::now();
        let path = request.path();
        let response = match self.dispatch(request, &path) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(method = %request.method, path = %path, error = %err, "request failed");
                api_error(500, "internal_error")
            }
        };
        tracing::info!(
            method = %request.method,
            path = %path,
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request"
        );
        response
    }

    fn dispatch(&mut self, request: &HttpRequest, path: &str) -> Result<HttpResponse, AppError> {
        if request.body_truncated {
            return Ok(api_error(413, "body_too_large"));
        }
        let mut ctx = self.resolve_context(request)?;
        let response = routes::route(self, &mut ctx, request, path)?;
        let mut cookies = std::mem::take(&mut ctx.cookies);
        cookies.extend(response.set_cookies);
        Ok(HttpResponse {
            set_cookies: cookies,
            ..response
        })
    }

    /// Resolves the caller from the session cookie, falling back to the remember-me
    /// cookie. A remember token is spent on use and replaced by a fresh one; a token
    /// another request spent moments ago is left alone so that request's rotation wins.
    fn resolve_context(&mut self, request: &HttpRequest) -> Result<RequestContext, AppError> {
        let now_ms = now_ms_i64();
        let mut ctx = RequestContext {
            remember_token: request.cookie(REMEMBER_COOKIE),
            ..RequestContext::default()
        };

        if let Some(token) = request.cookie(SESSION_COOKIE) {
            if let Some(user) = self.store.session_user(&token, now_ms)? {
                ctx.user = Some(user);
                ctx.session_token = Some(token);
                return Ok(ctx);
            }
            ctx.cookies.push(expired_cookie(SESSION_COOKIE));
        }

        let Some(remember) = ctx.remember_token.take() else {
            return Ok(ctx);
        };
        let user = match self.store.consume_remember_token(&remember, now_ms)? {
            RememberLookup::Live(user_id) => self
                .store
                .find_user_by_id(user_id)?
                .filter(|user| user.active),
            RememberLookup::RecentlySpent => {
                tracing::debug!("remember token already rotated by a parallel request");
                ctx.remember_token = Some(remember);
                return Ok(ctx);
            }
            RememberLookup::Unknown => None,
        };
        let Some(user) = user else {
            tracing::debug!("stale remember token rejected");
            ctx.cookies.push(expired_cookie(REMEMBER_COOKIE));
            return Ok(ctx);
        };

        let session = self.open_session(user.id, now_ms)?;
        let fresh = self.issue_remember_token(user.id, now_ms)?;
        tracing::info!(user_id = user.id, "session restored from remember token");
        ctx.cookies.push(session_cookie(&session));
        ctx.cookies.push(remember_cookie(&fresh));
        ctx.session_token = Some(session);
        ctx.remember_token = Some(fresh);
        ctx.user = Some(user);
        Ok(ctx)
    }

    pub(crate) fn open_session(&mut self, user_id: i64, now_ms: i64) -> Result<String, AppError> {
        let token = random_token();
        self.store.open_session(IssueTokenRequest {
            user_id,
            token: token.clone(),
            created_at_ms: now_ms,
            expires_ms: now_ms + SESSION_TTL_MS,
        })?;
        Ok(token)
    }

    pub(crate) fn issue_remember_token(
        &mut self,
        user_id: i64,
        now_ms: i64,
    ) -> Result<String, AppError> {
        let token = random_token();
        self.store.issue_remember_token(IssueTokenRequest {
            user_id,
            token: token.clone(),
            created_at_ms: now_ms,
            expires_ms: now_ms + REMEMBER_TTL_MS,
        })?;
        Ok(token)
    }
}

pub(crate) fn api_error(status: u16, code: &str) -> HttpResponse {
    HttpResponse::json(status, &json!({ "error": [code] }))
}

pub(crate) fn field_error(status: u16, field: &str, code: &str) -> HttpResponse {
    HttpResponse::json(status, &json!({ "error": { field: code } }))
}
