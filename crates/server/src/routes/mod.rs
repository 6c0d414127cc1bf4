#![forbid(unsafe_code)]

mod auth;
mod models;

use crate::app::{App, RequestContext, api_error};
use crate::error::AppError;
use crate::http::{HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;

pub(crate) fn route(
    app: &mut App,
    ctx: &mut RequestContext,
    request: &HttpRequest,
    path: &str,
) -> Result<HttpResponse, AppError> {
    let method = match request.method.as_str() {
        "HEAD" => "GET",
        other => other,
    };
    let segments = path
        .trim_start_matches('/')
        .split('/')
        .collect::<Vec<_>>();

    match (method, segments.as_slice()) {
        ("POST", ["api", "auth", "login"]) => auth::login(app, ctx, request),
        ("POST", ["api", "auth", "logout"]) => auth::logout(app, ctx),
        ("GET", ["api", "auth", "status"]) => Ok(auth::status(ctx)),
        ("POST", ["api", "auth", "register"]) => auth::register(app, request),
        ("POST", ["api", "auth", "activate"]) => auth::activate(app, request),
        ("POST", ["api", "auth", "password-reset"]) => {
            auth::initiate_password_reset(app, request)
        }
        ("POST", ["api", "auth", "password-reset", "confirm"]) => {
            auth::reset_password(app, request)
        }
        ("GET", ["api", "models"]) => models::list(app),
        ("POST", ["api", "models"]) => models::create(app, ctx, request),
        ("GET", ["api", "models", id]) => models::show(app, id),
        ("GET", ["api", "models", id, "graph"]) => models::graph(app, id, request),
        ("GET", ["api", "models", id, "history"]) => models::history(app, id, request),
        ("POST", ["api", "models", id, "state"]) => models::update_state(app, ctx, id, request),
        _ => Ok(api_error(404, "not_found")),
    }
}

fn parse_body<T: DeserializeOwned>(request: &HttpRequest) -> Result<T, HttpResponse> {
    serde_json::from_slice(&request.body).map_err(|err| {
        tracing::debug!(error = %err, "rejected request body");
        api_error(400, "invalid_body")
    })
}
