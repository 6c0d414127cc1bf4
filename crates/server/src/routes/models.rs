#![forbid(unsafe_code)]

use super::parse_body;
use crate::app::{App, RequestContext, api_error, field_error};
use crate::error::AppError;
use crate::http::{HttpRequest, HttpResponse};
use crate::support::{now_ms_i64, ts_ms_to_rfc3339};
use serde::Deserialize;
use serde_json::json;
use ss_core::history::segments_in_window;
use ss_core::model::parse_initial_states_key;
use ss_core::{
    DEFAULT_THRESHOLD, InteractionError, LayoutConfig, LayoutError, Model, StateNo, StateUpdate,
    ViewController, aggregate_model, build_history,
};
use ss_storage::{InsertModelRequest, ModelRow, StoreError, UpdateStateRequest};

#[derive(Deserialize)]
struct CreateModelBody {
    name: String,
    model: Model,
}

/// Browsers send the cluster either as a list or as the comma-joined key.
#[derive(Deserialize)]
#[serde(untagged)]
enum InitialStatesField {
    List(Vec<StateNo>),
    Joined(String),
}

impl InitialStatesField {
    fn into_states(self) -> Option<Vec<StateNo>> {
        match self {
            InitialStatesField::List(states) => Some(states),
            InitialStatesField::Joined(raw) if raw.trim().is_empty() => Some(Vec::new()),
            InitialStatesField::Joined(raw) => parse_initial_states_key(&raw),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateEditBody {
    initial_states: InitialStatesField,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    event_id: Option<String>,
}

pub(super) fn list(app: &mut App) -> Result<HttpResponse, AppError> {
    let models = app
        .store
        .list_models(None)?
        .iter()
        .map(|row| {
            json!({
                "id": row.id,
                "name": row.name,
                "createdAt": ts_ms_to_rfc3339(row.created_at_ms),
            })
        })
        .collect::<Vec<_>>();
    Ok(HttpResponse::json(200, &json!({ "models": models })))
}

pub(super) fn create(
    app: &mut App,
    ctx: &RequestContext,
    request: &HttpRequest,
) -> Result<HttpResponse, AppError> {
    let Some(user) = ctx.user.as_ref() else {
        return Ok(api_error(401, "unauthenticated"));
    };
    let body = match parse_body::<CreateModelBody>(request) {
        Ok(body) => body,
        Err(response) => return Ok(response),
    };
    if body.name.trim().is_empty() {
        return Ok(field_error(422, "name", "empty_name"));
    }
    let mut model = body.model;
    if model.scales.is_empty() {
        return Ok(field_error(422, "model", "empty_model"));
    }
    // Reject models the views could not render before they are stored.
    if let Err(err) = aggregate_model(&model, &LayoutConfig::default(), DEFAULT_THRESHOLD) {
        tracing::info!(error = %err, "model rejected");
        return Ok(field_error(422, "model", err.code()));
    }
    if let Err(err) = build_history(&model) {
        tracing::info!(error = %err, "model rejected");
        return Ok(field_error(422, "model", err.code()));
    }
    if let Err(err) = model.resolve_initial_states() {
        tracing::info!(error = %err, "model rejected");
        return Ok(field_error(422, "model", err.code()));
    }

    let row = app.store.insert_model(InsertModelRequest {
        name: body.name,
        owner_id: Some(user.id),
        model,
        created_at_ms: now_ms_i64(),
    })?;
    tracing::info!(model_id = row.id, user_id = user.id, "model stored");
    Ok(HttpResponse::json(200, &json!({ "id": row.id })))
}

pub(super) fn show(app: &mut App, id: &str) -> Result<HttpResponse, AppError> {
    let Some(row) = load_model(app, id)? else {
        return Ok(api_error(404, "not_found"));
    };
    model_response(&row)
}

pub(super) fn graph(
    app: &mut App,
    id: &str,
    request: &HttpRequest,
) -> Result<HttpResponse, AppError> {
    let Some(row) = load_model(app, id)? else {
        return Ok(api_error(404, "not_found"));
    };
    let mut view = match ViewController::new(row.model()?, LayoutConfig::default()) {
        Ok(view) => view,
        Err(err) => {
            tracing::info!(model_id = row.id, error = %err, "graph view unavailable");
            return Ok(field_error(400, "model", err.code()));
        }
    };

    if let Some(raw) = request.query_param("threshold") {
        let applied = raw
            .trim()
            .parse::<f64>()
            .ok()
            .map(|threshold| view.set_threshold(threshold));
        if !matches!(applied, Some(Ok(()))) {
            return Ok(field_error(400, "threshold", "invalid_threshold"));
        }
    }
    if let Some(raw) = request.query_param("scale") {
        let applied = raw
            .trim()
            .parse::<usize>()
            .ok()
            .map(|scale_ix| view.set_scale(scale_ix));
        match applied {
            Some(Ok(())) => {}
            Some(Err(InteractionError::Layout(LayoutError::UnknownScale { .. }))) | None => {
                return Ok(field_error(400, "scale", "invalid_scale"));
            }
            Some(Err(err)) => {
                tracing::info!(model_id = row.id, error = %err, "graph view unavailable");
                return Ok(field_error(400, "model", err.code()));
            }
        }
    }

    let graph = view.graph();
    Ok(HttpResponse::json(
        200,
        &json!({
            "scale": view.scale_ix(),
            "threshold": view.threshold(),
            "scaleCount": view.model().scales.len(),
            "graph": { "nodes": graph.nodes, "links": graph.links },
            "boundary": view.boundary(),
        }),
    ))
}

pub(super) fn history(
    app: &mut App,
    id: &str,
    request: &HttpRequest,
) -> Result<HttpResponse, AppError> {
    let Some(row) = load_model(app, id)? else {
        return Ok(api_error(404, "not_found"));
    };
    let mut scales = match build_history(&row.model()?) {
        Ok(scales) => scales,
        Err(err) => {
            tracing::info!(model_id = row.id, error = %err, "history unavailable");
            return Ok(field_error(400, "history", err.code()));
        }
    };

    let from = request.query_param("from");
    let to = request.query_param("to");
    if from.is_some() || to.is_some() {
        let parse = |raw: Option<String>, open: f64| match raw {
            Some(raw) => raw.trim().parse::<f64>().ok().filter(|value| !value.is_nan()),
            None => Some(open),
        };
        let (Some(from), Some(to)) = (parse(from, f64::NEG_INFINITY), parse(to, f64::INFINITY))
        else {
            return Ok(field_error(400, "window", "invalid_window"));
        };
        scales = segments_in_window(&scales, from, to);
    }

    Ok(HttpResponse::json(200, &json!({ "scales": scales })))
}

pub(super) fn update_state(
    app: &mut App,
    ctx: &RequestContext,
    id: &str,
    request: &HttpRequest,
) -> Result<HttpResponse, AppError> {
    let Some(user) = ctx.user.as_ref() else {
        return Ok(api_error(401, "unauthenticated"));
    };
    let Ok(model_id) = id.parse::<i64>() else {
        return Ok(api_error(404, "not_found"));
    };
    let body = match parse_body::<StateEditBody>(request) {
        Ok(body) => body,
        Err(response) => return Ok(response),
    };
    let Some(initial_states) = body.initial_states.into_states() else {
        return Ok(field_error(422, "initialStates", "invalid_initial_states"));
    };

    let updated = app.store.update_model_state(UpdateStateRequest {
        model_id,
        initial_states,
        update: StateUpdate {
            label: body.label,
            description: body.description,
            event_id: body.event_id,
        },
        updated_at_ms: now_ms_i64(),
    });
    let row = match updated {
        Ok(row) => row,
        Err(StoreError::UnknownId) => return Ok(api_error(404, "not_found")),
        Err(StoreError::UnknownStateKey) => return Ok(api_error(404, "unknown_state")),
        Err(StoreError::InvalidInput(_)) => {
            return Ok(field_error(422, "initialStates", "empty_initial_states"));
        }
        Err(StoreError::Layout(err)) => {
            tracing::info!(model_id, error = %err, "state edit rejected");
            return Ok(field_error(422, "model", err.code()));
        }
        Err(err) => return Err(err.into()),
    };
    tracing::info!(model_id, user_id = user.id, "state edited");
    model_response(&row)
}

fn load_model(app: &App, id: &str) -> Result<Option<ModelRow>, AppError> {
    let Ok(model_id) = id.parse::<i64>() else {
        return Ok(None);
    };
    match app.store.get_model(model_id) {
        Ok(row) => Ok(Some(row)),
        Err(StoreError::UnknownId) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn model_response(row: &ModelRow) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::json(
        200,
        &json!({
            "id": row.id,
            "name": row.name,
            "model": row.model()?,
        }),
    ))
}
