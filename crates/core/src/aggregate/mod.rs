#![forbid(unsafe_code)]

use crate::common::CommonStateData;
use crate::error::LayoutError;
use crate::layout::{LayoutConfig, PositionMemo, layout_model};
use crate::model::{Model, StateNo};
use serde::Serialize;
use std::collections::HashSet;

pub const DEFAULT_THRESHOLD: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum LinkKind {
    #[serde(rename = "SELF")]
    SelfLoop,
    #[serde(rename = "BIDIRECT")]
    Bidirect,
    #[serde(rename = "SINGLE")]
    Single,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub state_no: StateNo,
    pub scale_ix: usize,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub label: String,
    pub stationary_probability: f64,
    pub initial_states: Vec<StateNo>,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Link {
    pub source: StateNo,
    pub target: StateNo,
    pub probability: f64,
    pub kind: LinkKind,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleGraph {
    pub scale_ix: usize,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidateLink {
    pub source: StateNo,
    pub target: StateNo,
    pub probability: f64,
}

impl ScaleGraph {
    pub fn node(&self, state_no: StateNo) -> Option<&Node> {
        self.nodes.iter().find(|node| node.state_no == state_no)
    }

    pub fn links_from(&self, state_no: StateNo) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |link| link.source == state_no)
    }
}

pub fn validate_threshold(threshold: f64) -> Result<f64, LayoutError> {
    if threshold.is_nan() || !(0.0..=1.0).contains(&threshold) {
        return Err(LayoutError::InvalidThreshold(threshold));
    }
    Ok(threshold)
}

/// Every transition at or above `threshold`, in state order then target order.
pub fn candidate_links(
    model: &Model,
    scale_ix: usize,
    threshold: f64,
) -> Result<Vec<CandidateLink>, LayoutError> {
    let threshold = validate_threshold(threshold)?;
    let scale = model
        .scales
        .get(scale_ix)
        .ok_or(LayoutError::UnknownScale {
            scale_ix,
            count: model.scales.len(),
        })?;

    let expected = scale.states.len();
    let mut out = Vec::new();
    for state in &scale.states {
        let actual = state.transition_probabilities.len();
        if actual != expected {
            return Err(LayoutError::TransitionLength {
                scale_ix,
                state_no: state.state_no,
                expected,
                actual,
            });
        }
        for (target_ix, probability) in state.transition_probabilities.iter().enumerate() {
            if *probability < threshold {
                continue;
            }
            out.push(CandidateLink {
                source: state.state_no,
                target: scale.states[target_ix].state_no,
                probability: *probability,
            });
        }
    }
    Ok(out)
}

/// Classification needs the complete candidate set: a pair is only BIDIRECT once
/// its reverse has been seen.
pub fn classify_links(candidates: &[CandidateLink]) -> Vec<Link> {
    let pairs: HashSet<(StateNo, StateNo)> = candidates
        .iter()
        .map(|link| (link.source, link.target))
        .collect();

    candidates
        .iter()
        .map(|link| {
            let kind = if link.source == link.target {
                LinkKind::SelfLoop
            } else if pairs.contains(&(link.target, link.source)) {
                LinkKind::Bidirect
            } else {
                LinkKind::Single
            };
            Link {
                source: link.source,
                target: link.target,
                probability: link.probability,
                kind,
            }
        })
        .collect()
}

/// Expects a model whose coarser states carry their initial states (see
/// `Model::resolved`).
pub fn aggregate_scale(
    model: &Model,
    scale_ix: usize,
    memo: &PositionMemo,
    common: &CommonStateData,
    config: &LayoutConfig,
    threshold: f64,
) -> Result<ScaleGraph, LayoutError> {
    let candidates = candidate_links(model, scale_ix, threshold)?;
    let scale = &model.scales[scale_ix];

    let mut nodes = Vec::with_capacity(scale.states.len());
    for state in &scale.states {
        let point = memo
            .get(scale_ix, state.state_no)
            .ok_or(LayoutError::MissingPosition {
                scale_ix,
                state_no: state.state_no,
            })?;
        let key = state.common_key();
        nodes.push(Node {
            state_no: state.state_no,
            scale_ix,
            x: point.x,
            y: point.y,
            radius: config.max_node_radius * state.stationary_probability,
            label: state.label(),
            stationary_probability: state.stationary_probability,
            initial_states: state.covered_initial_states(),
            color: common.color_for(&key).to_string(),
        });
    }

    Ok(ScaleGraph {
        scale_ix,
        nodes,
        links: classify_links(&candidates),
    })
}

pub fn aggregate_model(
    model: &Model,
    config: &LayoutConfig,
    threshold: f64,
) -> Result<Vec<ScaleGraph>, LayoutError> {
    validate_threshold(threshold)?;
    let memo = layout_model(model, config)?;
    let model = model.resolved()?;
    let common = CommonStateData::from_model(&model);
    (0..model.scales.len())
        .map(|scale_ix| aggregate_scale(&model, scale_ix, &memo, &common, config, threshold))
        .collect()
}

#[cfg(test)]
mod tests;
