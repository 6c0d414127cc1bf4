#![forbid(unsafe_code)]

use crate::error::LayoutError;
use crate::model::{Model, Scale, StateNo};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_LAYOUT_RADIUS: f64 = 100.0;
pub const DEFAULT_MAX_NODE_RADIUS: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Radius of the circle the finest-scale states are placed on.
    pub radius: f64,
    pub max_node_radius: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_LAYOUT_RADIUS,
            max_node_radius: DEFAULT_MAX_NODE_RADIUS,
        }
    }
}

/// Positions keyed by `(scale_ix, state_no)`, filled finest scale first.
#[derive(Clone, Debug, Default)]
pub struct PositionMemo {
    positions: HashMap<(usize, StateNo), Point>,
}

impl PositionMemo {
    pub fn get(&self, scale_ix: usize, state_no: StateNo) -> Option<Point> {
        self.positions.get(&(scale_ix, state_no)).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn insert(&mut self, scale_ix: usize, state_no: StateNo, point: Point) {
        self.positions.insert((scale_ix, state_no), point);
    }
}

pub fn circle_position(index: usize, count: usize, radius: f64) -> Point {
    if count == 0 {
        return Point {
            x: radius,
            y: radius,
        };
    }
    let degrees = 360.0 / count as f64 * index as f64;
    let theta = degrees.to_radians();
    Point {
        x: radius * theta.sin() + radius,
        y: radius * theta.cos() + radius,
    }
}

pub fn is_finest(scale_ix: usize, scale: &Scale) -> bool {
    scale_ix == 0 || scale.are_these_initial_states
}

pub fn layout_model(model: &Model, config: &LayoutConfig) -> Result<PositionMemo, LayoutError> {
    let mut memo = PositionMemo::default();
    for (scale_ix, scale) in model.scales.iter().enumerate() {
        layout_scale(&mut memo, scale_ix, scale, config)?;
    }
    Ok(memo)
}

fn layout_scale(
    memo: &mut PositionMemo,
    scale_ix: usize,
    scale: &Scale,
    config: &LayoutConfig,
) -> Result<(), LayoutError> {
    let mut seen = HashSet::with_capacity(scale.states.len());
    for state in &scale.states {
        if !seen.insert(state.state_no) {
            return Err(LayoutError::DuplicateState {
                scale_ix,
                state_no: state.state_no,
            });
        }
    }

    if is_finest(scale_ix, scale) {
        let count = scale.states.len();
        for (index, state) in scale.states.iter().enumerate() {
            memo.insert(
                scale_ix,
                state.state_no,
                circle_position(index, count, config.radius),
            );
        }
        return Ok(());
    }

    let finer_ix = scale_ix - 1;
    let mut resolved = Vec::with_capacity(scale.states.len());
    for state in &scale.states {
        let children = match state.child_states.as_deref() {
            Some(children) if !children.is_empty() => children,
            _ => {
                return Err(LayoutError::MissingChildren {
                    scale_ix,
                    state_no: state.state_no,
                });
            }
        };
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        for child in children {
            let point = memo
                .get(finer_ix, *child)
                .ok_or(LayoutError::UnresolvedChild {
                    scale_ix,
                    state_no: state.state_no,
                    child: *child,
                    finer_ix,
                })?;
            sum_x += point.x;
            sum_y += point.y;
        }
        let count = children.len() as f64;
        resolved.push((
            state.state_no,
            Point {
                x: sum_x / count,
                y: sum_y / count,
            },
        ));
    }
    // Inserted after the scan so a scale never reads its own entries.
    for (state_no, point) in resolved {
        memo.insert(scale_ix, state_no, point);
    }
    Ok(())
}
