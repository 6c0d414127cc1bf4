#![forbid(unsafe_code)]

use crate::common::CommonStateData;
use crate::error::HistoryError;
use crate::model::{Model, Scale, StateNo};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub scale_ix: usize,
    pub state_no: StateNo,
    pub start: f64,
    pub end: f64,
    pub initial_states: Vec<StateNo>,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleHistory {
    pub scale_ix: usize,
    pub segments: Vec<Segment>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Run {
    pub state_no: StateNo,
    pub start: f64,
    pub end: f64,
}

/// Maps every finest-grain state to the state of `scale` that covers it.
pub fn scale_mapping(
    scale_ix: usize,
    scale: &Scale,
) -> Result<HashMap<StateNo, StateNo>, HistoryError> {
    let mut mapping = HashMap::new();
    for state in &scale.states {
        for initial in state.covered_initial_states() {
            if let Some(first) = mapping.insert(initial, state.state_no)
                && first != state.state_no
            {
                return Err(HistoryError::AmbiguousState {
                    scale_ix,
                    initial,
                    first,
                    second: state.state_no,
                });
            }
        }
    }
    Ok(mapping)
}

/// Splits a mapped timeline into runs of equal state. A run starts exactly where the
/// state changes and ends at the first time of the next run; the final run is closed
/// at the last time.
pub fn segment_runs(times: &[f64], mapped: &[StateNo]) -> Result<Vec<Run>, HistoryError> {
    if times.len() != mapped.len() {
        return Err(HistoryError::LengthMismatch {
            times: times.len(),
            states: mapped.len(),
        });
    }
    let mut runs = Vec::new();
    let Some(&first) = mapped.first() else {
        return Ok(runs);
    };

    let mut open_state = first;
    let mut open_ix = 0usize;
    for (step, state_no) in mapped.iter().enumerate().skip(1) {
        if *state_no == open_state {
            continue;
        }
        runs.push(Run {
            state_no: open_state,
            start: times[open_ix],
            end: times[step],
        });
        open_state = *state_no;
        open_ix = step;
    }
    runs.push(Run {
        state_no: open_state,
        start: times[open_ix],
        end: times[times.len() - 1],
    });
    Ok(runs)
}

pub fn build_history(model: &Model) -> Result<Vec<ScaleHistory>, HistoryError> {
    let times = &model.state_history_times;
    let assignments = &model.state_history_initial_states;
    if times.len() != assignments.len() {
        return Err(HistoryError::LengthMismatch {
            times: times.len(),
            states: assignments.len(),
        });
    }
    let model = model.resolved()?;
    let common = CommonStateData::from_model(&model);

    let mut out = Vec::with_capacity(model.scales.len());
    for (scale_ix, scale) in model.scales.iter().enumerate() {
        let mapping = scale_mapping(scale_ix, scale)?;
        let mut mapped = Vec::with_capacity(assignments.len());
        for initial in assignments {
            let state_no = mapping
                .get(initial)
                .copied()
                .ok_or(HistoryError::UnmappedState {
                    scale_ix,
                    initial: *initial,
                })?;
            mapped.push(state_no);
        }

        let segments = segment_runs(times, &mapped)?
            .into_iter()
            .map(|run| {
                let (initial_states, color) = match scale.state(run.state_no) {
                    Some(state) => (
                        state.covered_initial_states(),
                        common.color_for(&state.common_key()).to_string(),
                    ),
                    None => (vec![run.state_no], common.color_for("").to_string()),
                };
                Segment {
                    scale_ix,
                    state_no: run.state_no,
                    start: run.start,
                    end: run.end,
                    initial_states,
                    color,
                }
            })
            .collect();
        out.push(ScaleHistory { scale_ix, segments });
    }
    Ok(out)
}

/// Segments overlapping `[from, to]`, clipped to the window (brush selection).
pub fn segments_in_window(history: &[ScaleHistory], from: f64, to: f64) -> Vec<ScaleHistory> {
    let (from, to) = if from <= to { (from, to) } else { (to, from) };
    history
        .iter()
        .map(|scale| ScaleHistory {
            scale_ix: scale.scale_ix,
            segments: scale
                .segments
                .iter()
                .filter(|segment| segment.end >= from && segment.start <= to)
                .map(|segment| Segment {
                    start: segment.start.max(from),
                    end: segment.end.min(to),
                    ..segment.clone()
                })
                .collect(),
        })
        .collect()
}

/// Segments to highlight when `clicked` is selected: the same state on its own scale,
/// and on other scales every segment whose cluster contains all of the clicked
/// segment's initial states.
pub fn related_segments<'a>(history: &'a [ScaleHistory], clicked: &Segment) -> Vec<&'a Segment> {
    let wanted: HashSet<StateNo> = clicked.initial_states.iter().copied().collect();
    history
        .iter()
        .flat_map(|scale| scale.segments.iter())
        .filter(|segment| {
            if segment.scale_ix == clicked.scale_ix {
                return segment.state_no == clicked.state_no;
            }
            let covered: HashSet<StateNo> = segment.initial_states.iter().copied().collect();
            wanted.is_subset(&covered)
        })
        .collect()
}
