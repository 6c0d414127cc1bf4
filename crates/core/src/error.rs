#![forbid(unsafe_code)]

use crate::model::StateNo;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum LayoutError {
    #[error("threshold must be within [0, 1] (got {0})")]
    InvalidThreshold(f64),
    #[error("scale {scale_ix} does not exist (model has {count} scales)")]
    UnknownScale { scale_ix: usize, count: usize },
    #[error("scale {scale_ix} lists state {state_no} more than once")]
    DuplicateState { scale_ix: usize, state_no: StateNo },
    #[error(
        "state {state_no} in scale {scale_ix} has {actual} transition probabilities, expected {expected}"
    )]
    TransitionLength {
        scale_ix: usize,
        state_no: StateNo,
        expected: usize,
        actual: usize,
    },
    #[error("state {state_no} in coarser scale {scale_ix} has no child states")]
    MissingChildren { scale_ix: usize, state_no: StateNo },
    #[error(
        "state {state_no} in scale {scale_ix} references child {child} that has no position in scale {finer_ix}"
    )]
    UnresolvedChild {
        scale_ix: usize,
        state_no: StateNo,
        child: StateNo,
        finer_ix: usize,
    },
    #[error("no position computed for state {state_no} in scale {scale_ix}")]
    MissingPosition { scale_ix: usize, state_no: StateNo },
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum HistoryError {
    #[error("history has {times} times but {states} state assignments")]
    LengthMismatch { times: usize, states: usize },
    #[error("initial state {initial} is not covered by any state of scale {scale_ix}")]
    UnmappedState { scale_ix: usize, initial: StateNo },
    #[error("initial state {initial} is covered by both {first} and {second} in scale {scale_ix}")]
    AmbiguousState {
        scale_ix: usize,
        initial: StateNo,
        first: StateNo,
        second: StateNo,
    },
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum InteractionError {
    #[error("model has no scales")]
    EmptyModel,
    #[error("state {state_no} does not exist in scale {scale_ix}")]
    UnknownState { scale_ix: usize, state_no: StateNo },
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl LayoutError {
    /// Stable snake_case code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            LayoutError::InvalidThreshold(_) => "invalid_threshold",
            LayoutError::UnknownScale { .. } => "unknown_scale",
            LayoutError::DuplicateState { .. } => "duplicate_state",
            LayoutError::TransitionLength { .. } => "transition_length",
            LayoutError::MissingChildren { .. } => "missing_children",
            LayoutError::UnresolvedChild { .. } => "unresolved_child",
            LayoutError::MissingPosition { .. } => "missing_position",
        }
    }
}

impl HistoryError {
    pub fn code(&self) -> &'static str {
        match self {
            HistoryError::LengthMismatch { .. } => "history_length_mismatch",
            HistoryError::UnmappedState { .. } => "unmapped_state",
            HistoryError::AmbiguousState { .. } => "ambiguous_state",
            HistoryError::Layout(err) => err.code(),
        }
    }
}

impl InteractionError {
    pub fn code(&self) -> &'static str {
        match self {
            InteractionError::EmptyModel => "empty_model",
            InteractionError::UnknownState { .. } => "unknown_state",
            InteractionError::Layout(err) => err.code(),
        }
    }
}
