#![forbid(unsafe_code)]

use crate::model::{Model, Scale, State, StateNo, SuggestedLabel};

pub(crate) fn state(state_no: StateNo, stationary: f64, transitions: &[f64]) -> State {
    State {
        state_no,
        stationary_probability: stationary,
        transition_probabilities: transitions.to_vec(),
        ..State::default()
    }
}

pub(crate) fn coarse_state(
    state_no: StateNo,
    stationary: f64,
    transitions: &[f64],
    children: &[StateNo],
    initial: &[StateNo],
) -> State {
    State {
        child_states: Some(children.to_vec()),
        initial_states: Some(initial.to_vec()),
        ..state(state_no, stationary, transitions)
    }
}

/// Four finest states, two mid-level clusters, one root cluster.
pub(crate) fn three_scale_model() -> Model {
    let mut finest = vec![
        state(0, 0.3, &[0.5, 0.3, 0.2, 0.0]),
        state(1, 0.2, &[0.4, 0.0, 0.0, 0.6]),
        state(2, 0.25, &[0.05, 0.05, 0.9, 0.0]),
        state(3, 0.25, &[0.0, 0.2, 0.0, 0.8]),
    ];
    finest[0].suggested_label = Some(SuggestedLabel {
        label: "idle".to_string(),
    });
    Model {
        scales: vec![
            Scale {
                are_these_initial_states: true,
                states: finest,
            },
            Scale {
                are_these_initial_states: false,
                states: vec![
                    coarse_state(10, 0.5, &[0.7, 0.3], &[0, 1], &[0, 1]),
                    coarse_state(11, 0.5, &[0.2, 0.8], &[2, 3], &[2, 3]),
                ],
            },
            Scale {
                are_these_initial_states: false,
                states: vec![coarse_state(20, 1.0, &[1.0], &[10, 11], &[0, 1, 2, 3])],
            },
        ],
        state_history_times: vec![0.0, 1.0, 2.0, 3.0],
        state_history_initial_states: vec![0, 1, 2, 0],
    }
}

/// Two scales where the coarse states list only their children, and reuse the
/// numbers of finest states.
pub(crate) fn children_only_model() -> Model {
    let child_only = |state_no: StateNo, transitions: &[f64], children: &[StateNo]| State {
        child_states: Some(children.to_vec()),
        ..state(state_no, 0.5, transitions)
    };
    Model {
        scales: vec![
            Scale {
                are_these_initial_states: true,
                states: vec![
                    state(0, 0.25, &[0.6, 0.4, 0.0, 0.0]),
                    state(1, 0.25, &[0.0, 0.5, 0.5, 0.0]),
                    state(2, 0.25, &[0.0, 0.0, 0.5, 0.5]),
                    state(3, 0.25, &[0.5, 0.0, 0.0, 0.5]),
                ],
            },
            Scale {
                are_these_initial_states: false,
                states: vec![
                    child_only(0, &[0.8, 0.2], &[0, 1]),
                    child_only(1, &[0.3, 0.7], &[2, 3]),
                ],
            },
        ],
        state_history_times: vec![0.0, 1.0, 2.0, 3.0],
        state_history_initial_states: vec![0, 1, 2, 3],
    }
}
