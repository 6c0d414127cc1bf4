#![forbid(unsafe_code)]

use crate::error::LayoutError;
use crate::layout::is_finest;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub type StateNo = u32;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(default)]
    pub scales: Vec<Scale>,
    /// Unix seconds, one entry per history step.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state_history_times: Vec<f64>,
    /// Finest-grain state assigned at each history step.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state_history_initial_states: Vec<StateNo>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scale {
    #[serde(default)]
    pub are_these_initial_states: bool,
    #[serde(default)]
    pub states: Vec<State>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub state_no: StateNo,
    #[serde(default)]
    pub stationary_probability: f64,
    #[serde(default)]
    pub transition_probabilities: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_states: Option<Vec<StateNo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_states: Option<Vec<StateNo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_label: Option<SuggestedLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui: Option<StateUi>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedLabel {
    pub label: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUi {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl Model {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn coarsest_scale_ix(&self) -> Option<usize> {
        self.scales.len().checked_sub(1)
    }

    pub fn has_history(&self) -> bool {
        !self.state_history_times.is_empty()
    }

    /// True when some coarser state lists only its children.
    pub fn needs_initial_states(&self) -> bool {
        self.scales.iter().enumerate().any(|(scale_ix, scale)| {
            !is_finest(scale_ix, scale)
                && scale
                    .states
                    .iter()
                    .any(|state| state.initial_states.as_ref().is_none_or(Vec::is_empty))
        })
    }

    /// Fills `initial_states` of coarser states from their `child_states`, finest scale
    /// first, so each scale reads only the already-resolved scale below it. Derived
    /// lists are sorted; explicit lists are kept as given.
    pub fn resolve_initial_states(&mut self) -> Result<(), LayoutError> {
        for scale_ix in 1..self.scales.len() {
            let (finer, rest) = self.scales.split_at_mut(scale_ix);
            let finer = &finer[scale_ix - 1];
            let scale = &mut rest[0];
            if is_finest(scale_ix, scale) {
                continue;
            }
            for state in &mut scale.states {
                if state.initial_states.as_ref().is_some_and(|states| !states.is_empty()) {
                    continue;
                }
                let children = match state.child_states.as_deref() {
                    Some(children) if !children.is_empty() => children,
                    _ => {
                        return Err(LayoutError::MissingChildren {
                            scale_ix,
                            state_no: state.state_no,
                        });
                    }
                };
                let mut covered = Vec::new();
                for child in children {
                    let child_state =
                        finer
                            .state(*child)
                            .ok_or(LayoutError::UnresolvedChild {
                                scale_ix,
                                state_no: state.state_no,
                                child: *child,
                                finer_ix: scale_ix - 1,
                            })?;
                    covered.extend(child_state.covered_initial_states());
                }
                covered.sort_unstable();
                covered.dedup();
                state.initial_states = Some(covered);
            }
        }
        Ok(())
    }

    /// The model with every coarser state's initial states filled in; borrowed when
    /// nothing is missing.
    pub fn resolved(&self) -> Result<Cow<'_, Model>, LayoutError> {
        if !self.needs_initial_states() {
            return Ok(Cow::Borrowed(self));
        }
        let mut model = self.clone();
        model.resolve_initial_states()?;
        Ok(Cow::Owned(model))
    }
}

impl Scale {
    pub fn state(&self, state_no: StateNo) -> Option<&State> {
        self.states.iter().find(|state| state.state_no == state_no)
    }

    pub fn position_of(&self, state_no: StateNo) -> Option<usize> {
        self.states.iter().position(|state| state.state_no == state_no)
    }
}

impl State {
    pub fn label(&self) -> String {
        if let Some(label) = self.ui.as_ref().and_then(|ui| ui.label.as_deref()) {
            return label.to_string();
        }
        if let Some(suggested) = self.suggested_label.as_ref() {
            return suggested.label.clone();
        }
        self.state_no.to_string()
    }

    /// Finest-grain states covered by this state. A state without an explicit list
    /// covers only itself, which is what finest-scale states look like; coarser states
    /// get their list from `Model::resolve_initial_states`.
    pub fn covered_initial_states(&self) -> Vec<StateNo> {
        match self.initial_states.as_ref() {
            Some(states) if !states.is_empty() => states.clone(),
            _ => vec![self.state_no],
        }
    }

    pub fn common_key(&self) -> String {
        initial_states_key(&self.covered_initial_states())
    }
}

pub fn initial_states_key(states: &[StateNo]) -> String {
    states
        .iter()
        .map(|state| state.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn parse_initial_states_key(raw: &str) -> Option<Vec<StateNo>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let mut out = Vec::new();
    for part in raw.split(',') {
        out.push(part.trim().parse::<StateNo>().ok()?);
    }
    Some(out)
}
