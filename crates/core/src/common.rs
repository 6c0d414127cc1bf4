#![forbid(unsafe_code)]

use crate::error::LayoutError;
use crate::model::{Model, StateUi, SuggestedLabel};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;

pub const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const FALLBACK_COLOR: &str = "#a0a0a0";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonState {
    pub suggested_label: Option<SuggestedLabel>,
    pub ui: Option<StateUi>,
    pub color: String,
}

/// Per-cluster data shared by every scale the cluster appears on, keyed by the
/// comma-joined initial states.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CommonStateData {
    entries: BTreeMap<String, CommonState>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub label: Option<String>,
    pub description: Option<String>,
    pub event_id: Option<String>,
}

impl CommonStateData {
    pub fn from_model(model: &Model) -> Self {
        // Children that do not resolve are a layout error; such models keep their own lists.
        let model = model.resolved().unwrap_or(Cow::Borrowed(model));
        let mut entries: BTreeMap<String, CommonState> = BTreeMap::new();
        let mut next_color = 0usize;
        for scale in &model.scales {
            for state in &scale.states {
                let key = state.common_key();
                if let Some(entry) = entries.get_mut(&key) {
                    // A finer scale already registered this cluster; coarser edits win.
                    if state.ui.is_some() {
                        entry.ui = state.ui.clone();
                    }
                    if entry.suggested_label.is_none() {
                        entry.suggested_label = state.suggested_label.clone();
                    }
                    continue;
                }
                let color = PALETTE[next_color % PALETTE.len()].to_string();
                next_color += 1;
                entries.insert(
                    key,
                    CommonState {
                        suggested_label: state.suggested_label.clone(),
                        ui: state.ui.clone(),
                        color,
                    },
                );
            }
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&CommonState> {
        self.entries.get(key)
    }

    pub fn color_for(&self, key: &str) -> &str {
        self.entries
            .get(key)
            .map(|entry| entry.color.as_str())
            .unwrap_or(FALLBACK_COLOR)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Label a form would show for the cluster: the edited label when one exists,
    /// otherwise the suggested one.
    pub fn display_label(&self, key: &str) -> Option<String> {
        let entry = self.entries.get(key)?;
        entry
            .ui
            .as_ref()
            .and_then(|ui| ui.label.clone())
            .or_else(|| entry.suggested_label.as_ref().map(|s| s.label.clone()))
    }
}

/// Writes the edit onto every state whose initial states match `key`; returns the
/// number of states touched. Missing initial states are derived first, so the edited
/// model always carries them.
pub fn apply_state_update(
    model: &mut Model,
    key: &str,
    update: &StateUpdate,
) -> Result<usize, LayoutError> {
    model.resolve_initial_states()?;
    let mut touched = 0usize;
    for scale in &mut model.scales {
        for state in &mut scale.states {
            if state.common_key() != key {
                continue;
            }
            state.ui = Some(StateUi {
                label: non_empty(update.label.as_deref()),
                description: non_empty(update.description.as_deref()),
                event_id: non_empty(update.event_id.as_deref()),
            });
            touched += 1;
        }
    }
    Ok(touched)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{children_only_model, three_scale_model};

    #[test]
    fn clusters_are_keyed_by_initial_states_and_colored_finest_first() {
        let model = three_scale_model();
        let common = CommonStateData::from_model(&model);
        // 4 finest + 2 mid + 1 root, all distinct keys.
        assert_eq!(common.len(), 7);
        assert_eq!(common.color_for("0"), PALETTE[0]);
        assert_eq!(common.color_for("3"), PALETTE[3]);
        assert_eq!(common.color_for("0,1"), PALETTE[4]);
        assert_eq!(common.color_for("0,1,2,3"), PALETTE[6]);
        assert_eq!(common.color_for("missing"), FALLBACK_COLOR);
        assert_eq!(common.display_label("0").as_deref(), Some("idle"));
    }

    #[test]
    fn same_cluster_on_two_scales_shares_one_entry() {
        let mut model = three_scale_model();
        // Root cluster collapses to the same initial states as mid-level state 10.
        model.scales[2].states[0].initial_states = Some(vec![0, 1]);
        let common = CommonStateData::from_model(&model);
        assert_eq!(common.len(), 6);
    }

    #[test]
    fn state_update_touches_every_scale_with_the_key() {
        let mut model = three_scale_model();
        model.scales[2].states[0].initial_states = Some(vec![0, 1]);
        let touched = apply_state_update(
            &mut model,
            "0,1",
            &StateUpdate {
                label: Some(" Morning ".to_string()),
                description: Some(String::new()),
                event_id: None,
            },
        )
        .expect("update");
        assert_eq!(touched, 2);
        assert_eq!(model.scales[1].states[0].label(), "Morning");
        assert_eq!(model.scales[2].states[0].label(), "Morning");
        let ui = model.scales[1].states[0].ui.clone().expect("ui");
        assert_eq!(ui.description, None);

        let common = CommonStateData::from_model(&model);
        assert_eq!(common.display_label("0,1").as_deref(), Some("Morning"));
        assert_eq!(
            apply_state_update(&mut model, "42", &StateUpdate::default()),
            Ok(0)
        );
    }

    #[test]
    fn children_only_clusters_do_not_collide_with_finest_numbers() {
        let mut model = children_only_model();
        let common = CommonStateData::from_model(&model);
        assert_eq!(common.len(), 6);
        assert_ne!(common.color_for("0"), common.color_for("0,1"));

        let touched = apply_state_update(
            &mut model,
            "0",
            &StateUpdate {
                label: Some("finest zero".to_string()),
                ..StateUpdate::default()
            },
        )
        .expect("update");
        assert_eq!(touched, 1);
        assert_eq!(model.scales[0].states[0].label(), "finest zero");
        assert_eq!(model.scales[1].states[0].label(), "0");
        assert_eq!(model.scales[1].states[0].initial_states, Some(vec![0, 1]));
    }
}
