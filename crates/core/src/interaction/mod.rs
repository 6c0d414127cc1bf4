#![forbid(unsafe_code)]

use crate::aggregate::{DEFAULT_THRESHOLD, ScaleGraph, aggregate_scale, validate_threshold};
use crate::boundary::{LayoutBoundary, layout_boundary};
use crate::common::CommonStateData;
use crate::error::{InteractionError, LayoutError};
use crate::layout::{LayoutConfig, PositionMemo, layout_model};
use crate::model::{Model, StateNo};
use std::sync::mpsc::{Receiver, Sender, channel};

#[derive(Clone, Debug, PartialEq)]
pub enum SelectionEvent {
    Selected {
        scale_ix: usize,
        state_no: StateNo,
        initial_states: Vec<StateNo>,
    },
    Cleared {
        scale_ix: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub scale_ix: usize,
    pub state_no: StateNo,
}

/// Owns the view parameters of one graph view. Sibling views (history timeline, state
/// forms) learn about selections only through `subscribe`.
pub struct ViewController {
    model: Model,
    config: LayoutConfig,
    memo: PositionMemo,
    common: CommonStateData,
    boundary: LayoutBoundary,
    threshold: f64,
    scale_ix: usize,
    graph: ScaleGraph,
    selection: Option<Selection>,
    subscribers: Vec<Sender<SelectionEvent>>,
}

impl ViewController {
    /// Only the starting scale's transitions are checked here; other scales are
    /// checked when they are shown.
    pub fn new(mut model: Model, config: LayoutConfig) -> Result<Self, InteractionError> {
        let scale_ix = model
            .coarsest_scale_ix()
            .ok_or(InteractionError::EmptyModel)?;
        let memo = layout_model(&model, &config)?;
        model.resolve_initial_states()?;
        let common = CommonStateData::from_model(&model);
        let boundary = layout_boundary(&model, &memo, &config);
        let graph = aggregate_scale(&model, scale_ix, &memo, &common, &config, DEFAULT_THRESHOLD)?;
        Ok(Self {
            model,
            config,
            memo,
            common,
            boundary,
            threshold: DEFAULT_THRESHOLD,
            scale_ix,
            graph,
            selection: None,
            subscribers: Vec::new(),
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn scale_ix(&self) -> usize {
        self.scale_ix
    }

    pub fn graph(&self) -> &ScaleGraph {
        &self.graph
    }

    pub fn boundary(&self) -> &LayoutBoundary {
        &self.boundary
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn subscribe(&mut self) -> Receiver<SelectionEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn set_threshold(&mut self, threshold: f64) -> Result<(), InteractionError> {
        let threshold = validate_threshold(threshold)?;
        self.graph = self.build_graph(self.scale_ix, threshold)?;
        self.threshold = threshold;
        Ok(())
    }

    pub fn set_scale(&mut self, scale_ix: usize) -> Result<(), InteractionError> {
        self.switch_scale(scale_ix)?;
        if self.selection.take().is_some() {
            self.publish(SelectionEvent::Cleared { scale_ix });
        }
        Ok(())
    }

    /// Moves `delta` scales towards the coarsest (positive) or the finest (negative),
    /// stopping at either end. Returns the resulting scale index.
    pub fn step_scale(&mut self, delta: i32) -> Result<usize, InteractionError> {
        let coarsest = self.model.scales.len() - 1;
        let target = (self.scale_ix as i64 + i64::from(delta)).clamp(0, coarsest as i64) as usize;
        if target != self.scale_ix {
            self.set_scale(target)?;
        }
        Ok(self.scale_ix)
    }

    pub fn select_state(&mut self, state_no: StateNo) -> Result<(), InteractionError> {
        let node = self
            .graph
            .node(state_no)
            .ok_or(InteractionError::UnknownState {
                scale_ix: self.scale_ix,
                state_no,
            })?;
        let event = SelectionEvent::Selected {
            scale_ix: self.scale_ix,
            state_no,
            initial_states: node.initial_states.clone(),
        };
        self.selection = Some(Selection {
            scale_ix: self.scale_ix,
            state_no,
        });
        self.publish(event);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.publish(SelectionEvent::Cleared {
                scale_ix: self.scale_ix,
            });
        }
    }

    /// Selection made in a sibling view. Not re-published, so two views subscribed to
    /// each other do not echo.
    pub fn apply_external_selection(
        &mut self,
        scale_ix: usize,
        state_no: StateNo,
    ) -> Result<(), InteractionError> {
        let scale = self
            .model
            .scales
            .get(scale_ix)
            .ok_or(LayoutError::UnknownScale {
                scale_ix,
                count: self.model.scales.len(),
            })?;
        if scale.state(state_no).is_none() {
            return Err(InteractionError::UnknownState { scale_ix, state_no });
        }
        if scale_ix != self.scale_ix {
            self.switch_scale(scale_ix)?;
        }
        self.selection = Some(Selection { scale_ix, state_no });
        Ok(())
    }

    fn switch_scale(&mut self, scale_ix: usize) -> Result<(), InteractionError> {
        self.graph = self.build_graph(scale_ix, self.threshold)?;
        self.scale_ix = scale_ix;
        Ok(())
    }

    fn build_graph(&self, scale_ix: usize, threshold: f64) -> Result<ScaleGraph, LayoutError> {
        aggregate_scale(
            &self.model,
            scale_ix,
            &self.memo,
            &self.common,
            &self.config,
            threshold,
        )
    }

    fn publish(&mut self, event: SelectionEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
