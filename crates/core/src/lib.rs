#![forbid(unsafe_code)]

pub mod aggregate;
pub mod boundary;
pub mod common;
pub mod error;
pub mod history;
pub mod interaction;
pub mod layout;
pub mod model;

#[cfg(test)]
mod test_fixtures;

pub use aggregate::{DEFAULT_THRESHOLD, Link, LinkKind, Node, ScaleGraph, aggregate_model};
pub use boundary::{LayoutBoundary, find_boundary, layout_boundary};
pub use common::{CommonStateData, StateUpdate, apply_state_update};
pub use error::{HistoryError, InteractionError, LayoutError};
pub use history::{ScaleHistory, Segment, build_history};
pub use interaction::{SelectionEvent, ViewController};
pub use layout::{LayoutConfig, layout_model};
pub use model::{Model, StateNo};
