#![forbid(unsafe_code)]

use crate::aggregate::ScaleGraph;
use crate::layout::{LayoutConfig, PositionMemo};
use crate::model::Model;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    /// Sentinel for "nothing seen yet": any real value widens it.
    pub const EMPTY: Extent = Extent {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn include(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct LayoutBoundary {
    pub x: Extent,
    pub y: Extent,
    pub r: Extent,
}

/// Extents over every scale so switching scales keeps the same coordinate frame.
pub fn find_boundary(graphs: &[ScaleGraph]) -> LayoutBoundary {
    let mut boundary = LayoutBoundary::default();
    for node in graphs.iter().flat_map(|graph| graph.nodes.iter()) {
        boundary.x.include(node.x);
        boundary.y.include(node.y);
        boundary.r.include(node.radius);
    }
    boundary
}

/// Same extents as `find_boundary` over the aggregated graphs, read straight from the
/// position memo and stationary probabilities. Links play no part, so no transition
/// vector is inspected.
pub fn layout_boundary(
    model: &Model,
    memo: &PositionMemo,
    config: &LayoutConfig,
) -> LayoutBoundary {
    let mut boundary = LayoutBoundary::default();
    for (scale_ix, scale) in model.scales.iter().enumerate() {
        for state in &scale.states {
            if let Some(point) = memo.get(scale_ix, state.state_no) {
                boundary.x.include(point.x);
                boundary.y.include(point.y);
            }
            boundary
                .r
                .include(config.max_node_radius * state.stationary_probability);
        }
    }
    boundary
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
    clamp: bool,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            domain,
            range,
            clamp: false,
        }
    }

    pub fn from_extent(extent: Extent, range: (f64, f64)) -> Self {
        if extent.is_empty() {
            return Self::new((0.0, 1.0), range);
        }
        Self::new((extent.min, extent.max), range)
    }

    pub fn clamped(mut self) -> Self {
        self.clamp = true;
        self
    }

    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        let mut t = if span == 0.0 { 0.5 } else { (value - d0) / span };
        if self.clamp {
            t = t.clamp(0.0, 1.0);
        }
        r0 + t * (r1 - r0)
    }

    pub fn invert(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = r1 - r0;
        let mut t = if span == 0.0 { 0.5 } else { (value - r0) / span };
        if self.clamp {
            t = t.clamp(0.0, 1.0);
        }
        d0 + t * (d1 - d0)
    }
}

/// Pixel mapping for a chart area of `width` x `height`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartScales {
    pub x: LinearScale,
    pub y: LinearScale,
    pub r: LinearScale,
}

impl ChartScales {
    pub fn for_boundary(boundary: &LayoutBoundary, width: f64, height: f64) -> Self {
        let y_domain = if boundary.y.is_empty() {
            Extent { min: 0.0, max: 1.0 }
        } else {
            boundary.y
        };
        Self {
            x: LinearScale::from_extent(boundary.x, (0.0, width)),
            y: LinearScale::new((y_domain.max, y_domain.min), (height, 0.0)),
            r: LinearScale::from_extent(boundary.r, (height / 20.0, height / 5.0)),
        }
    }
}
