//! Easing functions, piecewise graphs, and baked-curve caching.

pub mod baked;
pub mod functions;
pub mod graph;
pub mod registry;

pub use baked::{BakedCurve, BakedCurveCache, DEFAULT_BAKE_RESOLUTION};
pub use functions::Easing;
pub use graph::{CurvePoint, FunctionGraph, GraphBank, GraphId, RangedFunction, MAX_SEGMENTS};
pub use registry::{EasingHandle, EasingRegistry, SampleMetrics};

use serde::{Deserialize, Serialize};

use crate::value::MAX_AXES;

/// How a process derives its eased factor each tick.
///
/// Per-axis graphs only act on axes the process mask flags animatable;
/// an animatable axis without a graph eases linearly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EasePlan {
    /// One easing callable shared by all axes
    Uniform(EasingHandle),
    /// One function graph shared by all axes
    Graph(GraphId),
    /// An independent function graph per axis
    PerAxis([Option<GraphId>; MAX_AXES]),
}

impl Default for EasePlan {
    fn default() -> Self {
        Self::Uniform(EasingHandle::default())
    }
}
