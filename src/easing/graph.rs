//! Piecewise easing graphs.
//!
//! A [`FunctionGraph`] chains easing segments over the normalized time
//! range. Segments always cover `[0, 1]` contiguously: every mutation
//! goes through [`FunctionGraph::add_function`],
//! [`FunctionGraph::remove_function`] or [`FunctionGraph::move_node`],
//! each of which preserves the coverage invariant or rejects the change.

use serde::{Deserialize, Serialize};

use crate::easing::registry::{EasingHandle, EasingRegistry};
use crate::error::TweenError;

/// Hard cap on segments per graph
pub const MAX_SEGMENTS: usize = 16;

/// A node anchor on the normalized timeline
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Normalized time in `[0, 1]`
    pub time: f32,
    /// Curve value in `[-1, 1]`
    pub value: f32,
}

impl CurvePoint {
    pub fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }

    /// Clamp into the legal node domain
    #[inline]
    pub fn clamped(self) -> Self {
        Self {
            time: if self.time.is_finite() {
                self.time.clamp(0.0, 1.0)
            } else {
                0.0
            },
            value: if self.value.is_finite() {
                self.value.clamp(-1.0, 1.0)
            } else {
                0.0
            },
        }
    }
}

/// One easing function scaled onto a sub-range of the timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangedFunction {
    pub easing: EasingHandle,
    pub start: CurvePoint,
    pub end: CurvePoint,
}

impl RangedFunction {
    pub fn new(easing: EasingHandle, start: CurvePoint, end: CurvePoint) -> Self {
        Self { easing, start, end }
    }

    /// Width of the covered time range
    #[inline]
    pub fn span(&self) -> f32 {
        self.end.time - self.start.time
    }

    /// Whether `time` falls inside this range (inclusive)
    #[inline]
    pub fn contains(&self, time: f32) -> bool {
        time >= self.start.time && time <= self.end.time
    }

    /// Normalize `time` into the segment, ease it, and scale the result
    /// between the endpoint values
    pub fn evaluate(&self, registry: &mut EasingRegistry, time: f32) -> f32 {
        let span = self.span();
        let local = if span > 0.0 {
            ((time - self.start.time) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let eased = registry.sample(self.easing, local);
        self.start.value + eased * (self.end.value - self.start.value)
    }
}

/// Contiguous piecewise easing curve over `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionGraph {
    segments: Vec<RangedFunction>,
    #[serde(skip)]
    generation: u32,
}

impl Default for FunctionGraph {
    fn default() -> Self {
        Self::linear()
    }
}

impl FunctionGraph {
    /// The identity curve: one linear segment from (0, 0) to (1, 1)
    pub fn linear() -> Self {
        Self::with_easing(EasingHandle::default())
    }

    /// A single full-range segment from (0, 0) to (1, 1) using `easing`
    pub fn with_easing(easing: EasingHandle) -> Self {
        Self {
            segments: vec![RangedFunction::new(
                easing,
                CurvePoint::new(0.0, 0.0),
                CurvePoint::new(1.0, 1.0),
            )],
            generation: 0,
        }
    }

    /// Build a graph from explicit segments, validating coverage
    pub fn from_segments(segments: Vec<RangedFunction>) -> Result<Self, TweenError> {
        let graph = Self {
            segments,
            generation: 0,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Check the coverage invariant: segments fill `[0, 1]` contiguously,
    /// each with a positive span and shared boundary nodes
    pub fn validate(&self) -> Result<(), TweenError> {
        if self.segments.is_empty() {
            return Err(TweenError::InvalidRange {
                reason: "graph has no segments".to_string(),
            });
        }
        if self.segments.len() > MAX_SEGMENTS {
            return Err(TweenError::InvalidRange {
                reason: format!("graph exceeds {MAX_SEGMENTS} segments"),
            });
        }
        let first = &self.segments[0];
        let last = &self.segments[self.segments.len() - 1];
        if first.start.time != 0.0 {
            return Err(TweenError::InvalidRange {
                reason: format!("coverage starts at {} instead of 0", first.start.time),
            });
        }
        if last.end.time != 1.0 {
            return Err(TweenError::InvalidRange {
                reason: format!("coverage ends at {} instead of 1", last.end.time),
            });
        }
        for segment in &self.segments {
            if !(segment.span() > 0.0) {
                return Err(TweenError::InvalidRange {
                    reason: format!(
                        "segment [{}, {}] has non-positive span",
                        segment.start.time, segment.end.time
                    ),
                });
            }
            for point in [segment.start, segment.end] {
                if !(0.0..=1.0).contains(&point.time) || !(-1.0..=1.0).contains(&point.value) {
                    return Err(TweenError::InvalidRange {
                        reason: format!(
                            "node ({}, {}) outside the legal domain",
                            point.time, point.value
                        ),
                    });
                }
            }
        }
        for pair in self.segments.windows(2) {
            if pair[0].end.time != pair[1].start.time || pair[0].end.value != pair[1].start.value {
                return Err(TweenError::InvalidRange {
                    reason: format!(
                        "segments detach at t={}: ({}, {}) vs ({}, {})",
                        pair[0].end.time,
                        pair[0].end.time,
                        pair[0].end.value,
                        pair[1].start.time,
                        pair[1].start.value
                    ),
                });
            }
        }
        Ok(())
    }

    /// Number of segments
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of timeline nodes (always segments + 1)
    #[inline]
    pub fn node_count(&self) -> usize {
        self.segments.len() + 1
    }

    /// The underlying segments in timeline order
    #[inline]
    pub fn segments(&self) -> &[RangedFunction] {
        &self.segments
    }

    /// Derived timeline nodes in strictly increasing time order
    pub fn nodes(&self) -> Vec<CurvePoint> {
        let mut nodes: Vec<CurvePoint> = self.segments.iter().map(|s| s.start).collect();
        if let Some(last) = self.segments.last() {
            nodes.push(last.end);
        }
        nodes
    }

    /// Mutation counter, bumped by every structural change
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Evaluate the graph at a normalized `time`.
    ///
    /// Times outside `[0, 1]` degrade to the nearest covering segment, so
    /// an overshooting clock keeps reading the final segment's value.
    pub fn evaluate(&self, registry: &mut EasingRegistry, time: f32) -> f32 {
        let t = if time.is_finite() {
            time.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let segment = self
            .segments
            .iter()
            .find(|s| s.contains(t))
            .or_else(|| self.segments.last());
        match segment {
            Some(s) => s.evaluate(registry, t),
            None => t,
        }
    }

    /// Split the covering segment at `position` and ease the right half
    /// with `easing`. The position is clamped into the node domain; a
    /// position that lands on an existing node is rejected.
    ///
    /// Returns the index of the inserted node.
    pub fn add_function(
        &mut self,
        easing: EasingHandle,
        position: CurvePoint,
    ) -> Result<usize, TweenError> {
        if self.segments.len() >= MAX_SEGMENTS {
            return Err(TweenError::InvalidRange {
                reason: format!("graph already holds {MAX_SEGMENTS} segments"),
            });
        }
        let position = position.clamped();
        let index = self
            .segments
            .iter()
            .position(|s| position.time > s.start.time && position.time < s.end.time);
        let Some(index) = index else {
            return Err(TweenError::InvalidRange {
                reason: format!("no open range at t={}", position.time),
            });
        };
        let split = self.segments[index];
        self.segments[index].end = position;
        self.segments
            .insert(index + 1, RangedFunction::new(easing, position, split.end));
        self.generation = self.generation.wrapping_add(1);
        debug_assert!(self.validate().is_ok());
        Ok(index + 1)
    }

    /// Remove the segment at `index`, re-fusing its span into a neighbour.
    /// The last remaining segment cannot be removed.
    pub fn remove_function(&mut self, index: usize) -> Result<(), TweenError> {
        if self.segments.len() <= 1 {
            return Err(TweenError::InvalidRange {
                reason: "graph needs at least one segment".to_string(),
            });
        }
        if index >= self.segments.len() {
            return Err(TweenError::InvalidRange {
                reason: format!("segment index {index} out of range"),
            });
        }
        let removed = self.segments.remove(index);
        if index > 0 {
            self.segments[index - 1].end = removed.end;
        } else {
            self.segments[0].start = removed.start;
        }
        self.generation = self.generation.wrapping_add(1);
        debug_assert!(self.validate().is_ok());
        Ok(())
    }

    /// Move a timeline node, re-deriving the adjacent ranges.
    ///
    /// Endpoint nodes keep their pinned times (0 and 1); only their values
    /// move. Interior nodes must stay strictly between their neighbours.
    pub fn move_node(&mut self, node_index: usize, position: CurvePoint) -> Result<(), TweenError> {
        let nodes = self.node_count();
        if node_index >= nodes {
            return Err(TweenError::InvalidRange {
                reason: format!("node index {node_index} out of range"),
            });
        }
        let position = position.clamped();
        if node_index == 0 {
            self.segments[0].start = CurvePoint::new(0.0, position.value);
        } else if node_index == nodes - 1 {
            let last = self.segments.len() - 1;
            self.segments[last].end = CurvePoint::new(1.0, position.value);
        } else {
            let left = node_index - 1;
            let lower = self.segments[left].start.time;
            let upper = self.segments[node_index].end.time;
            if position.time <= lower || position.time >= upper {
                return Err(TweenError::InvalidRange {
                    reason: format!(
                        "node time {} must stay inside ({lower}, {upper})",
                        position.time
                    ),
                });
            }
            self.segments[left].end = position;
            self.segments[node_index].start = position;
        }
        self.generation = self.generation.wrapping_add(1);
        debug_assert!(self.validate().is_ok());
        Ok(())
    }
}

/// Handle into a [`GraphBank`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub(crate) u32);

impl GraphId {
    /// Raw slot index, stable for the lifetime of the stored graph
    #[inline]
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for GraphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "graph#{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
struct BankSlot {
    graph: Option<FunctionGraph>,
    epoch: u32,
}

/// Slot storage for function graphs shared across processes
#[derive(Debug, Clone, Default)]
pub struct GraphBank {
    slots: Vec<BankSlot>,
    free: Vec<u32>,
}

impl GraphBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a graph, reusing a freed slot when available
    pub fn add(&mut self, graph: FunctionGraph) -> GraphId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.graph = Some(graph);
            slot.epoch = slot.epoch.wrapping_add(1);
            GraphId(index)
        } else {
            self.slots.push(BankSlot {
                graph: Some(graph),
                epoch: 0,
            });
            GraphId((self.slots.len() - 1) as u32)
        }
    }

    pub fn get(&self, id: GraphId) -> Option<&FunctionGraph> {
        self.slots.get(id.0 as usize)?.graph.as_ref()
    }

    pub fn get_mut(&mut self, id: GraphId) -> Option<&mut FunctionGraph> {
        self.slots.get_mut(id.0 as usize)?.graph.as_mut()
    }

    /// Remove and return the stored graph, freeing the slot for reuse
    pub fn remove(&mut self, id: GraphId) -> Option<FunctionGraph> {
        let slot = self.slots.get_mut(id.0 as usize)?;
        let graph = slot.graph.take()?;
        self.free.push(id.0);
        Some(graph)
    }

    #[inline]
    pub fn contains(&self, id: GraphId) -> bool {
        self.slots
            .get(id.0 as usize)
            .is_some_and(|slot| slot.graph.is_some())
    }

    /// Number of stored graphs
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.graph.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Occupancy stamp for the slot, distinguishing reuses of the same id
    #[inline]
    pub(crate) fn epoch_of(&self, id: GraphId) -> Option<u32> {
        self.slots.get(id.0 as usize).map(|slot| slot.epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::functions::Easing;
    use approx::assert_relative_eq;

    fn registry() -> EasingRegistry {
        EasingRegistry::new()
    }

    #[test]
    fn test_linear_graph_identity() {
        let graph = FunctionGraph::linear();
        let mut reg = registry();
        assert_relative_eq!(graph.evaluate(&mut reg, 0.0), 0.0);
        assert_relative_eq!(graph.evaluate(&mut reg, 0.5), 0.5);
        assert_relative_eq!(graph.evaluate(&mut reg, 1.0), 1.0);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_add_function_splits_coverage() {
        let mut graph = FunctionGraph::linear();
        let node = graph
            .add_function(
                EasingHandle::Builtin(Easing::InQuad),
                CurvePoint::new(0.5, 0.25),
            )
            .unwrap();
        assert_eq!(node, 1);
        assert_eq!(graph.segment_count(), 2);
        assert!(graph.validate().is_ok());

        let mut reg = registry();
        // Left half still hits the split node value at its end.
        assert_relative_eq!(graph.evaluate(&mut reg, 0.5), 0.25);
        assert_relative_eq!(graph.evaluate(&mut reg, 1.0), 1.0);
    }

    #[test]
    fn test_add_function_rejects_node_collision() {
        let mut graph = FunctionGraph::linear();
        graph
            .add_function(EasingHandle::default(), CurvePoint::new(0.5, 0.5))
            .unwrap();
        assert!(graph
            .add_function(EasingHandle::default(), CurvePoint::new(0.5, 0.1))
            .is_err());
        assert!(graph
            .add_function(EasingHandle::default(), CurvePoint::new(0.0, 0.1))
            .is_err());
        assert!(graph
            .add_function(EasingHandle::default(), CurvePoint::new(1.0, 0.1))
            .is_err());
    }

    #[test]
    fn test_add_function_clamps_position() {
        let mut graph = FunctionGraph::linear();
        graph
            .add_function(EasingHandle::default(), CurvePoint::new(0.5, 7.0))
            .unwrap();
        let nodes = graph.nodes();
        assert_relative_eq!(nodes[1].value, 1.0);
    }

    #[test]
    fn test_remove_function_refuses_last() {
        let mut graph = FunctionGraph::linear();
        let err = graph.remove_function(0).unwrap_err();
        assert!(matches!(err, TweenError::InvalidRange { .. }));
    }

    #[test]
    fn test_remove_function_merges_neighbour() {
        let mut graph = FunctionGraph::linear();
        graph
            .add_function(EasingHandle::default(), CurvePoint::new(0.4, 0.4))
            .unwrap();
        graph.remove_function(1).unwrap();
        assert_eq!(graph.segment_count(), 1);
        assert!(graph.validate().is_ok());
        let nodes = graph.nodes();
        assert_eq!(nodes[0].time, 0.0);
        assert_eq!(nodes[1].time, 1.0);
    }

    #[test]
    fn test_move_node_interior_and_pinned() {
        let mut graph = FunctionGraph::linear();
        graph
            .add_function(EasingHandle::default(), CurvePoint::new(0.5, 0.5))
            .unwrap();

        graph.move_node(1, CurvePoint::new(0.3, -0.2)).unwrap();
        assert!(graph.validate().is_ok());
        let nodes = graph.nodes();
        assert_relative_eq!(nodes[1].time, 0.3);
        assert_relative_eq!(nodes[1].value, -0.2);

        // Endpoint times stay pinned; only the value moves.
        graph.move_node(0, CurvePoint::new(0.7, 0.1)).unwrap();
        let nodes = graph.nodes();
        assert_eq!(nodes[0].time, 0.0);
        assert_relative_eq!(nodes[0].value, 0.1);

        // Interior nodes cannot cross their neighbours.
        assert!(graph.move_node(1, CurvePoint::new(1.0, 0.0)).is_err());
    }

    #[test]
    fn test_mutation_round_trip_preserves_invariant() {
        let mut graph = FunctionGraph::linear();
        graph
            .add_function(
                EasingHandle::Builtin(Easing::InCubic),
                CurvePoint::new(0.25, 0.1),
            )
            .unwrap();
        graph
            .add_function(
                EasingHandle::Builtin(Easing::OutQuad),
                CurvePoint::new(0.75, 0.9),
            )
            .unwrap();
        graph.move_node(1, CurvePoint::new(0.2, 0.15)).unwrap();
        graph.remove_function(1).unwrap();
        graph
            .add_function(
                EasingHandle::Builtin(Easing::OutBounce),
                CurvePoint::new(0.5, 0.5),
            )
            .unwrap();

        assert!(graph.validate().is_ok());
        let nodes = graph.nodes();
        assert_eq!(nodes[0].time, 0.0);
        assert_eq!(nodes[nodes.len() - 1].time, 1.0);
        for pair in nodes.windows(2) {
            assert!(pair[0].time < pair[1].time);
        }
    }

    #[test]
    fn test_evaluate_degrades_beyond_range() {
        let mut graph = FunctionGraph::linear();
        graph
            .add_function(EasingHandle::default(), CurvePoint::new(0.5, -0.5))
            .unwrap();
        let mut reg = registry();
        let at_end = graph.evaluate(&mut reg, 1.0);
        let beyond = graph.evaluate(&mut reg, 1.5);
        assert_relative_eq!(at_end, beyond);
    }

    #[test]
    fn test_from_segments_validates() {
        let good = FunctionGraph::from_segments(vec![
            RangedFunction::new(
                EasingHandle::default(),
                CurvePoint::new(0.0, 0.0),
                CurvePoint::new(0.5, 0.5),
            ),
            RangedFunction::new(
                EasingHandle::default(),
                CurvePoint::new(0.5, 0.5),
                CurvePoint::new(1.0, 1.0),
            ),
        ]);
        assert!(good.is_ok());

        let gap = FunctionGraph::from_segments(vec![
            RangedFunction::new(
                EasingHandle::default(),
                CurvePoint::new(0.0, 0.0),
                CurvePoint::new(0.4, 0.5),
            ),
            RangedFunction::new(
                EasingHandle::default(),
                CurvePoint::new(0.5, 0.5),
                CurvePoint::new(1.0, 1.0),
            ),
        ]);
        assert!(gap.is_err());

        let short = FunctionGraph::from_segments(vec![RangedFunction::new(
            EasingHandle::default(),
            CurvePoint::new(0.0, 0.0),
            CurvePoint::new(0.9, 1.0),
        )]);
        assert!(short.is_err());
    }

    #[test]
    fn test_graph_bank_reuses_slots() {
        let mut bank = GraphBank::new();
        let a = bank.add(FunctionGraph::linear());
        let b = bank.add(FunctionGraph::linear());
        assert_ne!(a, b);
        assert_eq!(bank.len(), 2);

        let epoch_before = bank.epoch_of(a).unwrap();
        bank.remove(a).unwrap();
        assert!(!bank.contains(a));

        let c = bank.add(FunctionGraph::linear());
        assert_eq!(c.index(), a.index());
        assert!(bank.epoch_of(c).unwrap() > epoch_before);
    }
}
