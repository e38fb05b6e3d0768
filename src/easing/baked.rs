//! Pre-sampled easing curves.
//!
//! Baking trades memory for per-tick sampling cost: a [`BakedCurve`]
//! holds a uniform grid of graph samples and answers lookups with one
//! lerp. Snapshots serialize through bincode so baked data can ship with
//! assets.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::easing::graph::FunctionGraph;
use crate::easing::registry::EasingRegistry;
use crate::error::TweenError;

/// Default sample count for baked curves
pub const DEFAULT_BAKE_RESOLUTION: u32 = 64;

/// A function graph pre-sampled on a uniform grid over `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakedCurve {
    samples: Vec<f32>,
}

impl BakedCurve {
    /// Sample `graph` at `resolution + 1` uniform points
    pub fn bake(
        graph: &FunctionGraph,
        registry: &mut EasingRegistry,
        resolution: u32,
    ) -> Result<Self, TweenError> {
        if resolution < 2 {
            return Err(TweenError::InvalidValue {
                reason: format!("bake resolution must be at least 2, got {resolution}"),
            });
        }
        let mut samples = Vec::with_capacity(resolution as usize + 1);
        for i in 0..=resolution {
            let t = i as f32 / resolution as f32;
            samples.push(graph.evaluate(registry, t));
        }
        Ok(Self { samples })
    }

    /// Linear interpolation between the two nearest baked samples
    pub fn sample(&self, t: f32) -> f32 {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let last = self.samples.len() - 1;
        let scaled = t * last as f32;
        let index = (scaled.floor() as usize).min(last.saturating_sub(1));
        let frac = scaled - index as f32;
        let a = self.samples[index];
        let b = self.samples[(index + 1).min(last)];
        a + (b - a) * frac
    }

    /// Sample count minus one, the grid resolution used at bake time
    #[inline]
    pub fn resolution(&self) -> u32 {
        (self.samples.len().saturating_sub(1)) as u32
    }

    /// Serialize into a bincode snapshot
    pub fn to_bytes(&self) -> Result<Vec<u8>, TweenError> {
        Ok(bincode::serialize(self)?)
    }

    /// Restore from a bincode snapshot
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TweenError> {
        let curve: BakedCurve = bincode::deserialize(bytes)?;
        if curve.samples.len() < 3 {
            return Err(TweenError::InvalidValue {
                reason: "baked snapshot holds fewer than 3 samples".to_string(),
            });
        }
        Ok(curve)
    }
}

/// Identity of one baked rendition of a bank graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BakeKey {
    pub slot: u32,
    pub epoch: u32,
    pub generation: u32,
    pub resolution: u32,
}

/// LRU cache of baked curves keyed by graph identity and resolution
#[derive(Debug)]
pub struct BakedCurveCache {
    cache: LruCache<BakeKey, Arc<BakedCurve>>,
}

impl BakedCurveCache {
    /// Create a cache holding at most `capacity` curves
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    /// Fetch the baked curve for `key`, baking on a miss.
    /// Reports hit/miss into the registry's sampling metrics.
    pub(crate) fn get_or_bake(
        &mut self,
        key: BakeKey,
        graph: &FunctionGraph,
        registry: &mut EasingRegistry,
    ) -> Result<Arc<BakedCurve>, TweenError> {
        if let Some(curve) = self.cache.get(&key) {
            let curve = Arc::clone(curve);
            registry.metrics_mut().record_bake(true);
            return Ok(curve);
        }
        let curve = Arc::new(BakedCurve::bake(graph, registry, key.resolution)?);
        registry.metrics_mut().record_bake(false);
        self.cache.put(key, Arc::clone(&curve));
        Ok(curve)
    }

    /// Number of cached curves
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop all cached curves
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
