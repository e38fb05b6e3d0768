//! Easing name resolution and sampling.
//!
//! Built-ins resolve to [`Easing`] variants at load time; custom callables
//! registered at runtime get stable `Custom` handles. Handles are plain
//! `Copy` data, so segments and process slots store them directly.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::easing::functions::Easing;
use crate::error::TweenError;

/// Resolved reference to an easing callable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EasingHandle {
    /// Compile-time built-in function
    Builtin(Easing),
    /// Index into the registry's custom callable table
    Custom(u32),
}

impl Default for EasingHandle {
    fn default() -> Self {
        Self::Builtin(Easing::Linear)
    }
}

type CustomEasing = Box<dyn Fn(f32) -> f32 + Send + Sync>;

/// Registry of easing callables with sampling metrics
pub struct EasingRegistry {
    custom: Vec<CustomEasing>,
    custom_names: HashMap<String, u32>,
    metrics: SampleMetrics,
    enable_metrics: bool,
}

impl fmt::Debug for EasingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EasingRegistry")
            .field("builtins", &Easing::ALL.len())
            .field("custom", &self.custom.len())
            .field("enable_metrics", &self.enable_metrics)
            .finish()
    }
}

impl Default for EasingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EasingRegistry {
    /// Create a registry with all built-in functions available
    pub fn new() -> Self {
        Self {
            custom: Vec::new(),
            custom_names: HashMap::new(),
            metrics: SampleMetrics::default(),
            enable_metrics: true,
        }
    }

    /// Enable or disable sampling metrics
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.enable_metrics = enabled;
        self
    }

    /// Register a custom easing callable under `name`.
    ///
    /// Re-registering an existing custom name replaces the callable and
    /// keeps its handle stable. Names that collide with a built-in are
    /// rejected so serialized references stay unambiguous.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        function: impl Fn(f32) -> f32 + Send + Sync + 'static,
    ) -> Result<EasingHandle, TweenError> {
        let name = name.into();
        if Easing::from_name(&name).is_some() {
            return Err(TweenError::InvalidValue {
                reason: format!("easing name collides with built-in: {name}"),
            });
        }
        if let Some(&index) = self.custom_names.get(&name) {
            self.custom[index as usize] = Box::new(function);
            return Ok(EasingHandle::Custom(index));
        }
        let index = self.custom.len() as u32;
        self.custom.push(Box::new(function));
        self.custom_names.insert(name, index);
        Ok(EasingHandle::Custom(index))
    }

    /// Resolve a serialized easing name to a handle
    pub fn resolve(&self, name: &str) -> Result<EasingHandle, TweenError> {
        if let Some(builtin) = Easing::from_name(name) {
            return Ok(EasingHandle::Builtin(builtin));
        }
        if let Some(&index) = self.custom_names.get(name) {
            return Ok(EasingHandle::Custom(index));
        }
        Err(TweenError::EasingNotFound {
            name: name.to_string(),
        })
    }

    /// Check whether a name resolves
    #[inline]
    pub fn has(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    /// Evaluate a handle at `t`.
    ///
    /// A custom handle with no callable behind it falls back to linear
    /// rather than panicking.
    pub fn sample(&mut self, handle: EasingHandle, t: f32) -> f32 {
        match handle {
            EasingHandle::Builtin(easing) => {
                if self.enable_metrics {
                    self.metrics.record_builtin();
                }
                easing.apply(t)
            }
            EasingHandle::Custom(index) => {
                if self.enable_metrics {
                    self.metrics.record_custom();
                }
                match self.custom.get(index as usize) {
                    Some(function) => function(t.clamp(0.0, 1.0)),
                    None => Easing::Linear.apply(t),
                }
            }
        }
    }

    /// All resolvable names: built-ins first, then custom registrations
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Easing::ALL.iter().map(|e| e.name().to_string()).collect();
        let mut custom: Vec<(&String, &u32)> = self.custom_names.iter().collect();
        custom.sort_by_key(|(_, index)| **index);
        names.extend(custom.into_iter().map(|(name, _)| name.clone()));
        names
    }

    /// Number of custom callables registered
    #[inline]
    pub fn custom_len(&self) -> usize {
        self.custom.len()
    }

    /// Sampling metrics
    #[inline]
    pub fn metrics(&self) -> &SampleMetrics {
        &self.metrics
    }

    /// Mutable sampling metrics, used by the bake cache accounting
    #[inline]
    pub(crate) fn metrics_mut(&mut self) -> &mut SampleMetrics {
        &mut self.metrics
    }

    /// Reset sampling metrics
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }
}

/// Counters describing registry sampling activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleMetrics {
    /// Total samples served
    pub total_samples: u64,
    /// Samples served by built-in functions
    pub builtin_samples: u64,
    /// Samples served by custom callables
    pub custom_samples: u64,
    /// Baked-curve cache hits
    pub bake_hits: u64,
    /// Baked-curve cache misses
    pub bake_misses: u64,
}

impl SampleMetrics {
    #[inline]
    pub(crate) fn record_builtin(&mut self) {
        self.total_samples += 1;
        self.builtin_samples += 1;
    }

    #[inline]
    pub(crate) fn record_custom(&mut self) {
        self.total_samples += 1;
        self.custom_samples += 1;
    }

    #[inline]
    pub(crate) fn record_bake(&mut self, cache_hit: bool) {
        if cache_hit {
            self.bake_hits += 1;
        } else {
            self.bake_misses += 1;
        }
    }

    /// Baked-curve cache hit rate in `[0, 1]`
    pub fn bake_hit_rate(&self) -> f64 {
        let lookups = self.bake_hits + self.bake_misses;
        if lookups == 0 {
            0.0
        } else {
            self.bake_hits as f64 / lookups as f64
        }
    }

    /// Clear all counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
