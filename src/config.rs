//! Configuration for the tween engine

use crate::TweenError;
use serde::{Deserialize, Serialize};

/// Configuration for the tween engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Initial slot capacity of each value pool
    pub initial_capacity: usize,
    /// Whether pools grow past their initial capacity on demand
    pub growable: bool,
    /// Maximum number of baked curves kept in the cache
    pub bake_cache_size: usize,
    /// Whether to dispatch events to registered callbacks
    pub enable_events: bool,
    /// Whether to collect per-tick metrics
    pub enable_metrics: bool,
    /// Group size at which member fan-out switches to the thread pool
    pub parallel_threshold: usize,
    /// Default easing function name
    pub default_easing: String,
}

impl Default for EngineConfig {
    /// Create a new configuration with default values
    fn default() -> Self {
        Self {
            initial_capacity: 256,
            growable: true,
            bake_cache_size: 128,
            enable_events: true,
            enable_metrics: true,
            parallel_threshold: 64,
            default_easing: "linear".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration optimized for high throughput
    pub fn high_throughput() -> Self {
        Self {
            initial_capacity: 4096,
            growable: false, // Fixed capacity keeps slot storage from reallocating
            bake_cache_size: 256,
            enable_events: false, // Disable events for maximum throughput
            enable_metrics: true,
            parallel_threshold: 32,
            default_easing: "linear".to_string(),
        }
    }

    /// Create a configuration optimized for low memory usage
    pub fn low_memory() -> Self {
        Self {
            initial_capacity: 64,
            growable: true,
            bake_cache_size: 16,
            enable_events: true,
            enable_metrics: false,
            parallel_threshold: 256,
            default_easing: "linear".to_string(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), TweenError> {
        if self.initial_capacity == 0 {
            return Err(TweenError::InvalidValue {
                reason: "Initial capacity must be greater than 0".to_string(),
            });
        }

        if self.bake_cache_size == 0 {
            return Err(TweenError::InvalidValue {
                reason: "Bake cache size must be greater than 0".to_string(),
            });
        }

        if self.parallel_threshold == 0 {
            return Err(TweenError::InvalidValue {
                reason: "Parallel threshold must be greater than 0".to_string(),
            });
        }

        if self.default_easing.is_empty() {
            return Err(TweenError::InvalidValue {
                reason: "Default easing must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Set the initial pool capacity
    #[inline]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Enable or disable pool growth
    #[inline]
    pub fn with_growable(mut self, growable: bool) -> Self {
        self.growable = growable;
        self
    }

    /// Set the baked curve cache size
    #[inline]
    pub fn with_bake_cache_size(mut self, size: usize) -> Self {
        self.bake_cache_size = size;
        self
    }

    /// Enable or disable event dispatch
    #[inline]
    pub fn with_events(mut self, enabled: bool) -> Self {
        self.enable_events = enabled;
        self
    }

    /// Enable or disable metrics collection
    #[inline]
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.enable_metrics = enabled;
        self
    }

    /// Set the parallel fan-out threshold
    #[inline]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Set the default easing function
    #[inline]
    pub fn with_default_easing(mut self, easing: impl Into<String>) -> Self {
        self.default_easing = easing.into();
        self
    }
}
