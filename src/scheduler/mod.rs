//! Process scheduling: typed lanes, tick orchestration, metrics, and the
//! fluent tween handle.

pub mod engine;
pub mod metrics;

pub use engine::{EaseSpec, PoolValue, Tween, TweenEngine, TweenParams};
pub use metrics::EngineMetrics;
