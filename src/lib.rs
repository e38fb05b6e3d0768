//! Tweenkit
//!
//! A high-throughput engine for running thousands of concurrent value
//! interpolations. Processes live in fixed-capacity typed pools addressed
//! by versioned handles, advance on normalized clocks, blend through
//! piecewise easing graphs, and fan values out to callbacks and groups.

pub mod asset;
pub mod config;
pub mod easing;
pub mod error;
pub mod event;
pub mod group;
pub mod process;
pub mod scheduler;
pub mod time;
pub mod value;

// Re-export common types for convenience
pub use asset::{ChannelEase, ChannelSpec, MotionAsset, PropertyKind, ValueMode};
pub use config::EngineConfig;
pub use easing::{
    BakedCurve, BakedCurveCache, CurvePoint, Easing, EasingHandle, EasingRegistry, FunctionGraph,
    GraphBank, GraphId, RangedFunction, SampleMetrics, DEFAULT_BAKE_RESOLUTION, MAX_SEGMENTS,
};
pub use error::TweenError;
pub use event::{CallbackRegistry, DispatchTally, EventFlags, OwnerHandle, TweenEvent};
pub use group::{GroupController, GroupSink, MemberId, ThreadHint};
pub use process::{ProcessId, ProcessStatus};
pub use scheduler::{EaseSpec, EngineMetrics, PoolValue, Tween, TweenEngine, TweenParams};
pub use time::{Clock, ClockTick, TimeControl, Timer};
pub use value::{AxisMask, Tweenable, Vector2, Vector3, Vector4, MAX_AXES};

/// Tweenkit result type
pub type Result<T> = core::result::Result<T, TweenError>;
