//! The tween engine: typed process lanes, tick orchestration, and the
//! fluent handle API.
//!
//! Each pooled value type gets its own lane holding a process pool, a
//! callback registry, an event buffer, and the groups driven from that
//! lane. Handles carry their lane's pool id, so untyped control calls
//! route by handle alone while value access stays statically typed.
//!
//! One `update` runs four phases per lane, in order: advance clocks and
//! write values, dispatch buffered events, fan group values out, recycle
//! ended processes. Killed and completed processes therefore stay
//! readable until the recycle phase of the update that retires them.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::asset::{ChannelEase, MotionAsset, PropertyKind, ValueMode};
use crate::config::EngineConfig;
use crate::easing::baked::BakeKey;
use crate::easing::{
    BakedCurve, BakedCurveCache, EasePlan, Easing, EasingHandle, EasingRegistry, FunctionGraph,
    GraphBank, GraphId,
};
use crate::error::TweenError;
use crate::event::{CallbackRegistry, DispatchTally, EventFlags, OwnerHandle, TweenEvent};
use crate::group::{GroupController, MemberId, ThreadHint};
use crate::process::pool::{ProcessId, ProcessPool};
use crate::process::status::ProcessStatus;
use crate::scheduler::metrics::EngineMetrics;
use crate::time::{validate_duration, Clock, TimeControl, Timer};
use crate::value::{AxisMask, Tweenable, Vector2, Vector3, Vector4, MAX_AXES};

/// Easing selection for a new tween
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EaseSpec {
    /// The engine's configured default easing
    #[default]
    Default,
    /// A built-in easing function
    Preset(Easing),
    /// A registered easing function, looked up by name
    Named(String),
    /// A function graph shared by all axes
    Graph(GraphId),
    /// An independent function graph per axis
    PerAxis([Option<GraphId>; MAX_AXES]),
}

/// Parameters for creating a tween
#[derive(Debug, Clone)]
pub struct TweenParams<T: Tweenable> {
    start: T,
    end: T,
    duration: f32,
    ease: EaseSpec,
    time_control: TimeControl,
    mask: AxisMask,
    loop_limit: i32,
}

impl<T: Tweenable> TweenParams<T> {
    /// Tween from `start` to `end` over `duration` seconds
    pub fn new(start: T, end: T, duration: f32) -> Self {
        Self {
            start,
            end,
            duration,
            ease: EaseSpec::Default,
            time_control: TimeControl::PlayOnce,
            mask: AxisMask::all(),
            loop_limit: -1,
        }
    }

    /// Use a built-in easing function
    #[inline]
    pub fn with_ease(mut self, easing: Easing) -> Self {
        self.ease = EaseSpec::Preset(easing);
        self
    }

    /// Use a registered easing function by name
    #[inline]
    pub fn with_named_ease(mut self, name: impl Into<String>) -> Self {
        self.ease = EaseSpec::Named(name.into());
        self
    }

    /// Use a function graph for all axes
    #[inline]
    pub fn with_graph(mut self, graph: GraphId) -> Self {
        self.ease = EaseSpec::Graph(graph);
        self
    }

    /// Use an independent function graph per axis
    #[inline]
    pub fn with_axis_graphs(mut self, graphs: [Option<GraphId>; MAX_AXES]) -> Self {
        self.ease = EaseSpec::PerAxis(graphs);
        self
    }

    /// Set the boundary behavior
    #[inline]
    pub fn with_time_control(mut self, time_control: TimeControl) -> Self {
        self.time_control = time_control;
        self
    }

    /// Restrict the tween to masked axes
    #[inline]
    pub fn with_mask(mut self, mask: AxisMask) -> Self {
        self.mask = mask;
        self
    }

    /// Bound the number of loop crossings, `-1` for unlimited
    #[inline]
    pub fn with_loop_limit(mut self, limit: i32) -> Self {
        self.loop_limit = limit;
        self
    }
}

/// Per-type storage: pool, callbacks, event buffer, and groups.
#[doc(hidden)]
pub struct Lane<T: Tweenable> {
    pool: ProcessPool<T>,
    callbacks: CallbackRegistry<T>,
    events: Vec<TweenEvent<T>>,
    retire: Vec<u32>,
    groups: HashMap<String, GroupController<T>>,
}

impl<T: Tweenable> Lane<T> {
    fn new(pool_id: u32, name: &'static str, config: &EngineConfig) -> Self {
        Self {
            pool: ProcessPool::new(pool_id, name, config.initial_capacity, config.growable),
            callbacks: CallbackRegistry::new(),
            events: Vec::new(),
            retire: Vec::new(),
            groups: HashMap::new(),
        }
    }
}

/// Value types the engine pools natively.
///
/// Each implementor maps to a dedicated lane; the lane's pool id is
/// embedded in every handle it issues.
pub trait PoolValue: Tweenable {
    /// Pool id carried by handles for this type
    const POOL_ID: u32;
    /// Lane name used in capacity errors and logs
    const LANE_NAME: &'static str;

    #[doc(hidden)]
    fn lane(engine: &TweenEngine) -> &Lane<Self>;
    #[doc(hidden)]
    fn lane_mut(engine: &mut TweenEngine) -> &mut Lane<Self>;
}

impl PoolValue for f32 {
    const POOL_ID: u32 = 0;
    const LANE_NAME: &'static str = "f32";

    fn lane(engine: &TweenEngine) -> &Lane<Self> {
        &engine.scalars
    }

    fn lane_mut(engine: &mut TweenEngine) -> &mut Lane<Self> {
        &mut engine.scalars
    }
}

impl PoolValue for Vector2 {
    const POOL_ID: u32 = 1;
    const LANE_NAME: &'static str = "vec2";

    fn lane(engine: &TweenEngine) -> &Lane<Self> {
        &engine.pairs
    }

    fn lane_mut(engine: &mut TweenEngine) -> &mut Lane<Self> {
        &mut engine.pairs
    }
}

impl PoolValue for Vector3 {
    const POOL_ID: u32 = 2;
    const LANE_NAME: &'static str = "vec3";

    fn lane(engine: &TweenEngine) -> &Lane<Self> {
        &engine.triples
    }

    fn lane_mut(engine: &mut TweenEngine) -> &mut Lane<Self> {
        &mut engine.triples
    }
}

impl PoolValue for Vector4 {
    const POOL_ID: u32 = 3;
    const LANE_NAME: &'static str = "vec4";

    fn lane(engine: &TweenEngine) -> &Lane<Self> {
        &engine.quads
    }

    fn lane_mut(engine: &mut TweenEngine) -> &mut Lane<Self> {
        &mut engine.quads
    }
}

fn stale_handle(id: ProcessId) -> TweenError {
    TweenError::InvalidHandle {
        slot: id.slot(),
        pool: id.pool(),
        version: id.version(),
    }
}

fn record_dispatch(metrics: &mut EngineMetrics, tally: DispatchTally) {
    metrics.events_dispatched += 1;
    metrics.callbacks_invoked += tally.invoked;
    metrics.dead_owner_drops += tally.dead_dropped;
}

/// Route an untyped handle to its lane by pool id.
macro_rules! with_lane {
    ($engine:expr, $id:expr, $lane:ident => $body:block, $miss:expr) => {
        match $id.pool() {
            0 => {
                let $lane = &mut $engine.scalars;
                $body
            }
            1 => {
                let $lane = &mut $engine.pairs;
                $body
            }
            2 => {
                let $lane = &mut $engine.triples;
                $body
            }
            3 => {
                let $lane = &mut $engine.quads;
                $body
            }
            _ => $miss,
        }
    };
}

macro_rules! with_lane_ref {
    ($engine:expr, $id:expr, $lane:ident => $body:block, $miss:expr) => {
        match $id.pool() {
            0 => {
                let $lane = &$engine.scalars;
                $body
            }
            1 => {
                let $lane = &$engine.pairs;
                $body
            }
            2 => {
                let $lane = &$engine.triples;
                $body
            }
            3 => {
                let $lane = &$engine.quads;
                $body
            }
            _ => $miss,
        }
    };
}

/// Engine managing pooled tween processes across all value lanes
pub struct TweenEngine {
    /// Engine configuration
    config: EngineConfig,
    /// Easing functions, built-in and registered
    easings: EasingRegistry,
    /// Shared function graphs
    graphs: GraphBank,
    /// Baked curve cache
    bake_cache: BakedCurveCache,
    /// Scalar lane
    scalars: Lane<f32>,
    /// Two-axis lane
    pairs: Lane<Vector2>,
    /// Three-axis lane
    triples: Lane<Vector3>,
    /// Four-axis lane
    quads: Lane<Vector4>,
    /// Registered motion assets
    assets: HashMap<String, MotionAsset>,
    /// Engine metrics
    metrics: EngineMetrics,
}

impl TweenEngine {
    /// Create a new engine.
    ///
    /// Out-of-range configuration values are clamped by the subsystems
    /// that consume them; a warning is logged when that happens.
    pub fn new(config: EngineConfig) -> Self {
        if let Err(err) = config.validate() {
            warn!("engine config invalid, proceeding with clamped values: {err}");
        }
        Self {
            easings: EasingRegistry::new().with_metrics(config.enable_metrics),
            graphs: GraphBank::new(),
            bake_cache: BakedCurveCache::new(config.bake_cache_size),
            scalars: Lane::new(f32::POOL_ID, f32::LANE_NAME, &config),
            pairs: Lane::new(Vector2::POOL_ID, Vector2::LANE_NAME, &config),
            triples: Lane::new(Vector3::POOL_ID, Vector3::LANE_NAME, &config),
            quads: Lane::new(Vector4::POOL_ID, Vector4::LANE_NAME, &config),
            assets: HashMap::new(),
            metrics: EngineMetrics::new(),
            config,
        }
    }

    /// Create a tween process and return its handle
    pub fn create<T: PoolValue>(&mut self, params: TweenParams<T>) -> Result<ProcessId, TweenError> {
        validate_duration(params.duration)?;
        if params.mask.is_empty() {
            return Err(TweenError::InvalidValue {
                reason: "Axis mask selects no axes".to_string(),
            });
        }
        let plan = self.resolve_ease(&params.ease)?;
        let mut clock = Clock::from_duration(params.duration, params.time_control);
        clock.set_loop_limit(params.loop_limit);
        let id = T::lane_mut(self)
            .pool
            .spawn(params.start, params.end, clock, plan, params.mask)?;
        self.metrics.processes_created += 1;
        debug!("created {} on {} lane", id, T::LANE_NAME);
        Ok(id)
    }

    /// Create a tween and wrap it in a chainable handle
    pub fn tween<T: PoolValue>(
        &mut self,
        params: TweenParams<T>,
    ) -> Result<Tween<'_, T>, TweenError> {
        let id = self.create(params)?;
        Ok(Tween {
            engine: self,
            id,
            marker: PhantomData,
        })
    }

    /// Wrap an existing live handle in a chainable handle
    pub fn handle<T: PoolValue>(&mut self, id: ProcessId) -> Result<Tween<'_, T>, TweenError> {
        T::lane(self).pool.get(id)?;
        Ok(Tween {
            engine: self,
            id,
            marker: PhantomData,
        })
    }

    fn resolve_ease(&self, spec: &EaseSpec) -> Result<EasePlan, TweenError> {
        match spec {
            EaseSpec::Default => Ok(EasePlan::Uniform(
                self.easings.resolve(&self.config.default_easing)?,
            )),
            EaseSpec::Preset(easing) => Ok(EasePlan::Uniform(EasingHandle::Builtin(*easing))),
            EaseSpec::Named(name) => Ok(EasePlan::Uniform(self.easings.resolve(name)?)),
            EaseSpec::Graph(id) => {
                if !self.graphs.contains(*id) {
                    return Err(TweenError::GraphNotFound { id: id.index() });
                }
                Ok(EasePlan::Graph(*id))
            }
            EaseSpec::PerAxis(ids) => {
                for id in ids.iter().flatten() {
                    if !self.graphs.contains(*id) {
                        return Err(TweenError::GraphNotFound { id: id.index() });
                    }
                }
                Ok(EasePlan::PerAxis(*ids))
            }
        }
    }

    /// Pause a running process, firing `PAUSE` immediately.
    /// Pausing a process that is not running is a no-op.
    pub fn pause(&mut self, id: ProcessId) -> Result<(), TweenError> {
        with_lane!(self, id, lane => {
            let slot = lane.pool.get_mut(id)?;
            if !slot.ctx.status.can_pause() {
                return Ok(());
            }
            slot.ctx.status = ProcessStatus::Paused;
            let event = TweenEvent {
                id,
                flags: EventFlags::PAUSE,
                progress: slot.ctx.progress,
                value: slot.current,
            };
            let listens = slot.ctx.passive.intersects(EventFlags::PAUSE);
            if self.config.enable_events && listens {
                let tally = lane.callbacks.invoke(&event);
                record_dispatch(&mut self.metrics, tally);
            }
            Ok(())
        }, Err(stale_handle(id)))
    }

    /// Resume a paused process, firing `RESUME` immediately.
    /// Resuming a process that is not paused is a no-op.
    pub fn resume(&mut self, id: ProcessId) -> Result<(), TweenError> {
        with_lane!(self, id, lane => {
            let slot = lane.pool.get_mut(id)?;
            if !slot.ctx.status.can_resume() {
                return Ok(());
            }
            slot.ctx.status = ProcessStatus::Running;
            let event = TweenEvent {
                id,
                flags: EventFlags::RESUME,
                progress: slot.ctx.progress,
                value: slot.current,
            };
            let listens = slot.ctx.passive.intersects(EventFlags::RESUME);
            if self.config.enable_events && listens {
                let tally = lane.callbacks.invoke(&event);
                record_dispatch(&mut self.metrics, tally);
            }
            Ok(())
        }, Err(stale_handle(id)))
    }

    /// Kill a process, firing `COMPLETE | KILL` immediately.
    ///
    /// The slot is recycled at the next update; until then the handle
    /// stays readable. Returns false when the handle is already dead or
    /// the process has ended.
    pub fn kill(&mut self, id: ProcessId) -> bool {
        with_lane!(self, id, lane => {
            let Ok(slot) = lane.pool.get_mut(id) else {
                return false;
            };
            if slot.ctx.status.is_terminal() {
                return false;
            }
            slot.ctx.status = ProcessStatus::Completed;
            let event = TweenEvent {
                id,
                flags: EventFlags::COMPLETE | EventFlags::KILL,
                progress: slot.ctx.progress,
                value: slot.current,
            };
            let listens = slot.ctx.passive.intersects(EventFlags::COMPLETE | EventFlags::KILL);
            lane.retire.push(id.slot());
            if self.config.enable_events && listens {
                let tally = lane.callbacks.invoke(&event);
                record_dispatch(&mut self.metrics, tally);
            }
            self.metrics.processes_killed += 1;
            debug!("killed {}", id);
            true
        }, false)
    }

    /// Flip the running direction of a process
    pub fn invert(&mut self, id: ProcessId) -> Result<(), TweenError> {
        with_lane!(self, id, lane => {
            lane.pool.get_mut(id)?.clock.invert_direction();
            Ok(())
        }, Err(stale_handle(id)))
    }

    /// Rewind a process to its start and set it running again
    pub fn restart(&mut self, id: ProcessId) -> Result<(), TweenError> {
        with_lane!(self, id, lane => {
            let slot = lane.pool.get_mut(id)?;
            slot.clock.restart();
            slot.ctx.status = ProcessStatus::Running;
            slot.ctx.started = false;
            slot.ctx.active = EventFlags::empty();
            let progress = slot.clock.progress();
            slot.ctx.progress = progress;
            let plan = slot.plan;
            let (eased, faults) = eased_axes(&plan, progress, &mut self.easings, &self.graphs);
            self.metrics.easing_faults += u64::from(faults);
            slot.current = Tweenable::lerp_masked(slot.start, slot.end, &eased, slot.mask);
            // A restart outruns any retirement queued for this slot.
            lane.retire.retain(|&index| index != id.slot());
            Ok(())
        }, Err(stale_handle(id)))
    }

    /// Jump a process to `progress` and recompute its value immediately.
    /// Seeking works while paused and fires no events.
    pub fn seek(&mut self, id: ProcessId, progress: f32) -> Result<(), TweenError> {
        with_lane!(self, id, lane => {
            let slot = lane.pool.get_mut(id)?;
            slot.clock.set_progress(progress);
            let progress = slot.clock.progress();
            slot.ctx.progress = progress;
            let plan = slot.plan;
            let (eased, faults) = eased_axes(&plan, progress, &mut self.easings, &self.graphs);
            self.metrics.easing_faults += u64::from(faults);
            slot.current = Tweenable::lerp_masked(slot.start, slot.end, &eased, slot.mask);
            Ok(())
        }, Err(stale_handle(id)))
    }

    /// Set the clock speed in progress units per second
    pub fn set_speed(&mut self, id: ProcessId, speed: f32) -> Result<(), TweenError> {
        with_lane!(self, id, lane => {
            lane.pool.get_mut(id)?.clock.set_speed(speed);
            Ok(())
        }, Err(stale_handle(id)))
    }

    /// Re-derive the clock speed from a new duration in seconds
    pub fn set_duration(&mut self, id: ProcessId, duration: f32) -> Result<(), TweenError> {
        validate_duration(duration)?;
        with_lane!(self, id, lane => {
            lane.pool.get_mut(id)?.clock.set_speed(1.0 / duration);
            Ok(())
        }, Err(stale_handle(id)))
    }

    /// Bound the number of loop crossings, `-1` for unlimited
    pub fn set_loop_limit(&mut self, id: ProcessId, limit: i32) -> Result<(), TweenError> {
        with_lane!(self, id, lane => {
            lane.pool.get_mut(id)?.clock.set_loop_limit(limit);
            Ok(())
        }, Err(stale_handle(id)))
    }

    /// Whether the handle refers to a live process
    pub fn is_alive(&self, id: ProcessId) -> bool {
        with_lane_ref!(self, id, lane => { lane.pool.contains(id) }, false)
    }

    /// Clock progress of a process, in `[0, 1]`
    pub fn progress(&self, id: ProcessId) -> Result<f32, TweenError> {
        with_lane_ref!(self, id, lane => {
            Ok(lane.pool.get(id)?.clock.progress())
        }, Err(stale_handle(id)))
    }

    /// Execution status of a process
    pub fn status(&self, id: ProcessId) -> Result<ProcessStatus, TweenError> {
        with_lane_ref!(self, id, lane => {
            Ok(lane.pool.get(id)?.ctx.status)
        }, Err(stale_handle(id)))
    }

    /// Current interpolated value of a process
    pub fn value<T: PoolValue>(&self, id: ProcessId) -> Result<T, TweenError> {
        Ok(T::lane(self).pool.get(id)?.current)
    }

    /// Register a callback for `flags` on a live process
    pub fn on<T: PoolValue>(
        &mut self,
        id: ProcessId,
        flags: EventFlags,
        callback: impl FnMut(&TweenEvent<T>) + Send + 'static,
    ) -> Result<(), TweenError> {
        self.attach::<T>(id, flags, None, callback)
    }

    /// Register a callback tied to an owner's liveness.
    /// Once `owner` drops, the callback stops firing and is discarded.
    pub fn on_owned<T: PoolValue>(
        &mut self,
        id: ProcessId,
        flags: EventFlags,
        owner: &OwnerHandle,
        callback: impl FnMut(&TweenEvent<T>) + Send + 'static,
    ) -> Result<(), TweenError> {
        self.attach::<T>(id, flags, Some(owner.watch()), callback)
    }

    /// Drop every callback registered on a live process
    pub fn clear_callbacks<T: PoolValue>(&mut self, id: ProcessId) -> Result<(), TweenError> {
        let lane = T::lane_mut(self);
        lane.pool.get(id)?;
        lane.callbacks.unregister_all(id.slot());
        lane.pool.get_mut(id)?.ctx.passive = EventFlags::empty();
        Ok(())
    }

    fn attach<T: PoolValue>(
        &mut self,
        id: ProcessId,
        flags: EventFlags,
        token: Option<std::sync::Weak<()>>,
        callback: impl FnMut(&TweenEvent<T>) + Send + 'static,
    ) -> Result<(), TweenError> {
        let lane = T::lane_mut(self);
        lane.pool.get(id)?;
        lane.callbacks.register(id.slot(), flags, token, callback);
        let passive = lane.callbacks.passive_flags(id.slot());
        lane.pool.get_mut(id)?.ctx.passive = passive;
        Ok(())
    }

    /// Advance every lane by `delta` seconds
    pub fn update(&mut self, delta: f32) {
        if !delta.is_finite() {
            warn!("ignoring non-finite update delta");
            return;
        }
        let timer = Timer::start();
        update_lane(
            &mut self.scalars,
            &mut self.easings,
            &self.graphs,
            &mut self.metrics,
            &self.config,
            delta,
        );
        update_lane(
            &mut self.pairs,
            &mut self.easings,
            &self.graphs,
            &mut self.metrics,
            &self.config,
            delta,
        );
        update_lane(
            &mut self.triples,
            &mut self.easings,
            &self.graphs,
            &mut self.metrics,
            &self.config,
            delta,
        );
        update_lane(
            &mut self.quads,
            &mut self.easings,
            &self.graphs,
            &mut self.metrics,
            &self.config,
            delta,
        );
        let live = self.live_count();
        let micros = if self.config.enable_metrics {
            timer.elapsed_micros()
        } else {
            0
        };
        self.metrics.record_tick(micros, live);
        trace!("tick {}: {} live processes", self.metrics.ticks, live);
    }

    /// Create a group fanning one driver's values out to member sinks.
    ///
    /// Member offsets are measured from the driver's start value, so a
    /// member joining at its current value holds that value while the
    /// driver sits at its start. Group names are scoped per value type.
    pub fn create_group<T: PoolValue>(
        &mut self,
        name: impl Into<String>,
        driver: ProcessId,
        hint: ThreadHint,
    ) -> Result<(), TweenError> {
        let name = name.into();
        let lane = T::lane_mut(self);
        if lane.groups.contains_key(&name) {
            return Err(TweenError::DuplicateGroup { name });
        }
        let origin = lane.pool.get(driver)?.start;
        debug!("created group '{}' driven by {}", name, driver);
        lane.groups
            .insert(name.clone(), GroupController::new(name, driver, origin, hint));
        Ok(())
    }

    /// Queue a member for addition at the next update.
    /// `value` is the member's value now; its offset from the group
    /// origin stays fixed for the member's lifetime.
    pub fn add_to_group<T: PoolValue>(
        &mut self,
        name: &str,
        value: T,
        sink: impl FnMut(T) + Send + 'static,
    ) -> Result<MemberId, TweenError> {
        let group = Self::group_entry(T::lane_mut(self), name)?;
        Ok(group.queue_add(value, Box::new(sink)))
    }

    /// Queue a member for removal at the next update
    pub fn remove_from_group<T: PoolValue>(
        &mut self,
        name: &str,
        member: MemberId,
    ) -> Result<(), TweenError> {
        let group = Self::group_entry(T::lane_mut(self), name)?;
        group.queue_remove(member);
        Ok(())
    }

    /// Suspend or resume a group's fan-out without touching membership
    pub fn set_group_enabled<T: PoolValue>(
        &mut self,
        name: &str,
        enabled: bool,
    ) -> Result<(), TweenError> {
        let group = Self::group_entry(T::lane_mut(self), name)?;
        group.set_enabled(enabled);
        Ok(())
    }

    /// Drop a group and all its members.
    /// The driving process is left running; kill it separately.
    pub fn terminate_group<T: PoolValue>(&mut self, name: &str) -> Result<(), TweenError> {
        match T::lane_mut(self).groups.remove(name) {
            Some(_) => {
                debug!("terminated group '{}'", name);
                Ok(())
            }
            None => Err(TweenError::GroupNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Inspect a group
    pub fn group<T: PoolValue>(&self, name: &str) -> Option<&GroupController<T>> {
        T::lane(self).groups.get(name)
    }

    fn group_entry<'l, T: Tweenable>(
        lane: &'l mut Lane<T>,
        name: &str,
    ) -> Result<&'l mut GroupController<T>, TweenError> {
        lane.groups
            .get_mut(name)
            .ok_or_else(|| TweenError::GroupNotFound {
                name: name.to_string(),
            })
    }

    /// Register a motion asset, returning its unique id
    pub fn register_asset(&mut self, asset: MotionAsset) -> Result<String, TweenError> {
        asset.validate()?;
        let mut id = format!("{}-{}", asset.name, Uuid::new_v4());
        while self.assets.contains_key(&id) {
            id = format!("{}-{}", asset.name, Uuid::new_v4());
        }
        debug!("registered motion asset '{}'", id);
        self.assets.insert(id.clone(), asset);
        Ok(id)
    }

    /// Get a registered asset
    #[inline]
    pub fn asset(&self, id: &str) -> Option<&MotionAsset> {
        self.assets.get(id)
    }

    /// Remove a registered asset
    pub fn remove_asset(&mut self, id: &str) -> Option<MotionAsset> {
        self.assets.remove(id)
    }

    /// Ids of all registered assets
    #[inline]
    pub fn asset_ids(&self) -> Vec<&str> {
        self.assets.keys().map(|s| s.as_str()).collect()
    }

    /// Spawn one process per channel of a registered asset.
    ///
    /// All channels spawn or none do: a capacity or easing failure on a
    /// later channel releases the processes already spawned.
    pub fn instantiate(
        &mut self,
        asset_id: &str,
    ) -> Result<Vec<(PropertyKind, ProcessId)>, TweenError> {
        let Some(asset) = self.assets.get(asset_id) else {
            return Err(TweenError::AssetNotFound {
                id: asset_id.to_string(),
            });
        };
        let mut spawned: Vec<(PropertyKind, ProcessId)> = Vec::with_capacity(asset.channels.len());
        let mut added_graphs: Vec<GraphId> = Vec::new();
        for channel in &asset.channels {
            let plan = match &channel.ease {
                ChannelEase::Named(name) => match self.easings.resolve(name) {
                    Ok(handle) => EasePlan::Uniform(handle),
                    Err(err) => {
                        rollback_instantiate(
                            &mut self.triples.pool,
                            &mut self.graphs,
                            &spawned,
                            &added_graphs,
                        );
                        return Err(err);
                    }
                },
                ChannelEase::PerAxis(curves) => {
                    let mut ids = [None; MAX_AXES];
                    for (axis, curve) in curves.iter().enumerate() {
                        if let Some(graph) = curve {
                            let id = self.graphs.add(graph.clone());
                            added_graphs.push(id);
                            ids[axis] = Some(id);
                        }
                    }
                    EasePlan::PerAxis(ids)
                }
            };
            let end = match channel.value_mode {
                ValueMode::Absolute => channel.target,
                ValueMode::Relative => channel.start.offset_by(channel.target),
            };
            let mut clock = Clock::from_duration(channel.duration, channel.time_control);
            clock.set_loop_limit(channel.loop_limit);
            match self
                .triples
                .pool
                .spawn(channel.start, end, clock, plan, channel.mask)
            {
                Ok(id) => spawned.push((channel.property, id)),
                Err(err) => {
                    rollback_instantiate(
                        &mut self.triples.pool,
                        &mut self.graphs,
                        &spawned,
                        &added_graphs,
                    );
                    return Err(err);
                }
            }
        }
        self.metrics.processes_created += spawned.len() as u64;
        debug!(
            "instantiated asset '{}' into {} processes",
            asset_id,
            spawned.len()
        );
        Ok(spawned)
    }

    /// Add a function graph to the shared bank
    pub fn add_graph(&mut self, graph: FunctionGraph) -> Result<GraphId, TweenError> {
        graph.validate()?;
        Ok(self.graphs.add(graph))
    }

    /// Get a function graph
    #[inline]
    pub fn graph(&self, id: GraphId) -> Option<&FunctionGraph> {
        self.graphs.get(id)
    }

    /// Get a mutable function graph
    #[inline]
    pub fn graph_mut(&mut self, id: GraphId) -> Option<&mut FunctionGraph> {
        self.graphs.get_mut(id)
    }

    /// Remove a function graph.
    /// Live processes still referencing it fall back to raw progress
    /// and count an easing fault each tick.
    pub fn remove_graph(&mut self, id: GraphId) -> Option<FunctionGraph> {
        self.graphs.remove(id)
    }

    /// Bake a graph into a sampled curve, served from the cache when the
    /// graph has not changed since the last bake at this resolution
    pub fn bake_graph(
        &mut self,
        id: GraphId,
        resolution: u32,
    ) -> Result<Arc<BakedCurve>, TweenError> {
        let (graph, epoch) = match (self.graphs.get(id), self.graphs.epoch_of(id)) {
            (Some(graph), Some(epoch)) => (graph, epoch),
            _ => return Err(TweenError::GraphNotFound { id: id.index() }),
        };
        let key = BakeKey {
            slot: id.index(),
            epoch,
            generation: graph.generation(),
            resolution,
        };
        self.bake_cache.get_or_bake(key, graph, &mut self.easings)
    }

    /// Total live processes across all lanes
    pub fn live_count(&self) -> usize {
        self.scalars.pool.live()
            + self.pairs.pool.live()
            + self.triples.pool.live()
            + self.quads.pool.live()
    }

    /// Live processes on one lane
    #[inline]
    pub fn pool_live<T: PoolValue>(&self) -> usize {
        T::lane(self).pool.live()
    }

    /// Slot capacity of one lane
    #[inline]
    pub fn pool_capacity<T: PoolValue>(&self) -> usize {
        T::lane(self).pool.capacity()
    }

    /// Get the easing registry
    #[inline]
    pub fn easings(&self) -> &EasingRegistry {
        &self.easings
    }

    /// Get the mutable easing registry
    #[inline]
    pub fn easings_mut(&mut self) -> &mut EasingRegistry {
        &mut self.easings
    }

    /// Get the baked curve cache
    #[inline]
    pub fn bake_cache(&self) -> &BakedCurveCache {
        &self.bake_cache
    }

    /// Get engine configuration
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get engine metrics
    #[inline]
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Reset engine metrics
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
        self.easings.reset_metrics();
    }
}

impl Default for TweenEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Eased blend factor per axis for `plan` at `progress`.
///
/// Missing graphs and non-finite samples degrade that axis to the raw
/// progress; the second return value counts those faults.
fn eased_axes(
    plan: &EasePlan,
    progress: f32,
    easings: &mut EasingRegistry,
    graphs: &GraphBank,
) -> ([f32; MAX_AXES], u32) {
    let mut out = [progress; MAX_AXES];
    let mut faults = 0u32;
    match plan {
        EasePlan::Uniform(handle) => {
            let eased = easings.sample(*handle, progress);
            if eased.is_finite() {
                out = [eased; MAX_AXES];
            } else {
                faults += 1;
            }
        }
        EasePlan::Graph(id) => match graphs.get(*id) {
            Some(graph) => {
                let eased = graph.evaluate(easings, progress);
                if eased.is_finite() {
                    out = [eased; MAX_AXES];
                } else {
                    faults += 1;
                }
            }
            None => faults += 1,
        },
        EasePlan::PerAxis(ids) => {
            for (axis, graph_id) in ids.iter().enumerate() {
                let Some(graph_id) = graph_id else {
                    continue;
                };
                match graphs.get(*graph_id) {
                    Some(graph) => {
                        let eased = graph.evaluate(easings, progress);
                        if eased.is_finite() {
                            out[axis] = eased;
                        } else {
                            faults += 1;
                        }
                    }
                    None => faults += 1,
                }
            }
        }
    }
    (out, faults)
}

fn rollback_instantiate(
    pool: &mut ProcessPool<Vector3>,
    graphs: &mut GraphBank,
    spawned: &[(PropertyKind, ProcessId)],
    added: &[GraphId],
) {
    for (_, id) in spawned {
        pool.release(*id);
    }
    for id in added {
        graphs.remove(*id);
    }
}

fn update_lane<T: Tweenable>(
    lane: &mut Lane<T>,
    easings: &mut EasingRegistry,
    graphs: &GraphBank,
    metrics: &mut EngineMetrics,
    config: &EngineConfig,
    delta: f32,
) {
    let pool_id = lane.pool.pool_id();

    // Advance clocks and write interpolated values
    for (index, slot) in lane.pool.iter_occupied_mut() {
        if !slot.ctx.status.is_running() {
            slot.ctx.active = EventFlags::empty();
            continue;
        }
        let tick = slot.clock.tick(delta);
        let (eased, faults) = eased_axes(&slot.plan, tick.progress, easings, graphs);
        if faults > 0 {
            metrics.easing_faults += u64::from(faults);
            warn!("easing fault on p{pool_id}s{index}, substituted raw progress");
        }
        slot.current = Tweenable::lerp_masked(slot.start, slot.end, &eased, slot.mask);

        let mut flags = EventFlags::UPDATE;
        if !slot.ctx.started {
            slot.ctx.started = true;
            flags |= EventFlags::START;
        }
        if tick.loop_completed {
            flags |= EventFlags::LOOP_COMPLETED;
        }
        if tick.just_completed {
            // Every ending carries COMPLETE and KILL together.
            flags |= EventFlags::COMPLETE | EventFlags::KILL;
            slot.ctx.status = ProcessStatus::Completed;
            lane.retire.push(index);
            metrics.processes_completed += 1;
        }
        slot.ctx.progress = tick.progress;
        slot.ctx.active = flags & slot.ctx.passive;

        if config.enable_events && !slot.ctx.active.is_empty() {
            lane.events.push(TweenEvent {
                id: ProcessId::new(index, pool_id, slot.version),
                flags,
                progress: tick.progress,
                value: slot.current,
            });
        }
    }

    // Dispatch buffered events in emission order
    if !lane.events.is_empty() {
        let mut events = std::mem::take(&mut lane.events);
        for event in &events {
            let tally = lane.callbacks.invoke(event);
            record_dispatch(metrics, tally);
        }
        events.clear();
        lane.events = events;
    }

    // Fan driver values out before retiring, so members receive the
    // terminal value of a driver ending this update
    for group in lane.groups.values_mut() {
        group.flush();
        if let Ok(driver) = lane.pool.get(group.driver()) {
            group.apply(driver.current, config.parallel_threshold);
        }
    }

    // Recycle ended processes
    if !lane.retire.is_empty() {
        let mut retire = std::mem::take(&mut lane.retire);
        for &index in &retire {
            lane.callbacks.unregister_all(index);
            lane.pool.release_slot(index);
        }
        retire.clear();
        lane.retire = retire;
    }
}

/// Chainable view of one live process.
///
/// A `Tween` holds the engine exclusively borrowed, so the underlying
/// handle stays valid for the life of the chain and chained operations
/// cannot fail.
pub struct Tween<'e, T: PoolValue> {
    engine: &'e mut TweenEngine,
    id: ProcessId,
    marker: PhantomData<T>,
}

impl<'e, T: PoolValue> Tween<'e, T> {
    /// The underlying process handle
    #[inline]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Register a callback for `flags`
    pub fn on(self, flags: EventFlags, callback: impl FnMut(&TweenEvent<T>) + Send + 'static) -> Self {
        let _ = self.engine.on::<T>(self.id, flags, callback);
        self
    }

    /// Register a callback tied to an owner's liveness
    pub fn on_owned(
        self,
        flags: EventFlags,
        owner: &OwnerHandle,
        callback: impl FnMut(&TweenEvent<T>) + Send + 'static,
    ) -> Self {
        let _ = self.engine.on_owned::<T>(self.id, flags, owner, callback);
        self
    }

    /// Fire on the first advancing tick
    pub fn on_start(self, callback: impl FnMut(&TweenEvent<T>) + Send + 'static) -> Self {
        self.on(EventFlags::START, callback)
    }

    /// Fire on every advancing tick
    pub fn on_update(self, callback: impl FnMut(&TweenEvent<T>) + Send + 'static) -> Self {
        self.on(EventFlags::UPDATE, callback)
    }

    /// Fire when a loop boundary is crossed
    pub fn on_loop_completed(self, callback: impl FnMut(&TweenEvent<T>) + Send + 'static) -> Self {
        self.on(EventFlags::LOOP_COMPLETED, callback)
    }

    /// Fire when the process ends.
    ///
    /// Endings carry `COMPLETE` and `KILL` together, whether the clock
    /// ran out or [`Self::kill`] forced it, so this and
    /// [`Self::on_kill`] observe the same events.
    pub fn on_complete(self, callback: impl FnMut(&TweenEvent<T>) + Send + 'static) -> Self {
        self.on(EventFlags::COMPLETE, callback)
    }

    /// Fire when the process is paused
    pub fn on_pause(self, callback: impl FnMut(&TweenEvent<T>) + Send + 'static) -> Self {
        self.on(EventFlags::PAUSE, callback)
    }

    /// Fire when the process is resumed
    pub fn on_resume(self, callback: impl FnMut(&TweenEvent<T>) + Send + 'static) -> Self {
        self.on(EventFlags::RESUME, callback)
    }

    /// Fire when the process ends; see [`Self::on_complete`]
    pub fn on_kill(self, callback: impl FnMut(&TweenEvent<T>) + Send + 'static) -> Self {
        self.on(EventFlags::KILL, callback)
    }

    /// Pause the process
    pub fn pause(self) -> Self {
        let _ = self.engine.pause(self.id);
        self
    }

    /// Resume the process
    pub fn resume(self) -> Self {
        let _ = self.engine.resume(self.id);
        self
    }

    /// Flip the running direction
    pub fn invert(self) -> Self {
        let _ = self.engine.invert(self.id);
        self
    }

    /// Rewind to the start and run again
    pub fn restart(self) -> Self {
        let _ = self.engine.restart(self.id);
        self
    }

    /// Jump to `progress` immediately
    pub fn seek(self, progress: f32) -> Self {
        let _ = self.engine.seek(self.id, progress);
        self
    }

    /// Set the clock speed
    pub fn set_speed(self, speed: f32) -> Self {
        let _ = self.engine.set_speed(self.id, speed);
        self
    }

    /// Bound the number of loop crossings
    pub fn set_loop_limit(self, limit: i32) -> Self {
        let _ = self.engine.set_loop_limit(self.id, limit);
        self
    }

    /// Kill the process, ending the chain
    pub fn kill(self) -> bool {
        self.engine.kill(self.id)
    }

    /// Current clock progress
    #[inline]
    pub fn progress(&self) -> f32 {
        self.engine.progress(self.id).unwrap_or(0.0)
    }

    /// Current interpolated value
    #[inline]
    pub fn value(&self) -> T {
        self.engine.value::<T>(self.id).unwrap_or_default()
    }

    /// Current execution status
    #[inline]
    pub fn status(&self) -> ProcessStatus {
        self.engine.status(self.id).unwrap_or(ProcessStatus::Inactive)
    }

    /// Whether the process is still live
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.engine.is_alive(self.id)
    }
}
