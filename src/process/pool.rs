//! Stable-slot process pools with versioned handles.
//!
//! Slots never move: releasing a slot bumps its version and pushes the
//! index onto a free list, so live handles stay valid and stale handles
//! are rejected by the version check instead of touching a new occupant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::easing::EasePlan;
use crate::error::TweenError;
use crate::process::status::ExecutionContext;
use crate::time::Clock;
use crate::value::{AxisMask, Tweenable};

/// Versioned handle to a pooled process.
///
/// `slot` indexes into the owning pool, `pool` identifies which
/// type-segregated pool that is, and `version` stamps the occupancy. No
/// two simultaneously live processes share a `(slot, pool)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId {
    slot: u32,
    pool: u32,
    version: u32,
}

impl ProcessId {
    pub(crate) fn new(slot: u32, pool: u32, version: u32) -> Self {
        Self {
            slot,
            pool,
            version,
        }
    }

    /// Slot index inside the owning pool
    #[inline]
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Identifier of the owning pool
    #[inline]
    pub fn pool(&self) -> u32 {
        self.pool
    }

    /// Occupancy stamp; a slot reuse invalidates older stamps
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}s{}v{}", self.pool, self.slot, self.version)
    }
}

/// Storage for one pooled process
#[derive(Debug, Clone)]
pub(crate) struct ProcessSlot<T: Tweenable> {
    pub start: T,
    pub end: T,
    pub current: T,
    pub clock: Clock,
    pub plan: EasePlan,
    pub mask: AxisMask,
    pub ctx: ExecutionContext,
    pub version: u32,
    pub occupied: bool,
}

impl<T: Tweenable> Default for ProcessSlot<T> {
    fn default() -> Self {
        Self {
            start: T::default(),
            end: T::default(),
            current: T::default(),
            clock: Clock::default(),
            plan: EasePlan::default(),
            mask: AxisMask::all(),
            ctx: ExecutionContext::default(),
            version: 0,
            occupied: false,
        }
    }
}

impl<T: Tweenable> ProcessSlot<T> {
    /// Clear the payload, keeping the version stamp for the next occupant
    fn vacate(&mut self) {
        let version = self.version;
        *self = Self::default();
        self.version = version;
    }
}

/// Fixed-capacity slot pool with free-list recycling
#[derive(Debug, Clone)]
pub struct ProcessPool<T: Tweenable> {
    pool_id: u32,
    lane: &'static str,
    slots: Vec<ProcessSlot<T>>,
    free: Vec<u32>,
    live: usize,
    growable: bool,
}

impl<T: Tweenable> ProcessPool<T> {
    /// Create a pool with `capacity` pre-allocated slots.
    /// A non-growable pool reports `Capacity` once every slot is live.
    pub fn new(pool_id: u32, lane: &'static str, capacity: usize, growable: bool) -> Self {
        let capacity = capacity.max(1);
        let slots = (0..capacity).map(|_| ProcessSlot::default()).collect();
        let free = (0..capacity as u32).rev().collect();
        Self {
            pool_id,
            lane,
            slots,
            free,
            live: 0,
            growable,
        }
    }

    /// Identifier shared by every handle this pool issues
    #[inline]
    pub fn pool_id(&self) -> u32 {
        self.pool_id
    }

    /// Number of live processes
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    /// Total slot count, live or vacant
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Occupy a free slot with a new process
    pub(crate) fn spawn(
        &mut self,
        start: T,
        end: T,
        clock: Clock,
        plan: EasePlan,
        mask: AxisMask,
    ) -> Result<ProcessId, TweenError> {
        let index = match self.free.pop() {
            Some(index) => index,
            None if self.growable => {
                self.slots.push(ProcessSlot::default());
                (self.slots.len() - 1) as u32
            }
            None => {
                return Err(TweenError::Capacity {
                    lane: self.lane.to_string(),
                    capacity: self.slots.len(),
                })
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.start = start;
        slot.end = end;
        slot.current = start;
        slot.clock = clock;
        slot.plan = plan;
        slot.mask = mask;
        slot.ctx = ExecutionContext::running();
        slot.ctx.progress = slot.clock.progress();
        slot.occupied = true;
        self.live += 1;
        Ok(ProcessId::new(index, self.pool_id, slot.version))
    }

    fn check(&self, id: ProcessId) -> Result<u32, TweenError> {
        let stale = TweenError::InvalidHandle {
            slot: id.slot(),
            pool: id.pool(),
            version: id.version(),
        };
        if id.pool() != self.pool_id {
            return Err(stale);
        }
        match self.slots.get(id.slot() as usize) {
            Some(slot) if slot.occupied && slot.version == id.version() => Ok(id.slot()),
            _ => Err(stale),
        }
    }

    /// Resolve a handle, rejecting stale or foreign ids
    pub(crate) fn get(&self, id: ProcessId) -> Result<&ProcessSlot<T>, TweenError> {
        let index = self.check(id)?;
        Ok(&self.slots[index as usize])
    }

    /// Mutable handle resolution with the same staleness rules
    pub(crate) fn get_mut(&mut self, id: ProcessId) -> Result<&mut ProcessSlot<T>, TweenError> {
        let index = self.check(id)?;
        Ok(&mut self.slots[index as usize])
    }

    /// Whether the handle refers to a live process
    #[inline]
    pub fn contains(&self, id: ProcessId) -> bool {
        self.check(id).is_ok()
    }

    /// Release by handle; returns false when the handle is already dead
    pub(crate) fn release(&mut self, id: ProcessId) -> bool {
        match self.check(id) {
            Ok(index) => {
                self.release_slot(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Release an occupied slot: vacate, bump the version, recycle.
    /// Releasing a vacant slot is a no-op.
    pub(crate) fn release_slot(&mut self, index: u32) {
        let Some(slot) = self.slots.get_mut(index as usize) else {
            return;
        };
        if !slot.occupied {
            return;
        }
        slot.vacate();
        slot.version = slot.version.wrapping_add(1);
        self.free.push(index);
        self.live = self.live.saturating_sub(1);
    }

    /// Iterate occupied slots with their indices
    pub(crate) fn iter_occupied_mut(
        &mut self,
    ) -> impl Iterator<Item = (u32, &mut ProcessSlot<T>)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.occupied)
            .map(|(index, slot)| (index as u32, slot))
    }
}
