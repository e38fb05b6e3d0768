//! Event flags and per-process callback storage.
//!
//! Callbacks are boxed closures held outside the process slots so the
//! hot tick loop never touches them. Each entry may carry a liveness
//! token: when the owning [`OwnerHandle`] drops, the entry is skipped and
//! discarded on the next invocation pass instead of firing into freed
//! state.

use std::sync::{Arc, Weak};

use bitflags::bitflags;

use crate::process::pool::ProcessId;
use crate::value::Tweenable;

bitflags! {
    /// Process lifecycle events a listener can subscribe to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventFlags: u8 {
        /// First advancing tick of a run
        const START = 1;
        /// Every advancing tick
        const UPDATE = 1 << 1;
        /// A loop boundary was crossed
        const LOOP_COMPLETED = 1 << 2;
        /// The process ended; always paired with `KILL`
        const COMPLETE = 1 << 3;
        /// The process was paused
        const PAUSE = 1 << 4;
        /// The process was resumed
        const RESUME = 1 << 5;
        /// The process ended; always paired with `COMPLETE`
        const KILL = 1 << 6;
    }
}

/// Liveness token for callback owners.
///
/// Hold one alongside the state a callback captures by reference-counted
/// pointer; registrations made with it stop firing once it drops.
#[derive(Debug, Clone, Default)]
pub struct OwnerHandle {
    token: Arc<()>,
}

impl OwnerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn watch(&self) -> Weak<()> {
        Arc::downgrade(&self.token)
    }
}

/// Snapshot handed to callbacks when events fire
#[derive(Debug, Clone, Copy)]
pub struct TweenEvent<T: Tweenable> {
    /// Handle of the process that fired
    pub id: ProcessId,
    /// Every event kind that fired this tick
    pub flags: EventFlags,
    /// Clock progress at dispatch time
    pub progress: f32,
    /// Interpolated value at dispatch time
    pub value: T,
}

type BoxedCallback<T> = Box<dyn FnMut(&TweenEvent<T>) + Send>;

struct CallbackEntry<T: Tweenable> {
    flags: EventFlags,
    token: Option<Weak<()>>,
    callback: BoxedCallback<T>,
}

/// Ordered callback list for one process slot
struct CallbackSet<T: Tweenable> {
    entries: Vec<CallbackEntry<T>>,
}

impl<T: Tweenable> CallbackSet<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

/// Tally of one dispatch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchTally {
    /// Callbacks actually invoked
    pub invoked: u64,
    /// Entries discarded because their owner token died
    pub dead_dropped: u64,
}

/// Slot-indexed callback storage with free-pool reuse.
///
/// Emptied sets return to a spare pool instead of being dropped, so
/// steady-state register/unregister churn stops allocating once the pool
/// warms up.
pub struct CallbackRegistry<T: Tweenable> {
    sets: Vec<Option<Box<CallbackSet<T>>>>,
    spare: Vec<Box<CallbackSet<T>>>,
    max_spare: usize,
}

impl<T: Tweenable> Default for CallbackRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Tweenable> CallbackRegistry<T> {
    pub fn new() -> Self {
        Self {
            sets: Vec::new(),
            spare: Vec::new(),
            max_spare: 64,
        }
    }

    fn set_for(&mut self, slot: u32) -> &mut CallbackSet<T> {
        let index = slot as usize;
        if index >= self.sets.len() {
            self.sets.resize_with(index + 1, || None);
        }
        self.sets[index]
            .get_or_insert_with(|| self.spare.pop().unwrap_or_else(|| Box::new(CallbackSet::new())))
    }

    /// Append a callback listening for `flags` on `slot`
    pub fn register(
        &mut self,
        slot: u32,
        flags: EventFlags,
        token: Option<Weak<()>>,
        callback: impl FnMut(&TweenEvent<T>) + Send + 'static,
    ) {
        self.set_for(slot).entries.push(CallbackEntry {
            flags,
            token,
            callback: Box::new(callback),
        });
    }

    /// Union of flags any registered entry listens for on `slot`
    pub fn passive_flags(&self, slot: u32) -> EventFlags {
        match self.sets.get(slot as usize).and_then(|s| s.as_ref()) {
            Some(set) => set
                .entries
                .iter()
                .fold(EventFlags::empty(), |acc, e| acc | e.flags),
            None => EventFlags::empty(),
        }
    }

    /// Whether any entry is registered on `slot`
    pub fn has_listeners(&self, slot: u32) -> bool {
        self.sets
            .get(slot as usize)
            .and_then(|s| s.as_ref())
            .is_some_and(|set| !set.entries.is_empty())
    }

    /// Invoke entries matching the event's flags, in registration order.
    /// Entries whose owner token died are dropped without firing.
    pub fn invoke(&mut self, event: &TweenEvent<T>) -> DispatchTally {
        let mut tally = DispatchTally::default();
        let Some(Some(set)) = self.sets.get_mut(event.id.slot() as usize) else {
            return tally;
        };
        set.entries.retain_mut(|entry| {
            if let Some(token) = &entry.token {
                if token.strong_count() == 0 {
                    tally.dead_dropped += 1;
                    return false;
                }
            }
            if entry.flags.intersects(event.flags) {
                (entry.callback)(event);
                tally.invoked += 1;
            }
            true
        });
        tally
    }

    /// Drop every registration on `slot`, recycling the set.
    /// Returns true when anything was registered.
    pub fn unregister_all(&mut self, slot: u32) -> bool {
        let Some(entry) = self.sets.get_mut(slot as usize) else {
            return false;
        };
        let Some(mut set) = entry.take() else {
            return false;
        };
        let had_entries = !set.entries.is_empty();
        set.entries.clear();
        if self.spare.len() < self.max_spare {
            self.spare.push(set);
        }
        had_entries
    }

    /// Number of recycled sets waiting for reuse
    #[cfg(test)]
    fn spare_len(&self) -> usize {
        self.spare.len()
    }
}
