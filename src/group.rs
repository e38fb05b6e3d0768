//! Driver-relative process groups.
//!
//! A group binds arbitrary sinks to one driving process. Each member
//! records a fixed offset from the group origin when it joins, and every
//! update fans the driver's value out to all members shifted by their
//! offsets. Membership changes are buffered and settle at the next
//! update, so callbacks may add or remove members mid-dispatch without
//! invalidating the member list being walked.

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::process::pool::ProcessId;
use crate::value::Tweenable;

/// Threading preference for member fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThreadHint {
    /// Use the thread pool once the group is large enough
    #[default]
    Auto,
    /// Always fan out on the calling thread
    Sequential,
    /// Always fan out on the thread pool
    Parallel,
}

impl ThreadHint {
    /// Get the hint name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ThreadHint::Auto => "auto",
            ThreadHint::Sequential => "sequential",
            ThreadHint::Parallel => "parallel",
        }
    }
}

/// Identifier for a group member, unique within its group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Destination a member's shifted value is written to each update
pub type GroupSink<T> = Box<dyn FnMut(T) + Send>;

struct GroupMember<T: Tweenable> {
    id: MemberId,
    offset: T,
    sink: GroupSink<T>,
}

enum PendingOp<T: Tweenable> {
    Add {
        id: MemberId,
        value: T,
        sink: GroupSink<T>,
    },
    Remove(MemberId),
}

/// Fan-out state for one driver process
pub struct GroupController<T: Tweenable> {
    name: String,
    driver: ProcessId,
    origin: T,
    hint: ThreadHint,
    members: Vec<GroupMember<T>>,
    pending: Vec<PendingOp<T>>,
    next_member: u64,
    enabled: bool,
}

impl<T: Tweenable> GroupController<T> {
    pub(crate) fn new(name: impl Into<String>, driver: ProcessId, origin: T, hint: ThreadHint) -> Self {
        Self {
            name: name.into(),
            driver,
            origin,
            hint,
            members: Vec::new(),
            pending: Vec::new(),
            next_member: 0,
            enabled: true,
        }
    }

    /// Get the group name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the driving process handle
    #[inline]
    pub fn driver(&self) -> ProcessId {
        self.driver
    }

    /// Get the value member offsets are measured from
    #[inline]
    pub fn origin(&self) -> T {
        self.origin
    }

    /// Get the threading preference
    #[inline]
    pub fn hint(&self) -> ThreadHint {
        self.hint
    }

    /// Number of settled members
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no settled members
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether fan-out is currently running
    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable fan-out without touching membership
    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Queue a member for addition at the next update.
    /// `value` is the member's value at join time; its offset from the
    /// group origin stays fixed for the member's lifetime.
    pub(crate) fn queue_add(&mut self, value: T, sink: GroupSink<T>) -> MemberId {
        let id = MemberId(self.next_member);
        self.next_member += 1;
        self.pending.push(PendingOp::Add { id, value, sink });
        id
    }

    /// Queue a member for removal at the next update.
    /// Unknown ids settle as a no-op.
    pub(crate) fn queue_remove(&mut self, member: MemberId) {
        self.pending.push(PendingOp::Remove(member));
    }

    /// Settle queued membership changes, in queue order
    pub(crate) fn flush(&mut self) {
        for op in self.pending.drain(..) {
            match op {
                PendingOp::Add { id, value, sink } => {
                    let offset = value.offset_from(self.origin);
                    self.members.push(GroupMember { id, offset, sink });
                }
                PendingOp::Remove(member) => {
                    self.members.retain(|m| m.id != member);
                }
            }
        }
    }

    /// Push the driver's value to every member, shifted by its offset
    pub(crate) fn apply(&mut self, driven: T, parallel_threshold: usize) {
        if !self.enabled || self.members.is_empty() {
            return;
        }
        let parallel = match self.hint {
            ThreadHint::Sequential => false,
            ThreadHint::Parallel => true,
            ThreadHint::Auto => self.members.len() >= parallel_threshold,
        };
        if parallel {
            self.members.par_iter_mut().for_each(|member| {
                (member.sink)(driven.offset_by(member.offset));
            });
        } else {
            for member in &mut self.members {
                (member.sink)(driven.offset_by(member.offset));
            }
        }
    }
}

impl<T: Tweenable> fmt::Debug for GroupController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupController")
            .field("name", &self.name)
            .field("driver", &self.driver)
            .field("hint", &self.hint)
            .field("members", &self.members.len())
            .field("pending", &self.pending.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}
