use serde::{Deserialize, Serialize};

use crate::event::EventFlags;

/// Lifecycle state of a pooled process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProcessStatus {
    /// Slot is vacant or the process has not started
    #[default]
    Inactive,
    /// Process advances on every tick
    Running,
    /// Process holds its progress until resumed
    Paused,
    /// Process reached its terminal state
    Completed,
}

impl ProcessStatus {
    /// Get the name of this status
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    /// Check if the process advances on tick
    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Check if the process reached a terminal state
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Check if the process can be paused
    #[inline]
    pub fn can_pause(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Check if the process can be resumed
    #[inline]
    pub fn can_resume(&self) -> bool {
        matches!(self, Self::Paused)
    }
}

impl From<&str> for ProcessStatus {
    fn from(s: &str) -> Self {
        match s {
            "running" => Self::Running,
            "paused" => Self::Paused,
            "completed" => Self::Completed,
            _ => Self::Inactive,
        }
    }
}

/// Per-process execution bookkeeping read by the scheduler.
///
/// `passive` holds the event kinds with at least one registered listener;
/// `active` is recomputed every tick as the kinds that actually fired.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExecutionContext {
    pub status: ProcessStatus,
    pub active: EventFlags,
    pub passive: EventFlags,
    pub progress: f32,
    pub started: bool,
}

impl ExecutionContext {
    /// Fresh context for a newly spawned process
    pub fn running() -> Self {
        Self {
            status: ProcessStatus::Running,
            ..Self::default()
        }
    }

    /// Clear everything back to the vacant-slot state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
