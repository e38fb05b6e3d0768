//! Error types for the tween engine

use serde::{Deserialize, Serialize};

/// Comprehensive error type for tween operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TweenError {
    /// Stale or foreign process handle
    #[error("Invalid process handle: slot {slot} pool {pool} version {version}")]
    InvalidHandle { slot: u32, pool: u32, version: u32 },

    /// A fixed-capacity pool has no free slot left
    #[error("Pool capacity exhausted: {lane} lane is full at {capacity} slots")]
    Capacity { lane: String, capacity: usize },

    /// A graph mutation would break contiguous coverage
    #[error("Invalid graph range: {reason}")]
    InvalidRange { reason: String },

    /// Easing function not found
    #[error("Easing function not found: {name}")]
    EasingNotFound { name: String },

    /// Function graph not found
    #[error("Function graph not found: {id}")]
    GraphNotFound { id: u32 },

    /// Group not found
    #[error("Group not found: {name}")]
    GroupNotFound { name: String },

    /// Group name already taken
    #[error("Group already exists: {name}")]
    DuplicateGroup { name: String },

    /// Motion asset not found
    #[error("Motion asset not found: {id}")]
    AssetNotFound { id: String },

    /// Invalid value
    #[error("Invalid value: {reason}")]
    InvalidValue { reason: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Generic tween error
    #[error("Tween error: {message}")]
    Generic { message: String },
}

impl TweenError {
    /// Create a new generic error
    pub fn new(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidHandle { .. }
                | Self::Capacity { .. }
                | Self::InvalidRange { .. }
                | Self::EasingNotFound { .. }
                | Self::GroupNotFound { .. }
                | Self::DuplicateGroup { .. }
                | Self::AssetNotFound { .. }
        )
    }

    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidHandle { .. } => "handle",
            Self::Capacity { .. } => "capacity",
            Self::InvalidRange { .. } | Self::InvalidValue { .. } => "validation",
            Self::EasingNotFound { .. } | Self::GraphNotFound { .. } => "easing",
            Self::GroupNotFound { .. } | Self::DuplicateGroup { .. } => "group",
            Self::AssetNotFound { .. } => "asset",
            Self::SerializationError { .. } => "serialization",
            Self::Generic { .. } => "generic",
        }
    }
}

impl From<serde_json::Error> for TweenError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            reason: err.to_string(),
        }
    }
}

impl From<bincode::Error> for TweenError {
    fn from(err: bincode::Error) -> Self {
        Self::SerializationError {
            reason: err.to_string(),
        }
    }
}
