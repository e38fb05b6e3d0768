//! Persisted motion assets.
//!
//! A [`MotionAsset`] is the on-disk description of a coordinated motion:
//! one channel per transform property, each carrying its own range,
//! duration, easing, and loop behavior. Assets round-trip through JSON
//! for authoring and bincode for compact transfer, and are instantiated
//! into live processes by the engine.

use serde::{Deserialize, Serialize};

use crate::easing::FunctionGraph;
use crate::error::TweenError;
use crate::time::{validate_duration, TimeControl};
use crate::value::{AxisMask, Vector3};

/// Transform property a channel drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    Position,
    Rotation,
    Scale,
}

impl PropertyKind {
    /// Get the property name as a string
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Rotation => "rotation",
            Self::Scale => "scale",
        }
    }
}

/// How a channel's target value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValueMode {
    /// Target is the destination value
    #[default]
    Absolute,
    /// Target is a delta added to the start value
    Relative,
}

/// Easing description persisted with a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelEase {
    /// A registered easing function, looked up by name at instantiation
    Named(String),
    /// One optional curve per axis; axes left empty ease linearly
    PerAxis(Box<[Option<FunctionGraph>; 3]>),
}

impl Default for ChannelEase {
    fn default() -> Self {
        Self::Named("linear".to_string())
    }
}

fn default_loop_limit() -> i32 {
    -1
}

/// One property channel of a motion asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Property this channel drives
    pub property: PropertyKind,
    /// Duration of one traversal in seconds
    pub duration: f32,
    /// Value at progress zero
    pub start: Vector3,
    /// Destination value, or delta when `value_mode` is relative
    pub target: Vector3,
    /// How `target` is interpreted
    #[serde(default)]
    pub value_mode: ValueMode,
    /// Axes this channel writes
    #[serde(default)]
    pub mask: AxisMask,
    /// Boundary behavior
    #[serde(default)]
    pub time_control: TimeControl,
    /// Loop count bound, negative for unlimited
    #[serde(default = "default_loop_limit")]
    pub loop_limit: i32,
    /// Easing applied to the channel
    #[serde(default)]
    pub ease: ChannelEase,
}

impl ChannelSpec {
    /// Create a new channel with default easing and full axis mask
    pub fn new(property: PropertyKind, duration: f32, start: Vector3, target: Vector3) -> Self {
        Self {
            property,
            duration,
            start,
            target,
            value_mode: ValueMode::default(),
            mask: AxisMask::default(),
            time_control: TimeControl::default(),
            loop_limit: default_loop_limit(),
            ease: ChannelEase::default(),
        }
    }

    /// Set the value mode
    #[inline]
    pub fn with_value_mode(mut self, mode: ValueMode) -> Self {
        self.value_mode = mode;
        self
    }

    /// Set the axis mask
    #[inline]
    pub fn with_mask(mut self, mask: AxisMask) -> Self {
        self.mask = mask;
        self
    }

    /// Set the time control mode
    #[inline]
    pub fn with_time_control(mut self, time_control: TimeControl) -> Self {
        self.time_control = time_control;
        self
    }

    /// Set the loop limit
    #[inline]
    pub fn with_loop_limit(mut self, limit: i32) -> Self {
        self.loop_limit = limit;
        self
    }

    /// Set a named easing function
    #[inline]
    pub fn with_named_ease(mut self, name: impl Into<String>) -> Self {
        self.ease = ChannelEase::Named(name.into());
        self
    }

    /// Set per-axis easing curves
    #[inline]
    pub fn with_axis_curves(mut self, curves: [Option<FunctionGraph>; 3]) -> Self {
        self.ease = ChannelEase::PerAxis(Box::new(curves));
        self
    }

    /// Validate the channel
    pub fn validate(&self) -> Result<(), TweenError> {
        validate_duration(self.duration)?;

        if self.mask.is_empty() {
            return Err(TweenError::InvalidValue {
                reason: format!("Channel '{}' writes no axes", self.property.name()),
            });
        }

        if let ChannelEase::Named(name) = &self.ease {
            if name.is_empty() {
                return Err(TweenError::InvalidValue {
                    reason: "Easing name must not be empty".to_string(),
                });
            }
        }

        if let ChannelEase::PerAxis(curves) = &self.ease {
            for graph in curves.iter().flatten() {
                graph.validate()?;
            }
        }

        Ok(())
    }
}

/// A named collection of property channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionAsset {
    /// Asset name, used as the prefix of registered asset ids
    pub name: String,
    /// Property channels, applied together at instantiation
    pub channels: Vec<ChannelSpec>,
}

impl MotionAsset {
    /// Create a new empty asset
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: Vec::new(),
        }
    }

    /// Add a channel
    #[inline]
    pub fn with_channel(mut self, channel: ChannelSpec) -> Self {
        self.channels.push(channel);
        self
    }

    /// Validate the asset and every channel in it
    pub fn validate(&self) -> Result<(), TweenError> {
        if self.name.is_empty() {
            return Err(TweenError::InvalidValue {
                reason: "Asset name must not be empty".to_string(),
            });
        }

        if self.channels.is_empty() {
            return Err(TweenError::InvalidValue {
                reason: format!("Asset '{}' has no channels", self.name),
            });
        }

        for channel in &self.channels {
            channel.validate()?;
        }

        Ok(())
    }

    /// Load an asset from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, TweenError> {
        let asset: Self = serde_json::from_str(json)?;
        asset.validate()?;
        Ok(asset)
    }

    /// Serialize the asset to a JSON string
    pub fn to_json_string(&self) -> Result<String, TweenError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize the asset to compact bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, TweenError> {
        Ok(bincode::serialize(self)?)
    }

    /// Load an asset from compact bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TweenError> {
        let asset: Self = bincode::deserialize(bytes)?;
        asset.validate()?;
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_asset() -> MotionAsset {
        MotionAsset::new("slide-in")
            .with_channel(
                ChannelSpec::new(
                    PropertyKind::Position,
                    0.5,
                    Vector3::zero(),
                    Vector3::new(4.0, 0.0, 0.0),
                )
                .with_named_ease("in-out-quad")
                .with_mask(AxisMask::X | AxisMask::Y),
            )
            .with_channel(
                ChannelSpec::new(PropertyKind::Scale, 0.25, Vector3::one(), Vector3::splat(2.0))
                    .with_value_mode(ValueMode::Relative)
                    .with_time_control(TimeControl::PingPong)
                    .with_loop_limit(3),
            )
    }

    #[test]
    fn test_asset_validation() {
        let asset = create_test_asset();
        assert!(asset.validate().is_ok());

        let empty = MotionAsset::new("empty");
        assert!(empty.validate().is_err());

        let unnamed = MotionAsset::new("").with_channel(ChannelSpec::new(
            PropertyKind::Position,
            1.0,
            Vector3::zero(),
            Vector3::one(),
        ));
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn test_channel_validation() {
        let mut channel = ChannelSpec::new(
            PropertyKind::Rotation,
            1.0,
            Vector3::zero(),
            Vector3::one(),
        );
        assert!(channel.validate().is_ok());

        channel.duration = f32::NAN;
        assert!(channel.validate().is_err());

        channel.duration = 1.0;
        channel.mask = AxisMask::empty();
        assert!(channel.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let asset = create_test_asset();
        let json = asset.to_json_string().unwrap();
        let restored = MotionAsset::from_json_str(&json).unwrap();
        assert_eq!(asset, restored);
    }

    #[test]
    fn test_json_defaults_fill_omitted_fields() {
        let json = r#"
        {
          "name": "nudge",
          "channels": [
            {
              "property": "Position",
              "duration": 1.0,
              "start": { "x": 0.0, "y": 0.0, "z": 0.0 },
              "target": { "x": 1.0, "y": 0.0, "z": 0.0 }
            }
          ]
        }
        "#;

        let asset = MotionAsset::from_json_str(json).unwrap();
        let channel = &asset.channels[0];
        assert_eq!(channel.value_mode, ValueMode::Absolute);
        assert_eq!(channel.mask, AxisMask::all());
        assert_eq!(channel.time_control, TimeControl::PlayOnce);
        assert_eq!(channel.loop_limit, -1);
        assert_eq!(channel.ease, ChannelEase::Named("linear".to_string()));
    }

    #[test]
    fn test_binary_round_trip() {
        let asset = create_test_asset();
        let bytes = asset.to_bytes().unwrap();
        let restored = MotionAsset::from_bytes(&bytes).unwrap();
        assert_eq!(asset, restored);
    }

    #[test]
    fn test_per_axis_curves_validated() {
        let bad = FunctionGraph::from_segments(vec![]);
        assert!(bad.is_err());

        let channel = ChannelSpec::new(
            PropertyKind::Position,
            1.0,
            Vector3::zero(),
            Vector3::one(),
        )
        .with_axis_curves([Some(FunctionGraph::linear()), None, None]);
        assert!(channel.validate().is_ok());
    }
}
