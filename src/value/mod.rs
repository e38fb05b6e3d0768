//! Value types the engine can interpolate.
//!
//! Every pooled value type implements [`Tweenable`], which exposes the
//! per-axis view the scheduler blends through. Axis selection is carried
//! by an [`AxisMask`]; unmasked axes keep their start value.

pub mod vector2;
pub mod vector3;
pub mod vector4;

pub use vector2::Vector2;
pub use vector3::Vector3;
pub use vector4::Vector4;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Widest axis count any pooled value type carries
pub const MAX_AXES: usize = 4;

bitflags! {
    /// Per-axis animation mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AxisMask: u8 {
        const X = 1;
        const Y = 1 << 1;
        const Z = 1 << 2;
        const W = 1 << 3;
    }
}

impl AxisMask {
    /// Mask selecting the first `axes` axes
    #[inline]
    pub fn for_axes(axes: usize) -> Self {
        let bits = if axes >= MAX_AXES {
            Self::all().bits()
        } else {
            (1u8 << axes) - 1
        };
        Self::from_bits_truncate(bits)
    }

    /// Check whether axis `index` is selected
    #[inline]
    pub fn contains_axis(&self, index: usize) -> bool {
        index < MAX_AXES && self.bits() & (1 << index) != 0
    }
}

impl Default for AxisMask {
    fn default() -> Self {
        Self::all()
    }
}

/// A fixed-axis value the scheduler can blend between two endpoints.
pub trait Tweenable: Copy + Clone + Default + PartialEq + Send + Sync + 'static {
    /// Number of animatable axes carried by this type
    const AXES: usize;

    /// Read axis `index`
    fn axis(&self, index: usize) -> f32;

    /// Write axis `index`
    fn set_axis(&mut self, index: usize, value: f32);

    /// Uniform linear blend between `start` and `end`
    #[inline]
    fn lerp(start: Self, end: Self, t: f32) -> Self {
        let mut out = start;
        for i in 0..Self::AXES {
            let a = start.axis(i);
            let b = end.axis(i);
            out.set_axis(i, a + (b - a) * t);
        }
        out
    }

    /// Per-axis blend under a mask; unmasked axes keep the start value
    #[inline]
    fn lerp_masked(start: Self, end: Self, eased: &[f32; MAX_AXES], mask: AxisMask) -> Self {
        let mut out = start;
        for i in 0..Self::AXES {
            if mask.contains_axis(i) {
                let a = start.axis(i);
                let b = end.axis(i);
                out.set_axis(i, a + (b - a) * eased[i]);
            }
        }
        out
    }

    /// Component-wise difference `self - origin`
    fn offset_from(&self, origin: Self) -> Self {
        let mut out = *self;
        for i in 0..Self::AXES {
            out.set_axis(i, self.axis(i) - origin.axis(i));
        }
        out
    }

    /// Component-wise sum `self + offset`
    fn offset_by(&self, offset: Self) -> Self {
        let mut out = *self;
        for i in 0..Self::AXES {
            out.set_axis(i, self.axis(i) + offset.axis(i));
        }
        out
    }
}

impl Tweenable for f32 {
    const AXES: usize = 1;

    #[inline]
    fn axis(&self, _index: usize) -> f32 {
        *self
    }

    #[inline]
    fn set_axis(&mut self, _index: usize, value: f32) {
        *self = value;
    }
}
