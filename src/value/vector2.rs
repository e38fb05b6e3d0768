use crate::value::Tweenable;
use nalgebra::Vector2 as NVector2;
use serde::{Deserialize, Serialize};

/// 2D vector type
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn one() -> Self {
        Self::new(1.0, 1.0)
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::zero()
        }
    }
}

impl Tweenable for Vector2 {
    const AXES: usize = 2;

    #[inline]
    fn axis(&self, index: usize) -> f32 {
        match index {
            0 => self.x,
            _ => self.y,
        }
    }

    #[inline]
    fn set_axis(&mut self, index: usize, value: f32) {
        match index {
            0 => self.x = value,
            _ => self.y = value,
        }
    }
}

impl From<NVector2<f32>> for Vector2 {
    fn from(v: NVector2<f32>) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Vector2> for NVector2<f32> {
    fn from(v: Vector2) -> Self {
        NVector2::new(v.x, v.y)
    }
}

impl std::ops::Add for Vector2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::AddAssign for Vector2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl std::ops::Sub for Vector2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Mul<f32> for Vector2 {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}
