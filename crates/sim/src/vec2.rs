//! 2D vector math used by all kinematics.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Immutable pair of reals. Screen coordinates: +x right, +y down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn magnitude(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s)
    }

    /// Unit vector in the same direction.
    ///
    /// The zero vector has no direction and normalizes to itself.
    pub fn normalize(self) -> Self {
        let m = self.magnitude();
        if m == 0.0 {
            Self::ZERO
        } else {
            Self::new(self.x / m, self.y / m)
        }
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).magnitude()
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        self.scale(rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<[f64; 2]> for Vec2 {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Vec2> for [f64; 2] {
    fn from(v: Vec2) -> Self {
        [v.x, v.y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_scale() {
        let v = Vec2::new(1.0, 2.0) + Vec2::new(0.5, -4.0);
        assert_eq!(v, Vec2::new(1.5, -2.0));
        assert_eq!(v.scale(2.0), Vec2::new(3.0, -4.0));
        assert_eq!(-v, Vec2::new(-1.5, 2.0));
    }

    #[test]
    fn test_magnitude_and_normalize() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.magnitude(), 5.0);

        let n = v.normalize();
        assert!((n.magnitude() - 1.0).abs() < 1e-12);
        assert_eq!(n, Vec2::new(0.6, 0.8));
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }
}
