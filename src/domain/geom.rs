/// Plane geometry for world space.
///
/// `Vec2` is a continuous world position or velocity (sub-tile precision).
/// `IVec2` is an integer coordinate: a grid cell, a hitbox offset, or a
/// screen-space point handed to the canvas.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    pub fn len(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction. `None` for the zero vector.
    pub fn normalized(self) -> Option<Vec2> {
        let l = self.len();
        if l == 0.0 || !l.is_finite() {
            return None;
        }
        Some(Vec2::new(self.x / l, self.y / l))
    }

    /// Round toward negative infinity on both axes.
    pub fn floor(self) -> IVec2 {
        IVec2::new(self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Cell containing this point for cells of `size` world units.
    pub fn cell(self, size: i32) -> IVec2 {
        let s = size as f32;
        IVec2::new((self.x / s).floor() as i32, (self.y / s).floor() as i32)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x + o.x, self.y + o.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, o: Vec2) {
        self.x += o.x;
        self.y += o.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x - o.x, self.y - o.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl From<IVec2> for Vec2 {
    fn from(v: IVec2) -> Vec2 {
        Vec2::new(v.x as f32, v.y as f32)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IVec2 {
    pub x: i32,
    pub y: i32,
}

impl IVec2 {
    #[cfg(test)]
    pub const ZERO: IVec2 = IVec2 { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        IVec2 { x, y }
    }

    /// Componentwise halving, used for "center of the viewport".
    pub fn half(self) -> IVec2 {
        IVec2::new(self.x >> 1, self.y >> 1)
    }
}

impl Add for IVec2 {
    type Output = IVec2;
    fn add(self, o: IVec2) -> IVec2 {
        IVec2::new(self.x + o.x, self.y + o.y)
    }
}

impl Sub for IVec2 {
    type Output = IVec2;
    fn sub(self, o: IVec2) -> IVec2 {
        IVec2::new(self.x - o.x, self.y - o.y)
    }
}

impl Mul<i32> for IVec2 {
    type Output = IVec2;
    fn mul(self, s: i32) -> IVec2 {
        IVec2::new(self.x * s, self.y * s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_zero_is_none() {
        assert!(Vec2::ZERO.normalized().is_none());
    }

    #[test]
    fn normalized_has_unit_length() {
        let n = Vec2::new(3.0, -4.0).normalized().unwrap();
        assert!((n.len() - 1.0).abs() < 1e-6);
        assert!((n.x - 0.6).abs() < 1e-6);
        assert!((n.y + 0.8).abs() < 1e-6);
    }

    #[test]
    fn cell_floors_negative_coordinates() {
        // -0.5 is left of the map, not inside cell 0
        assert_eq!(Vec2::new(-0.5, 15.9).cell(16), IVec2::new(-1, 0));
        assert_eq!(Vec2::new(16.0, 31.99).cell(16), IVec2::new(1, 1));
    }

    #[test]
    fn half_shifts_right() {
        assert_eq!(IVec2::new(256, 241).half(), IVec2::new(128, 120));
    }
}
