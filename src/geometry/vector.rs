use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Index, Mul, MulAssign, Neg, Sub};

/// A point or direction in the field plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
}

impl Vector {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(&self, other: &Vector) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn length_squared(&self) -> f32 {
        self.dot(self)
    }

    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Returns the unit vector with the same direction, or the zero vector for zero length.
    pub fn normalized(&self) -> Vector {
        let length = self.length();
        if length == 0.0 {
            return Vector::default();
        }
        *self / length
    }

    /// Rotates the vector by -90 degrees.
    pub fn perpendicular(&self) -> Vector {
        Vector::new(self.y, -self.x)
    }

    pub fn distance(&self, other: &Vector) -> f32 {
        (*self - *other).length()
    }

    pub fn distance_squared(&self, other: &Vector) -> f32 {
        (*self - *other).length_squared()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f32) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs)
    }
}

impl MulAssign<f32> for Vector {
    fn mul_assign(&mut self, rhs: f32) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl Div<f32> for Vector {
    type Output = Vector;

    fn div(self, rhs: f32) -> Vector {
        Vector::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

/// Axis access used by the kd-tree, 0 is x and 1 is y.
impl Index<usize> for Vector {
    type Output = f32;

    fn index(&self, axis: usize) -> &f32 {
        match axis {
            0 => &self.x,
            1 => &self.y,
            _ => panic!("Vector axis {} out of range", axis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Vector::new(1.0, 2.0);
        let b = Vector::new(3.0, -1.0);
        assert_eq!(a + b, Vector::new(4.0, 1.0));
        assert_eq!(a - b, Vector::new(-2.0, 3.0));
        assert_eq!(a * 2.0, Vector::new(2.0, 4.0));
        assert_eq!(b / 2.0, Vector::new(1.5, -0.5));
        assert_eq!(a.dot(&b), 1.0);
        assert_eq!(-a, Vector::new(-1.0, -2.0));
    }

    #[test]
    fn length_and_normalization() {
        let v = Vector::new(3.0, 4.0);
        assert_eq!(v.length(), 5.0);
        assert_eq!(v.length_squared(), 25.0);
        let n = v.normalized();
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert_eq!(Vector::default().normalized(), Vector::default());
    }

    #[test]
    fn perpendicular_is_orthogonal() {
        let v = Vector::new(1.0, 2.0);
        assert_eq!(v.dot(&v.perpendicular()), 0.0);
        assert_eq!(Vector::new(1.0, 0.0).perpendicular(), Vector::new(0.0, -1.0));
    }

    #[test]
    fn axis_indexing() {
        let v = Vector::new(7.0, -3.0);
        assert_eq!(v[0], 7.0);
        assert_eq!(v[1], -3.0);
    }
}
