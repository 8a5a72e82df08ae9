use crate::error::{Error, Result};
use crate::geometry::{LineSegment, Vector};
use crate::obstacles::AnalyticObstacle;
use serde::{Deserialize, Serialize};

/// A line segment inflated by `width` in every direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapsuleObstacle {
    segment: LineSegment,
    width: f32,
}

impl CapsuleObstacle {
    /// Constructs a capsule around the segment from `p1` to `p2`.
    ///
    /// Fails with `Error::InvalidGeometry` if both points coincide.
    pub fn new(p1: Vector, p2: Vector, width: f32) -> Result<Self> {
        if !width.is_finite() || width < 0.0 {
            return Err(Error::InvalidGeometry(format!("capsule width {}", width)));
        }
        Ok(Self {
            segment: LineSegment::new(p1, p2)?,
            width,
        })
    }

    pub fn segment(&self) -> &LineSegment {
        &self.segment
    }

    pub fn width(&self) -> f32 {
        self.width
    }
}

impl AnalyticObstacle for CapsuleObstacle {
    fn distance(&self, point: Vector) -> f32 {
        self.segment.distance(point) - self.width
    }

    fn distance_to_segment(&self, segment: &LineSegment) -> f32 {
        segment.segment_distance(&self.segment) - self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capsule() -> CapsuleObstacle {
        CapsuleObstacle::new(Vector::new(-1.0, 0.0), Vector::new(1.0, 0.0), 0.2).unwrap()
    }

    #[test]
    fn zero_length_is_rejected() {
        let p = Vector::new(0.5, 0.5);
        assert!(matches!(
            CapsuleObstacle::new(p, p, 0.1),
            Err(Error::InvalidGeometry(_))
        ));
    }

    #[test]
    fn distance_around_caps() {
        let c = capsule();
        assert!((c.distance(Vector::new(0.0, 1.0)) - 0.8).abs() < 1e-6);
        assert!((c.distance(Vector::new(2.0, 0.0)) - 0.8).abs() < 1e-6);
        assert!((c.distance(Vector::new(0.0, 0.1)) + 0.1).abs() < 1e-6);
    }

    #[test]
    fn crossing_segment_collides() {
        let c = capsule();
        let crossing = LineSegment::new(Vector::new(0.0, -2.0), Vector::new(0.0, 2.0)).unwrap();
        assert!((c.distance_to_segment(&crossing) + 0.2).abs() < 1e-6);
        let parallel = LineSegment::new(Vector::new(-1.0, 1.0), Vector::new(1.0, 1.0)).unwrap();
        assert!((c.distance_to_segment(&parallel) - 0.8).abs() < 1e-6);
    }
}
