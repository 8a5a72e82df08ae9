use crate::error::{Error, Result};
use crate::geometry::{LineSegment, Vector};
use crate::obstacles::AnalyticObstacle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleObstacle {
    center: Vector,
    radius: f32,
}

impl CircleObstacle {
    pub fn new(center: Vector, radius: f32) -> Result<Self> {
        if !center.is_finite() || !radius.is_finite() || radius < 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "circle at ({}, {}) with radius {}",
                center.x, center.y, radius
            )));
        }
        Ok(Self { center, radius })
    }

    pub fn center(&self) -> Vector {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl AnalyticObstacle for CircleObstacle {
    fn distance(&self, point: Vector) -> f32 {
        point.distance(&self.center) - self.radius
    }

    fn distance_to_segment(&self, segment: &LineSegment) -> f32 {
        segment.distance(self.center) - self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_distance_is_signed() {
        let circle = CircleObstacle::new(Vector::new(0.0, 0.0), 1.0).unwrap();
        assert_eq!(circle.distance(Vector::new(3.0, 0.0)), 2.0);
        assert_eq!(circle.distance(Vector::new(0.0, 0.5)), -0.5);
        assert!(circle.contains(Vector::new(1.05, 0.0), 0.1));
        assert!(!circle.contains(Vector::new(1.2, 0.0), 0.1));
    }

    #[test]
    fn segment_through_circle_collides() {
        let circle = CircleObstacle::new(Vector::new(0.0, 0.0), 1.0).unwrap();
        let crossing = LineSegment::new(Vector::new(-2.0, 0.5), Vector::new(2.0, 0.5)).unwrap();
        assert!(circle.intersects_edge(&crossing, 0.0));
        let passing = LineSegment::new(Vector::new(-2.0, 1.5), Vector::new(2.0, 1.5)).unwrap();
        assert!(!circle.intersects_edge(&passing, 0.4));
        assert!(circle.intersects_edge(&passing, 0.6));
    }

    #[test]
    fn coverage_is_capped() {
        let circle = CircleObstacle::new(Vector::new(0.0, 0.0), 1.0).unwrap();
        assert_eq!(circle.coverage(Vector::new(2.0, 0.0), 0.1), 0.0);
        assert!((circle.coverage(Vector::new(1.0, 0.0), 0.1) - 0.1).abs() < 1e-6);
        assert!((circle.coverage(Vector::new(0.0, 0.0), 0.1) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn rejects_negative_radius() {
        assert!(CircleObstacle::new(Vector::new(0.0, 0.0), -1.0).is_err());
    }
}
