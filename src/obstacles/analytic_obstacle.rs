use crate::geometry::{LineSegment, Vector};

/// A trait for analytic obstacles in the field plane.
/// Analytic obstacles have exact signed distance functions for points and segments.
/// They do not require discrete sampling or approximation.
///
/// Obstacles are assumed to be convex, and the distance of a point inside an
/// obstacle is the negated distance to the closest point on its border.
pub trait AnalyticObstacle {
    /// Signed distance from `point` to the obstacle border, negative inside.
    fn distance(&self, point: Vector) -> f32;

    /// Minimum signed distance from any point of `segment` to the obstacle.
    fn distance_to_segment(&self, segment: &LineSegment) -> f32;

    /// Checks whether a robot of radius `clearance` at `point` collides with the obstacle.
    fn contains(&self, point: Vector, clearance: f32) -> bool {
        self.distance(point) < clearance
    }

    /// Checks whether a robot of radius `clearance` moving along `segment` collides with the obstacle.
    fn intersects_edge(&self, segment: &LineSegment, clearance: f32) -> bool {
        self.distance_to_segment(segment) < clearance
    }

    /// How deep a robot of radius `clearance` at `point` reaches into the obstacle.
    ///
    /// The value is capped at `2 * clearance`, a fully covered robot may move freely.
    fn coverage(&self, point: Vector, clearance: f32) -> f32 {
        let d = self.distance(point) - clearance;
        if d < 0.0 {
            (-d).min(2.0 * clearance)
        } else {
            0.0
        }
    }
}
