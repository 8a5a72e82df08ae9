use crate::geometry::Vector;

/// Collision queries for a robot of fixed radius.
pub trait ValidityChecker {
    /// True if a robot centered at `state` lies inside the playfield and keeps its
    /// radius of clearance to every obstacle.
    fn is_state_valid(&self, state: &Vector) -> bool;

    /// True if the robot can drive straight from `a` to `b` without touching an obstacle.
    ///
    /// Only obstacles are considered, leaving the playfield is checked separately.
    /// Identical endpoints are tested as a single position.
    fn is_edge_valid(&self, a: &Vector, b: &Vector) -> bool;
}
