use crate::error::{Error, Result};
use crate::geometry::{LineSegment, Vector};
use crate::obstacles::{
    AnalyticObstacle, CapsuleObstacle, CircleObstacle, Obstacle, RectangularObstacle,
};
use crate::rrt::ValidityChecker;
use serde::{Deserialize, Serialize};

/// Step used to probe the exit direction when starting inside a single obstacle.
const SINGLE_OBSTACLE_PROBE: f32 = 1e-3;
/// Step used to walk a segment that starts inside several obstacles.
const MULTI_OBSTACLE_STEP: f32 = 2e-3;

/// The axis-aligned playfield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub bottom_left: Vector,
    pub top_right: Vector,
}

impl Boundary {
    /// Creates a boundary from two opposite corners given in any order.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            bottom_left: Vector::new(x1.min(x2), y1.min(y2)),
            top_right: Vector::new(x1.max(x2), y1.max(y2)),
        }
    }
}

/// The static world a robot plans in: playfield boundary, robot radius and obstacles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    boundary: Boundary,
    radius: f32,
    obstacles: Vec<Obstacle>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn set_boundary(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.boundary = Boundary::new(x1, y1, x2, y2);
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    pub fn is_radius_valid(&self) -> bool {
        self.radius >= 0.0
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn clear_obstacles(&mut self) {
        self.obstacles.clear();
    }

    pub fn add_obstacle(&mut self, obstacle: impl Into<Obstacle>) {
        self.obstacles.push(obstacle.into());
    }

    pub fn add_circle(&mut self, x: f32, y: f32, radius: f32) -> Result<()> {
        self.add_obstacle(CircleObstacle::new(Vector::new(x, y), radius)?);
        Ok(())
    }

    /// Adds a capsule of half width `width` around the segment from `(x1, y1)` to `(x2, y2)`.
    pub fn add_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32) -> Result<()> {
        self.add_obstacle(CapsuleObstacle::new(
            Vector::new(x1, y1),
            Vector::new(x2, y2),
            width,
        )?);
        Ok(())
    }

    pub fn add_rect(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Result<()> {
        self.add_obstacle(RectangularObstacle::new(
            Vector::new(x1, y1),
            Vector::new(x2, y2),
        )?);
        Ok(())
    }

    /// Fails with `Error::InvalidRadius` unless the robot radius is non-negative.
    pub fn ensure_radius_valid(&self) -> Result<()> {
        if self.is_radius_valid() {
            Ok(())
        } else {
            Err(Error::InvalidRadius(self.radius))
        }
    }

    /// Checks whether a robot of `radius` at `point` lies completely inside the playfield.
    pub fn point_in_playfield(&self, point: Vector, radius: f32) -> bool {
        point.x - radius >= self.boundary.bottom_left.x
            && point.x + radius <= self.boundary.top_right.x
            && point.y - radius >= self.boundary.bottom_left.y
            && point.y + radius <= self.boundary.top_right.y
    }

    /// How far a robot of `radius` at `point` reaches beyond the playfield, zero inside.
    pub fn outside_playfield_coverage(&self, point: Vector, radius: f32) -> f32 {
        let bound = &self.boundary;
        let x = (bound.bottom_left.x - point.x + radius).max(point.x + radius - bound.top_right.x);
        let y = (bound.bottom_left.y - point.y + radius).max(point.y + radius - bound.top_right.y);
        x.max(y).max(0.0)
    }

    /// Checks that a robot of `radius` at `point` is inside the playfield and clear of `obstacles`.
    pub fn test_point<'a>(
        &self,
        point: Vector,
        radius: f32,
        obstacles: impl IntoIterator<Item = &'a Obstacle>,
    ) -> bool {
        self.point_in_playfield(point, radius)
            && obstacles
                .into_iter()
                .all(|obstacle| !obstacle.contains(point, radius))
    }

    /// Checks that a robot of `radius` moving along `segment` stays clear of `obstacles`.
    ///
    /// The playfield boundary is not considered.
    pub fn test_segment<'a>(
        &self,
        segment: &LineSegment,
        radius: f32,
        obstacles: impl IntoIterator<Item = &'a Obstacle>,
    ) -> bool {
        obstacles
            .into_iter()
            .all(|obstacle| !obstacle.intersects_edge(segment, radius))
    }

    /// Segment test against all obstacles with the robot radius.
    pub fn segment_clear(&self, segment: &LineSegment) -> bool {
        self.test_segment(segment, self.radius, &self.obstacles)
    }

    /// Sum of the obstacle coverages of a robot of `radius` at `point`.
    pub fn obstacle_coverage<'a>(
        &self,
        point: Vector,
        radius: f32,
        obstacles: impl IntoIterator<Item = &'a Obstacle>,
    ) -> f32 {
        obstacles
            .into_iter()
            .map(|obstacle| obstacle.coverage(point, radius))
            .sum()
    }

    /// Checks a movement that starts inside one or more obstacles.
    ///
    /// The movement may not leave the playfield any further and may not reach any deeper
    /// into the obstacles containing its start. Obstacles that do not contain the start
    /// must not be entered at all.
    pub fn check_movement_relative_to_obstacles(&self, segment: &LineSegment) -> bool {
        let radius = self.radius;
        let start = segment.start();
        let end = segment.end();
        let length = segment.length();
        if length == 0.0 {
            return false;
        }

        // only allow moving further inside the field
        if self.outside_playfield_coverage(end, radius)
            > self.outside_playfield_coverage(start, radius)
        {
            return false;
        }

        let (start_obstacles, other_obstacles): (Vec<&Obstacle>, Vec<&Obstacle>) = self
            .obstacles
            .iter()
            .partition(|obstacle| obstacle.contains(start, radius));

        if start_obstacles.len() == 1 {
            // coverage of a convex obstacle decreases iff the robot moves out of it
            let step = segment.dir() * SINGLE_OBSTACLE_PROBE.min(length);
            let start_coverage = self.obstacle_coverage(start, radius, start_obstacles.iter().copied());
            let step_coverage =
                self.obstacle_coverage(start + step, radius, start_obstacles.iter().copied());
            if step_coverage > start_coverage {
                return false;
            }
        } else if start_obstacles.len() > 1 {
            let num_steps = (length / MULTI_OBSTACLE_STEP).ceil().max(1.0) as usize;
            let step = segment.dir() * (length / num_steps as f32);

            // the robot may swing between covering obstacles as long as the sum does not grow
            let mut p = start;
            let mut last_coverage = f32::INFINITY;
            for i in 0..=num_steps {
                let coverage = self.obstacle_coverage(p, radius, start_obstacles.iter().copied());
                if coverage > last_coverage {
                    return false;
                } else if coverage == 0.0 && i < num_steps {
                    if let Ok(rest) = LineSegment::new(p, end) {
                        if !self.test_segment(&rest, radius, start_obstacles.iter().copied()) {
                            return false;
                        }
                    }
                    break;
                }
                last_coverage = coverage;
                p += step;
            }
        }

        self.test_segment(segment, radius, other_obstacles)
    }
}

impl ValidityChecker for World {
    fn is_state_valid(&self, state: &Vector) -> bool {
        self.test_point(*state, self.radius, &self.obstacles)
    }

    fn is_edge_valid(&self, a: &Vector, b: &Vector) -> bool {
        match LineSegment::new(*a, *b) {
            Ok(segment) => self.segment_clear(&segment),
            Err(_) => self
                .obstacles
                .iter()
                .all(|obstacle| !obstacle.contains(*a, self.radius)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        let mut world = World::new();
        world.set_boundary(5.0, 5.0, -5.0, -5.0);
        world.set_radius(0.1);
        world
    }

    fn segment(a: (f32, f32), b: (f32, f32)) -> LineSegment {
        LineSegment::new(Vector::new(a.0, a.1), Vector::new(b.0, b.1)).unwrap()
    }

    #[test]
    fn boundary_is_normalized() {
        let world = world();
        assert_eq!(world.boundary().bottom_left, Vector::new(-5.0, -5.0));
        assert_eq!(world.boundary().top_right, Vector::new(5.0, 5.0));
    }

    #[test]
    fn playfield_respects_radius() {
        let world = world();
        assert!(world.point_in_playfield(Vector::new(4.9, 0.0), 0.1));
        assert!(!world.point_in_playfield(Vector::new(4.95, 0.0), 0.1));
        assert_eq!(world.outside_playfield_coverage(Vector::new(0.0, 0.0), 0.1), 0.0);
        assert!((world.outside_playfield_coverage(Vector::new(5.5, 0.0), 0.1) - 0.6).abs() < 1e-5);
    }

    #[test]
    fn invalid_geometry_is_reported() {
        let mut world = world();
        assert!(matches!(
            world.add_line(1.0, 1.0, 1.0, 1.0, 0.2),
            Err(Error::InvalidGeometry(_))
        ));
        assert!(world.add_rect(0.0, 0.0, 0.0, 1.0).is_err());
        assert!(world.obstacles().is_empty());
        world.set_radius(-1.0);
        assert!(!world.is_radius_valid());
        assert!(matches!(world.ensure_radius_valid(), Err(Error::InvalidRadius(_))));
    }

    #[test]
    fn validity_checks_use_robot_radius() {
        let mut world = world();
        world.add_circle(0.0, 0.0, 1.0).unwrap();
        assert!(!world.is_state_valid(&Vector::new(1.05, 0.0)));
        assert!(world.is_state_valid(&Vector::new(1.15, 0.0)));
        assert!(!world.is_state_valid(&Vector::new(6.0, 0.0)));
        assert!(!world.is_edge_valid(&Vector::new(-2.0, 0.0), &Vector::new(2.0, 0.0)));
        assert!(world.is_edge_valid(&Vector::new(-2.0, 1.2), &Vector::new(2.0, 1.2)));
        assert!(!world.is_edge_valid(&Vector::new(0.5, 0.0), &Vector::new(0.5, 0.0)));
    }

    #[test]
    fn edges_ignore_the_playfield() {
        let world = world();
        let outside = Vector::new(6.0, 0.0);
        assert!(!world.is_state_valid(&outside));
        assert!(world.is_edge_valid(&Vector::new(0.0, 0.0), &outside));
        assert!(world.is_edge_valid(&outside, &outside));
    }

    #[test]
    fn leaving_a_single_obstacle_is_allowed() {
        let mut world = world();
        world.add_circle(0.0, 0.0, 1.0).unwrap();
        assert!(world.check_movement_relative_to_obstacles(&segment((0.95, 0.0), (2.0, 0.0))));
        assert!(!world.check_movement_relative_to_obstacles(&segment((0.95, 0.0), (0.5, 0.0))));
    }

    #[test]
    fn entering_another_obstacle_is_rejected() {
        let mut world = world();
        world.add_circle(0.0, 0.0, 1.0).unwrap();
        world.add_rect(2.0, -1.0, 3.0, 1.0).unwrap();
        assert!(!world.check_movement_relative_to_obstacles(&segment((0.95, 0.0), (2.5, 0.0))));
        assert!(world.check_movement_relative_to_obstacles(&segment((0.95, 0.0), (0.95, 3.0))));
    }

    #[test]
    fn leaving_overlapping_obstacles() {
        let mut world = world();
        world.add_circle(0.0, 0.0, 1.0).unwrap();
        world.add_circle(0.5, 0.0, 1.0).unwrap();
        assert!(world.check_movement_relative_to_obstacles(&segment((0.25, 0.0), (0.25, 2.0))));
        assert!(!world.check_movement_relative_to_obstacles(&segment((0.25, 0.9), (0.25, 0.0))));
    }

    #[test]
    fn moving_further_out_of_the_playfield_is_rejected() {
        let world = world();
        assert!(!world.check_movement_relative_to_obstacles(&segment((5.0, 0.0), (5.5, 0.0))));
        assert!(world.check_movement_relative_to_obstacles(&segment((5.5, 0.0), (4.0, 0.0))));
    }
}
