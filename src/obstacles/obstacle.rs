use crate::geometry::{LineSegment, Vector};
use crate::obstacles::{AnalyticObstacle, CapsuleObstacle, CircleObstacle, RectangularObstacle};
use serde::{Deserialize, Serialize};

/// The obstacle shapes known to the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Obstacle {
    Circle(CircleObstacle),
    Capsule(CapsuleObstacle),
    Rect(RectangularObstacle),
}

impl AnalyticObstacle for Obstacle {
    fn distance(&self, point: Vector) -> f32 {
        match self {
            Obstacle::Circle(circle) => circle.distance(point),
            Obstacle::Capsule(capsule) => capsule.distance(point),
            Obstacle::Rect(rect) => rect.distance(point),
        }
    }

    fn distance_to_segment(&self, segment: &LineSegment) -> f32 {
        match self {
            Obstacle::Circle(circle) => circle.distance_to_segment(segment),
            Obstacle::Capsule(capsule) => capsule.distance_to_segment(segment),
            Obstacle::Rect(rect) => rect.distance_to_segment(segment),
        }
    }
}

impl From<CircleObstacle> for Obstacle {
    fn from(circle: CircleObstacle) -> Self {
        Obstacle::Circle(circle)
    }
}

impl From<CapsuleObstacle> for Obstacle {
    fn from(capsule: CapsuleObstacle) -> Self {
        Obstacle::Capsule(capsule)
    }
}

impl From<RectangularObstacle> for Obstacle {
    fn from(rect: RectangularObstacle) -> Self {
        Obstacle::Rect(rect)
    }
}
