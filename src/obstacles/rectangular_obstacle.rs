use crate::error::{Error, Result};
use crate::geometry::{LineSegment, Vector};
use crate::obstacles::AnalyticObstacle;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangular obstacle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectangularObstacle {
    bottom_left: Vector,
    top_right: Vector,
}

impl RectangularObstacle {
    /// Creates a rectangle spanned by two opposite corners given in any order.
    ///
    /// Parameters:
    /// - `a`: One corner of the rectangle.
    /// - `b`: The opposite corner.
    ///
    /// Returns:
    /// The rectangle, or `Error::InvalidGeometry` if it has no area.
    pub fn new(a: Vector, b: Vector) -> Result<Self> {
        let bottom_left = Vector::new(a.x.min(b.x), a.y.min(b.y));
        let top_right = Vector::new(a.x.max(b.x), a.y.max(b.y));
        if !bottom_left.is_finite()
            || !top_right.is_finite()
            || bottom_left.x == top_right.x
            || bottom_left.y == top_right.y
        {
            return Err(Error::InvalidGeometry(format!(
                "degenerate rectangle ({}, {}) - ({}, {})",
                a.x, a.y, b.x, b.y
            )));
        }
        Ok(Self {
            bottom_left,
            top_right,
        })
    }

    /// Returns the minimum corner of the obstacle (smallest coordinates).
    pub fn bottom_left(&self) -> Vector {
        self.bottom_left
    }

    /// Returns the maximum corner of the obstacle (largest coordinates).
    pub fn top_right(&self) -> Vector {
        self.top_right
    }

    /// Checks if a point lies inside the rectangle, borders included.
    pub fn encloses(&self, point: Vector) -> bool {
        point.x >= self.bottom_left.x
            && point.x <= self.top_right.x
            && point.y >= self.bottom_left.y
            && point.y <= self.top_right.y
    }

    fn edges(&self) -> impl Iterator<Item = LineSegment> {
        let bottom_left = self.bottom_left;
        let top_right = self.top_right;
        let bottom_right = Vector::new(top_right.x, bottom_left.y);
        let top_left = Vector::new(bottom_left.x, top_right.y);
        [
            (top_left, top_right),
            (bottom_left, bottom_right),
            (top_left, bottom_left),
            (top_right, bottom_right),
        ]
        .into_iter()
        .filter_map(|(a, b)| LineSegment::new(a, b).ok())
    }
}

impl AnalyticObstacle for RectangularObstacle {
    fn distance(&self, point: Vector) -> f32 {
        let dist_x = (self.bottom_left.x - point.x).max(point.x - self.top_right.x);
        let dist_y = (self.bottom_left.y - point.y).max(point.y - self.top_right.y);

        if dist_x >= 0.0 && dist_y >= 0.0 {
            // outside, nearest to a corner
            (dist_x * dist_x + dist_y * dist_y).sqrt()
        } else if dist_x < 0.0 && dist_y < 0.0 {
            dist_x.max(dist_y)
        } else if dist_x < 0.0 {
            dist_y
        } else {
            dist_x
        }
    }

    fn distance_to_segment(&self, segment: &LineSegment) -> f32 {
        if self.encloses(segment.start()) || self.encloses(segment.end()) {
            return self.distance(segment.start()).min(self.distance(segment.end()));
        }

        self.edges()
            .map(|edge| segment.segment_distance(&edge))
            .fold(f32::INFINITY, f32::min)
    }
}
