use crate::error::{Error, Result};
use crate::geometry::Vector;
use serde::{Deserialize, Serialize};

/// Below this sine of the enclosed angle two segments are treated as parallel.
const PARALLEL_EPSILON: f32 = 1e-6;

/// A two-dimensional line segment with cached direction and normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    start: Vector,
    end: Vector,
    dir: Vector,
    normal: Vector,
}

impl LineSegment {
    /// Constructs a segment between two distinct points.
    pub fn new(start: Vector, end: Vector) -> Result<Self> {
        if start == end {
            return Err(Error::InvalidGeometry(format!(
                "line segment endpoints coincide at ({}, {})",
                start.x, start.y
            )));
        }
        if !start.is_finite() || !end.is_finite() {
            return Err(Error::InvalidGeometry(
                "line segment endpoints must be finite".to_string(),
            ));
        }
        let dir = (end - start).normalized();
        Ok(Self {
            start,
            end,
            dir,
            normal: dir.perpendicular(),
        })
    }

    pub fn start(&self) -> Vector {
        self.start
    }

    pub fn end(&self) -> Vector {
        self.end
    }

    /// Unit direction from start to end.
    pub fn dir(&self) -> Vector {
        self.dir
    }

    pub fn normal(&self) -> Vector {
        self.normal
    }

    pub fn length(&self) -> f32 {
        self.start.distance(&self.end)
    }

    /// Unsigned distance from `pos` to the segment.
    pub fn distance(&self, pos: Vector) -> f32 {
        self.distance_signed(pos).abs()
    }

    /// Distance to the nearer endpoint if `pos` projects outside the segment,
    /// otherwise the signed distance to the supporting line.
    pub fn distance_signed(&self, pos: Vector) -> f32 {
        let d = pos - self.start;
        if d.dot(&self.dir) < 0.0 {
            return d.length();
        }

        let d = pos - self.end;
        if d.dot(&self.dir) > 0.0 {
            return d.length();
        }

        d.dot(&self.normal)
    }

    /// Point on the segment closest to `pos`.
    pub fn closest_point(&self, pos: Vector) -> Vector {
        let t = (pos - self.start).dot(&self.dir);
        if t <= 0.0 {
            self.start
        } else if t >= self.length() {
            self.end
        } else {
            self.start + self.dir * t
        }
    }

    /// Minimum distance between two segments, zero if they cross.
    ///
    /// Nearly parallel segments skip the crossing test, their distance is fully
    /// determined by the endpoint distances.
    pub fn segment_distance(&self, segment: &LineSegment) -> f32 {
        let d = self
            .distance(segment.start)
            .min(self.distance(segment.end))
            .min(segment.distance(self.start))
            .min(segment.distance(self.end));

        let denominator1 = segment.normal.dot(&self.dir);
        let denominator2 = self.normal.dot(&segment.dir);
        if denominator1.abs() < PARALLEL_EPSILON || denominator2.abs() < PARALLEL_EPSILON {
            return d;
        }

        let diff = segment.start - self.start;
        let t1 = segment.normal.dot(&diff) / denominator1;
        let t2 = -self.normal.dot(&diff) / denominator2;
        if 0.0 <= t1 && t1 <= self.length() && 0.0 <= t2 && t2 <= segment.length() {
            return 0.0;
        }

        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn segment(x1: f32, y1: f32, x2: f32, y2: f32) -> LineSegment {
        LineSegment::new(Vector::new(x1, y1), Vector::new(x2, y2)).unwrap()
    }

    #[test]
    fn rejects_degenerate_segments() {
        let p = Vector::new(1.0, 1.0);
        assert!(matches!(
            LineSegment::new(p, p),
            Err(Error::InvalidGeometry(_))
        ));
        assert!(LineSegment::new(p, Vector::new(f32::NAN, 0.0)).is_err());
    }

    #[rstest]
    #[case(0.0, 0.0, 0.0)]
    #[case(1.0, 0.0, 0.0)]
    #[case(0.5, 0.0, 0.0)]
    #[case(0.5, 1.0, 1.0)]
    #[case(0.5, -1.0, 1.0)]
    #[case(-1.0, 0.0, 1.0)]
    #[case(2.0, 0.0, 1.0)]
    fn point_distance(#[case] x: f32, #[case] y: f32, #[case] expected: f32) {
        let s = segment(0.0, 0.0, 1.0, 0.0);
        assert!((s.distance(Vector::new(x, y)) - expected).abs() < 1e-6);
    }

    #[rstest]
    #[case(segment(1.0, 0.0, 1.0, 1.0), 0.0)]
    #[case(segment(0.0, 0.0, -1.0, 0.0), 0.0)]
    #[case(segment(0.5, 1.0, 0.5, -1.0), 0.0)]
    #[case(segment(0.0, 1.0, 1.0, 1.0), 1.0)]
    #[case(segment(0.0, -1.0, 1.0, -1.0), 1.0)]
    #[case(segment(-0.5, 1.0, -0.5, -1.0), 0.5)]
    #[case(segment(1.5, 1.0, 1.5, -1.0), 0.5)]
    fn segment_distance(#[case] other: LineSegment, #[case] expected: f32) {
        let s = segment(0.0, 0.0, 1.0, 0.0);
        assert!((s.segment_distance(&other) - expected).abs() < 1e-6);
        assert!((other.segment_distance(&s) - expected).abs() < 1e-6);
    }

    #[test]
    fn parallel_segments_use_endpoint_distance() {
        let s = segment(0.0, 0.0, 1.0, 0.0);
        let collinear = segment(2.0, 0.0, 3.0, 0.0);
        assert!((s.segment_distance(&collinear) - 1.0).abs() < 1e-6);
        let overlapping = segment(0.5, 0.0, 3.0, 0.0);
        assert_eq!(s.segment_distance(&overlapping), 0.0);
        let almost_parallel = segment(0.0, 0.5, 1.0, 0.5 + 1e-9);
        assert!(s.segment_distance(&almost_parallel).is_finite());
    }

    #[test]
    fn closest_point_clamps_to_endpoints() {
        let s = segment(0.0, 0.0, 1.0, 0.0);
        assert_eq!(s.closest_point(Vector::new(0.5, 1.0)), Vector::new(0.5, 0.0));
        assert_eq!(s.closest_point(Vector::new(-1.0, 0.5)), Vector::new(0.0, 0.0));
        assert_eq!(s.closest_point(Vector::new(2.0, 0.5)), Vector::new(1.0, 0.0));
    }

    #[test]
    fn direction_and_normal() {
        let s = segment(0.0, 0.0, 5.0, 0.0);
        assert_eq!(s.dir(), Vector::new(1.0, 0.0));
        assert_eq!(s.normal().x.abs(), 0.0);
        assert_eq!(s.normal().y.abs(), 1.0);
    }
}
