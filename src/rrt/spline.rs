use crate::geometry::Vector;
use serde::{Deserialize, Serialize};

/// `a0 + a1 t + a2 t^2 + a3 t^3`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CubicPolynomial {
    pub a0: f32,
    pub a1: f32,
    pub a2: f32,
    pub a3: f32,
}

impl CubicPolynomial {
    pub fn new(a0: f32, a1: f32, a2: f32, a3: f32) -> Self {
        Self { a0, a1, a2, a3 }
    }

    pub fn eval(&self, t: f32) -> f32 {
        self.a0 + (self.a1 + (self.a2 + self.a3 * t) * t) * t
    }
}

/// A planar trajectory segment with one cubic polynomial per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    pub t_start: f32,
    pub t_end: f32,
    pub x: CubicPolynomial,
    pub y: CubicPolynomial,
}

impl Spline {
    pub fn eval(&self, t: f32) -> Vector {
        Vector::new(self.x.eval(t), self.y.eval(t))
    }

    /// Evaluates the spline at `steps` equidistant parameters starting at `t_start`.
    ///
    /// Returns `None` for non-finite or empty parameter ranges.
    pub fn sample_points(&self, steps: usize) -> Option<Vec<Vector>> {
        if !self.t_start.is_finite() || !self.t_end.is_finite() || self.t_end <= self.t_start {
            return None;
        }
        let step_size = (self.t_end - self.t_start) / steps as f32;
        let mut t = self.t_start;
        let mut points = Vec::with_capacity(steps);
        for _ in 0..steps {
            points.push(self.eval(t));
            t += step_size;
        }
        Some(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horner_evaluation() {
        let p = CubicPolynomial::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(p.eval(0.0), 1.0);
        assert_eq!(p.eval(1.0), 10.0);
        assert_eq!(p.eval(2.0), 1.0 + 4.0 + 12.0 + 32.0);
    }

    #[test]
    fn invalid_ranges_have_no_samples() {
        let mut spline = Spline {
            t_start: 1.0,
            t_end: 1.0,
            ..Default::default()
        };
        assert!(spline.sample_points(10).is_none());
        spline.t_end = f32::NAN;
        assert!(spline.sample_points(10).is_none());
        spline.t_start = f32::NEG_INFINITY;
        spline.t_end = 0.0;
        assert!(spline.sample_points(10).is_none());
    }

    #[test]
    fn samples_start_at_t_start() {
        let spline = Spline {
            t_start: 0.0,
            t_end: 1.0,
            x: CubicPolynomial::new(0.0, 1.0, 0.0, 0.0),
            y: CubicPolynomial::new(2.0, 0.0, 0.0, 0.0),
        };
        let points = spline.sample_points(10).unwrap();
        assert_eq!(points.len(), 10);
        assert_eq!(points[0], Vector::new(0.0, 2.0));
        assert!((points[9].x - 0.9).abs() < 1e-5);
    }
}
