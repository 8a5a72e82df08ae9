use crate::config::PlannerConfig;
use crate::error::{Error, Result};
use crate::geometry::Vector;
use crate::rrt::world::Boundary;
use rand::Rng;

/// A bounded cache of waypoints from previous planning calls.
///
/// The cache fills up to its capacity, afterwards every new waypoint overwrites
/// an entry chosen uniformly at random. Sampling from the cache biases the search
/// towards corridors that worked before.
#[derive(Debug, Clone)]
pub struct WaypointCache {
    capacity: usize,
    waypoints: Vec<Vector>,
}

impl WaypointCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            waypoints: Vec::with_capacity(capacity),
        }
    }

    /// Adds a waypoint, evicting a random entry once the cache is full.
    pub fn add<R: Rng + ?Sized>(&mut self, waypoint: Vector, rng: &mut R) {
        if self.waypoints.len() < self.capacity {
            self.waypoints.push(waypoint);
        } else if self.capacity > 0 {
            let index = rng.gen_range(0..self.capacity);
            self.waypoints[index] = waypoint;
        }
    }

    /// Returns a uniformly chosen cached waypoint.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vector> {
        if self.waypoints.is_empty() {
            return None;
        }
        Some(self.waypoints[rng.gen_range(0..self.waypoints.len())])
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vector> {
        self.waypoints.iter()
    }
}

/// Chooses the points the search trees grow towards.
#[derive(Debug, Clone)]
pub struct TargetSampler {
    p_dest: f32, // Probability of returning the destination
    p_wp: f32,   // Probability of returning a cached waypoint
    sample_rect: Boundary,
}

impl Default for TargetSampler {
    fn default() -> Self {
        let config = PlannerConfig::default();
        Self {
            p_dest: config.p_dest,
            p_wp: config.p_wp,
            sample_rect: Boundary::default(),
        }
    }
}

impl TargetSampler {
    /// Constructs a sampler with the given target probabilities.
    ///
    /// Parameters:
    /// - `p_dest`: Probability of sampling the destination.
    /// - `p_wp`: Probability of sampling a cached waypoint.
    pub fn new(p_dest: f32, p_wp: f32) -> Result<Self> {
        let mut sampler = Self {
            p_dest: 0.0,
            p_wp: 0.0,
            sample_rect: Boundary::default(),
        };
        sampler.set_probabilities(p_dest, p_wp)?;
        Ok(sampler)
    }

    /// Fails with `Error::InvalidProbabilities` if a probability is negative or their sum exceeds one.
    pub fn set_probabilities(&mut self, p_dest: f32, p_wp: f32) -> Result<()> {
        let valid = (0.0..=1.0).contains(&p_dest)
            && (0.0..=1.0).contains(&p_wp)
            && p_dest + p_wp <= 1.0;
        if !valid {
            return Err(Error::InvalidProbabilities { p_dest, p_wp });
        }
        self.p_dest = p_dest;
        self.p_wp = p_wp;
        Ok(())
    }

    pub fn probabilities(&self) -> (f32, f32) {
        (self.p_dest, self.p_wp)
    }

    /// Centers the sampling region between `start` and `end`, large enough to cover the whole playfield.
    pub fn set_sample_rect(&mut self, start: Vector, end: Vector, boundary: &Boundary) {
        let middle = (start + end) / 2.0;
        let x_half = (middle.x - boundary.bottom_left.x).max(boundary.top_right.x - middle.x);
        let y_half = (middle.y - boundary.bottom_left.y).max(boundary.top_right.y - middle.y);
        self.sample_rect = Boundary {
            bottom_left: Vector::new(middle.x - x_half, middle.y - y_half),
            top_right: Vector::new(middle.x + x_half, middle.y + y_half),
        };
    }

    pub fn sample_rect(&self) -> &Boundary {
        &self.sample_rect
    }

    /// A uniformly distributed point in the sampling region.
    pub fn random_state<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector {
        let rect = &self.sample_rect;
        let u: f32 = rng.gen();
        let v: f32 = rng.gen();
        Vector::new(
            u * (rect.top_right.x - rect.bottom_left.x) + rect.bottom_left.x,
            v * (rect.top_right.y - rect.bottom_left.y) + rect.bottom_left.y,
        )
    }

    /// Samples the next growth target.
    ///
    /// Parameters:
    /// - `destination`: The root of the opposite tree.
    /// - `cache`: Waypoints of previous planning calls.
    pub fn target<R: Rng + ?Sized>(
        &self,
        destination: Vector,
        cache: &WaypointCache,
        rng: &mut R,
    ) -> Vector {
        let p: f32 = rng.gen();
        if p < self.p_dest {
            return destination;
        }
        if p < self.p_dest + self.p_wp {
            if let Some(waypoint) = cache.sample(rng) {
                return waypoint;
            }
        }
        self.random_state(rng)
    }
}
