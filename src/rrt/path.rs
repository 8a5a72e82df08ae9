use crate::config::PlannerConfig;
use crate::error::Result;
use crate::geometry::{LineSegment, Vector};
use crate::obstacles::Obstacle;
use crate::rrt::kdtree::KdTree;
use crate::rrt::sampling::{TargetSampler, WaypointCache};
use crate::rrt::spline::Spline;
use crate::rrt::validity_checker::ValidityChecker;
use crate::rrt::world::{Boundary, World};
use log::{debug, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A point of a planned path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f32,
    pub y: f32,
    /// Free corridor to the left, not computed by the planner.
    pub l: f32,
    /// Free corridor to the right, not computed by the planner.
    pub r: f32,
}

impl From<Vector> for Waypoint {
    fn from(v: Vector) -> Self {
        Self {
            x: v.x,
            y: v.y,
            l: 0.0,
            r: 0.0,
        }
    }
}

impl Waypoint {
    pub fn position(&self) -> Vector {
        Vector::new(self.x, self.y)
    }
}

/// Bidirectional RRT path planner.
///
/// Each call to [`Path::get`] grows one tree from the start and one from the goal
/// until they meet, then shortens and smooths the connecting chain. Waypoints of
/// previous calls are cached and bias the sampling of later calls.
pub struct Path {
    config: PlannerConfig,
    world: World,
    sampler: TargetSampler,
    waypoints: WaypointCache, // Waypoints of previous planning calls
    seed_targets: Vec<Vector>,
    tree_start: Option<KdTree>,
    tree_end: Option<KdTree>,
    last_path: Vec<Vector>,
}

impl Default for Path {
    fn default() -> Self {
        let config = PlannerConfig::default();
        Self {
            sampler: TargetSampler::default(),
            waypoints: WaypointCache::new(config.cache_size),
            config,
            world: World::new(),
            seed_targets: Vec::new(),
            tree_start: None,
            tree_end: None,
            last_path: Vec::new(),
        }
    }
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a planner with custom tuning parameters.
    ///
    /// Fails with `Error::InvalidProbabilities` if the sampling probabilities are invalid.
    pub fn with_config(config: PlannerConfig) -> Result<Self> {
        Ok(Self {
            sampler: TargetSampler::new(config.p_dest, config.p_wp)?,
            waypoints: WaypointCache::new(config.cache_size),
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Drops both trees, all obstacles and the waypoint cache.
    pub fn reset(&mut self) {
        self.tree_start = None;
        self.tree_end = None;
        self.clear_obstacles();
        self.waypoints.clear();
        self.last_path.clear();
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.world.set_radius(radius);
    }

    pub fn is_radius_valid(&self) -> bool {
        self.world.is_radius_valid()
    }

    pub fn set_boundary(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.world.set_boundary(x1, y1, x2, y2);
    }

    /// Removes all obstacles and seed targets.
    pub fn clear_obstacles(&mut self) {
        self.world.clear_obstacles();
        self.seed_targets.clear();
    }

    pub fn add_circle(&mut self, x: f32, y: f32, radius: f32) -> Result<()> {
        self.world.add_circle(x, y, radius)
    }

    pub fn add_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32) -> Result<()> {
        self.world.add_line(x1, y1, x2, y2, width)
    }

    pub fn add_rect(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Result<()> {
        self.world.add_rect(x1, y1, x2, y2)
    }

    pub fn add_obstacle(&mut self, obstacle: impl Into<Obstacle>) {
        self.world.add_obstacle(obstacle);
    }

    /// Registers a point the start tree is grown towards before the random search starts.
    pub fn add_seed_target(&mut self, x: f32, y: f32) {
        self.seed_targets.push(Vector::new(x, y));
    }

    pub fn set_probabilities(&mut self, p_dest: f32, p_wp: f32) -> Result<()> {
        self.sampler.set_probabilities(p_dest, p_wp)?;
        self.config.p_dest = p_dest;
        self.config.p_wp = p_wp;
        Ok(())
    }

    /// The tree rooted at the start of the last planning call.
    pub fn tree_start(&self) -> Option<&KdTree> {
        self.tree_start.as_ref()
    }

    /// The tree rooted at the goal of the last planning call.
    pub fn tree_end(&self) -> Option<&KdTree> {
        self.tree_end.as_ref()
    }

    pub fn waypoint_cache(&self) -> &WaypointCache {
        &self.waypoints
    }

    /// Points of the last returned path.
    pub fn last_path(&self) -> &[Vector] {
        &self.last_path
    }

    pub fn sample_rect(&self) -> &Boundary {
        self.sampler.sample_rect()
    }

    /// Checks whether a robot of `radius` following `spline` stays clear of all obstacles.
    ///
    /// Does not modify the planner state.
    pub fn test_spline(&self, spline: &Spline, radius: f32) -> bool {
        let points = match spline.sample_points(self.config.spline_steps) {
            Some(points) => points,
            None => return false,
        };

        points.windows(2).all(|pair| match LineSegment::new(pair[0], pair[1]) {
            Ok(segment) => self
                .world
                .test_segment(&segment, radius, self.world.obstacles()),
            Err(_) => true,
        })
    }

    /// Plans a path from `(start_x, start_y)` to `(end_x, end_y)`.
    ///
    /// If the trees do not connect within the iteration limit the returned path
    /// ends at the point closest to the goal that could be reached. Callers detect
    /// this by comparing the last waypoint with the goal.
    ///
    /// Parameters:
    /// - `rng`: Source of randomness for target sampling and cache replacement.
    ///
    /// Returns:
    /// The waypoints from start to end, or `Error::InvalidRadius` for a negative robot radius.
    pub fn get<R: Rng + ?Sized>(
        &mut self,
        start_x: f32,
        start_y: f32,
        end_x: f32,
        end_y: f32,
        rng: &mut R,
    ) -> Result<Vec<Waypoint>> {
        self.world.ensure_radius_valid()?;

        let start = Vector::new(start_x, start_y);
        let end = Vector::new(end_x, end_y);

        self.sampler.set_sample_rect(start, end, self.world.boundary());

        let starting_in_obstacle = !self.world.is_state_valid(&start);
        let ending_in_obstacle = !self.world.is_state_valid(&end);

        let mut tree_start = KdTree::new(start, starting_in_obstacle);
        let mut tree_end = KdTree::new(end, ending_in_obstacle);

        let mut path_completed = false;
        // shortcuts are only possible if neither start nor end are blocked
        if !starting_in_obstacle && !ending_in_obstacle {
            if start == end {
                path_completed = true;
            } else if let Ok(direct) = LineSegment::new(start, end) {
                if self.world.segment_clear(&direct) {
                    path_completed = true;
                    // rasterize the direct line to feed the waypoint cache
                    let root = tree_start.root();
                    self.raster_path(&mut tree_start, &direct, root);
                }
            }
        }

        if !path_completed {
            for seed_target in &self.seed_targets {
                if let Ok(segment) = LineSegment::new(start, *seed_target) {
                    let nearest = tree_start.nearest(start);
                    self.raster_path(&mut tree_start, &segment, nearest);
                }
            }
        }

        // both trees first leave the obstacles around their roots before they can merge
        let mut merge_point: Option<Vector> = None;
        let mut a_is_start = true;
        let mut iterations = 0;
        while iterations < self.config.max_iterations && !path_completed {
            iterations += 1;
            let (tree_a, tree_b, destination) = if a_is_start {
                (&mut tree_start, &mut tree_end, end)
            } else {
                (&mut tree_end, &mut tree_start, start)
            };

            let target = self.sampler.target(destination, &self.waypoints, rng);
            let nearest = tree_a.nearest(target);

            if let Some(new_node) = self.extend(tree_a, nearest, target) {
                // grow the other tree towards the new node
                let target = tree_a.position(new_node);
                let mut node = tree_b.nearest(target);
                for _ in 0..self.config.extend_multi_steps {
                    node = match self.extend(tree_b, node, target) {
                        Some(extended) => extended,
                        None => break,
                    };
                    let reached = tree_b.position(node).distance(&target);
                    if reached <= self.config.merge_tolerance && !tree_b.in_obstacle(node) {
                        path_completed = true;
                        merge_point = Some(tree_b.position(node));
                        break;
                    }
                }
            }
            a_is_start = !a_is_start;
        }

        if path_completed {
            trace!(
                "path found after {} iterations, trees have {} and {} nodes",
                iterations,
                tree_start.len(),
                tree_end.len()
            );
        } else {
            debug!(
                "path search from ({}, {}) to ({}, {}) did not converge within {} iterations",
                start.x, start.y, end.x, end.y, iterations
            );
        }

        let (mid, nearest) = match merge_point {
            Some(point) => (point, tree_start.nearest(point)),
            None => {
                // the trees didn't connect, get as close to the goal as possible
                let nearest = tree_start.nearest(end);
                (tree_start.position(nearest), nearest)
            }
        };

        let mut points: Vec<Vector> = tree_start
            .chain(nearest)
            .map(|node| tree_start.position(node))
            .collect();
        points.reverse();

        let mut remaining = Some(tree_end.nearest(mid));
        if merge_point.is_some() {
            // skip the merge node, it is already part of the start chain
            remaining = remaining.and_then(|node| tree_end.previous(node));
            while let Some(node) = remaining {
                if tree_end.in_obstacle(node) {
                    break;
                }
                points.push(tree_end.position(node));
                remaining = tree_end.previous(node);
            }
        }

        // approach the part of the end tree that could not be reached
        let last_point = points.last().copied();
        if let (Some(node), Some(line_start)) = (remaining, last_point) {
            if let Ok(segment) = LineSegment::new(line_start, tree_end.position(node)) {
                let best = self.find_valid_point(&segment);
                if best != line_start
                    && self.world.point_in_playfield(best, self.world.radius())
                    && self.world.is_edge_valid(&line_start, &best)
                {
                    points.push(best);
                }
            }
        }

        for point in &points {
            self.waypoints.add(*point, rng);
        }
        if let Some(node) = remaining {
            for node in tree_end.chain(node) {
                self.waypoints.add(tree_end.position(node), rng);
            }
        }

        for _ in 0..self.config.smoothing_rounds {
            self.simplify(&mut points);
            self.cut_corners(&mut points);
        }
        self.simplify(&mut points);

        self.tree_start = Some(tree_start);
        self.tree_end = Some(tree_end);
        self.last_path = points;

        Ok(self.last_path.iter().copied().map(Waypoint::from).collect())
    }

    /// Moves at most one planner step from `from_node` towards `to` and inserts the new node.
    ///
    /// Nodes inside obstacles may only move in a direction that does not increase
    /// their obstacle coverage. All other nodes need a collision free step.
    ///
    /// Returns:
    /// The index of the new node, or None if the step is blocked or `to` is already reached.
    pub fn extend(&self, tree: &mut KdTree, from_node: usize, to: Vector) -> Option<usize> {
        let step_size = self.config.step_size;
        let from = tree.position(from_node);
        let in_obstacle = tree.in_obstacle(from_node);
        let d = to - from;
        let l = d.length();
        if l == 0.0 {
            return None;
        }
        let extended = if l > step_size {
            from + d * (step_size / l)
        } else {
            to
        };
        let segment = LineSegment::new(from, extended).ok()?;

        let success = if in_obstacle {
            self.world.check_movement_relative_to_obstacles(&segment)
        } else {
            self.world.point_in_playfield(extended, self.world.radius())
                && self.world.segment_clear(&segment)
        };
        if !success {
            return None;
        }

        // once every obstacle was left reentering one is impossible
        let new_in_obstacle = in_obstacle && !self.world.is_state_valid(&extended);
        Some(tree.insert(extended, new_in_obstacle, Some(from_node)))
    }

    /// Extends `tree` along `segment` in planner steps.
    ///
    /// Returns:
    /// The last inserted node, or None if the end of the segment was not reachable.
    pub fn raster_path(&self, tree: &mut KdTree, segment: &LineSegment, last_node: usize) -> Option<usize> {
        let steps = (segment.length() / self.config.step_size).ceil() as usize;
        let mut last_node = last_node;
        for _ in 0..steps {
            last_node = self.extend(tree, last_node, segment.end())?;
        }
        Some(last_node)
    }

    /// Binary search for the point farthest along `segment` that is reachable from its start.
    pub fn find_valid_point(&self, segment: &LineSegment) -> Vector {
        let line_start = segment.start();
        let mut start = line_start;
        let mut end = segment.end();
        let mut dist = start.distance(&end);

        for _ in 0..self.config.valid_point_iterations {
            if dist <= self.config.valid_point_tolerance {
                break;
            }
            let mid = (start + end) / 2.0;
            if self.world.point_in_playfield(mid, self.world.radius())
                && self.world.is_edge_valid(&line_start, &mid)
            {
                start = mid;
            } else {
                end = mid;
            }
            dist /= 2.0;
        }

        (start + end) / 2.0
    }

    /// Removes every point that can be skipped by a direct connection.
    ///
    /// Segments starting at a point that still lies inside the start obstacles use
    /// the relaxed obstacle exit check, all later ones a plain clearance test.
    pub fn simplify(&self, points: &mut Vec<Vector>) {
        // every point before this index is inside the start obstacles
        let mut split = points
            .iter()
            .position(|p| self.world.is_state_valid(p))
            .unwrap_or(points.len());

        let mut start_index = 0;
        while start_index < points.len() {
            let mut end_index = points.len() - 1;
            while end_index > start_index + 1 {
                // common point of start and end tree, drop the loop in between
                if points[start_index] == points[end_index] {
                    split -= split.saturating_sub(start_index).min(end_index - start_index);
                    points.drain(start_index..end_index);
                    break;
                }

                let shortcut = LineSegment::new(points[start_index], points[end_index])
                    .map(|segment| {
                        if start_index < split {
                            self.world.check_movement_relative_to_obstacles(&segment)
                        } else {
                            self.world.segment_clear(&segment)
                        }
                    })
                    .unwrap_or(false);
                if shortcut {
                    split -= split
                        .saturating_sub(start_index + 1)
                        .min(end_index - start_index - 1);
                    points.drain(start_index + 1..end_index);
                    break;
                }
                end_index -= 1;
            }
            start_index += 1;
        }
    }

    /// Replaces corners by two points on the adjacent edges where the cut is collision free.
    ///
    /// The cut distance is found by a binary search on the shorter adjacent edge.
    /// Playfield containment is not checked, so paths into the playfield can be smoothed.
    pub fn cut_corners(&self, points: &mut Vec<Vector>) {
        let mut i = 1;
        while i + 1 < points.len() {
            let left = points[i - 1];
            let mid = points[i];
            let right = points[i + 1];

            let diff_left = left - mid;
            let diff_right = right - mid;
            let mut step = diff_left.length().min(diff_right.length());
            let dir_left = diff_left.normalized();
            let dir_right = diff_right.normalized();

            // the first probe is in the middle of the edge
            step /= 2.0;
            let mut dist = step;
            let mut last_good = 0.0;
            while step > self.config.corner_cut_tolerance {
                let cut_left = mid + dir_left * dist;
                let cut_right = mid + dir_right * dist;
                step /= 2.0;
                if self.world.is_edge_valid(&cut_left, &cut_right) {
                    last_good = dist;
                    dist += step;
                } else {
                    dist -= step;
                }
            }

            if last_good > 0.0 {
                points[i] = mid + dir_left * last_good;
                i += 1;
                points.insert(i, mid + dir_right * last_good);
            }
            i += 1;
        }
    }
}
