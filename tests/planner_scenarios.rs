use kiddo::{KdTree as ReferenceTree, SquaredEuclidean};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ssl_core::geometry::{LineSegment, Vector};
use ssl_core::obstacles::AnalyticObstacle;
use ssl_core::rrt::{KdTree, Path, Waypoint};
use ssl_core::PlannerConfig;

const RADIUS: f32 = 0.09;
const EPSILON: f32 = 1e-4;

fn field_planner() -> Path {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut path = Path::new();
    path.set_boundary(-5.0, -5.0, 5.0, 5.0);
    path.set_radius(RADIUS);
    path
}

fn reaches(waypoints: &[Waypoint], goal: Vector) -> bool {
    waypoints
        .last()
        .map_or(false, |w| w.position().distance(&goal) < EPSILON)
}

#[test]
fn empty_field_gives_direct_path() {
    let mut path = field_planner();
    let mut rng = StdRng::seed_from_u64(1);
    let waypoints = path.get(-4.0, -4.0, 4.0, 4.0, &mut rng).unwrap();

    let positions: Vec<Vector> = waypoints.iter().map(Waypoint::position).collect();
    assert_eq!(positions, vec![Vector::new(-4.0, -4.0), Vector::new(4.0, 4.0)]);
    // the direct line was rasterized in 0.1 steps
    assert!(path.tree_start().unwrap().len() >= 113);
}

#[test]
fn circle_in_the_way_is_avoided() {
    let _ = env_logger::builder().is_test(true).try_init();
    // one search from an empty waypoint cache
    let config = PlannerConfig {
        max_iterations: 2000,
        ..Default::default()
    };
    let mut path = Path::with_config(config).unwrap();
    path.set_boundary(-5.0, -5.0, 5.0, 5.0);
    path.set_radius(RADIUS);
    path.add_circle(0.0, 0.0, 1.0).unwrap();
    let start = Vector::new(-4.0, -4.0);
    let goal = Vector::new(4.0, 4.0);
    let mut rng = StdRng::seed_from_u64(42);

    let waypoints = path.get(start.x, start.y, goal.x, goal.y, &mut rng).unwrap();
    assert!(reaches(&waypoints, goal));

    assert_eq!(waypoints[0].position(), start);
    // the straight line crosses the circle
    assert!(waypoints.len() >= 3);

    let world = path.world();
    for obstacle in world.obstacles() {
        for waypoint in &waypoints {
            assert!(obstacle.distance(waypoint.position()) >= RADIUS - EPSILON);
            assert!(world.point_in_playfield(waypoint.position(), RADIUS));
        }
        for pair in waypoints.windows(2) {
            let segment = LineSegment::new(pair[0].position(), pair[1].position()).unwrap();
            assert!(obstacle.distance_to_segment(&segment) >= RADIUS - EPSILON);
        }
    }
}

#[test]
fn start_inside_obstacle_escapes_with_decreasing_coverage() {
    let mut path = field_planner();
    path.add_circle(-3.0, 0.0, 0.5).unwrap();
    let start = Vector::new(-3.1, 0.0);
    let goal = Vector::new(3.0, 0.0);
    let mut rng = StdRng::seed_from_u64(7);

    let waypoints = (0..10)
        .map(|_| path.get(start.x, start.y, goal.x, goal.y, &mut rng).unwrap())
        .find(|waypoints| reaches(waypoints, goal))
        .expect("planner never reached the goal");

    let world = path.world();
    let coverage: Vec<f32> = waypoints
        .iter()
        .map(|w| world.obstacle_coverage(w.position(), RADIUS, world.obstacles()))
        .collect();
    for pair in coverage.windows(2) {
        assert!(pair[1] <= pair[0] + EPSILON);
    }
    assert_eq!(*coverage.last().unwrap(), 0.0);
}

#[test]
fn spline_check_uses_obstacles() {
    let mut path = field_planner();
    path.add_rect(-0.5, -0.5, 0.5, 0.5).unwrap();
    let crossing = ssl_core::rrt::Spline {
        t_start: 0.0,
        t_end: 1.0,
        x: ssl_core::rrt::CubicPolynomial::new(-2.0, 4.0, 0.0, 0.0),
        y: ssl_core::rrt::CubicPolynomial::new(0.0, 0.0, 0.0, 0.0),
    };
    assert!(!path.test_spline(&crossing, RADIUS));

    let passing = ssl_core::rrt::Spline {
        y: ssl_core::rrt::CubicPolynomial::new(2.0, 0.0, 0.0, 0.0),
        ..crossing
    };
    assert!(path.test_spline(&passing, RADIUS));
}

#[test]
fn nearest_neighbor_matches_reference_tree() {
    let mut rng = StdRng::seed_from_u64(99);
    for size in [1usize, 2, 10, 100, 1000] {
        let first = Vector::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
        let mut tree = KdTree::new(first, false);
        let mut reference: ReferenceTree<f32, 2> = ReferenceTree::new();
        reference.add(&[first.x, first.y], 0);
        for i in 1..size {
            let point = Vector::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
            let index = tree.insert(point, false, None);
            assert_eq!(index, i);
            reference.add(&[point.x, point.y], i as u64);
        }

        for _ in 0..200 {
            let query = Vector::new(rng.gen_range(-6.0..6.0), rng.gen_range(-6.0..6.0));
            let ours = tree.position(tree.nearest(query)).distance_squared(&query);
            let expected = reference.nearest_one::<SquaredEuclidean>(&[query.x, query.y]).distance;
            assert!((ours - expected).abs() <= 1e-5, "size {}: {} vs {}", size, ours, expected);
        }
    }
}
