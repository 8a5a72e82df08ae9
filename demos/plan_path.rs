use clap::Parser;
use json::object;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use ssl_core::geometry::Vector;
use ssl_core::obstacles::{CapsuleObstacle, CircleObstacle, Obstacle, RectangularObstacle};
use ssl_core::rrt::{Boundary, Path, Waypoint};
use ssl_core::Config;
use std::fs;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(version, about = "Plan paths across a soccer field", long_about = None)]
struct CliArgs {
    /// Directory to save the output files
    #[arg(short, long, default_value = "output/plan_path")]
    output_dir: String,

    /// YAML file with planner settings
    #[arg(short, long)]
    config: Option<String>,

    /// YAML file describing the field, overrides the built-in scenario
    #[arg(short, long)]
    scenario: Option<String>,

    #[arg(long, default_value_t = 20)]
    trials: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PlanningScenario {
    boundary: Boundary,
    radius: f32,
    obstacles: Vec<Obstacle>,
    start: Vector,
    end: Vector,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PlanningRun {
    scenario: PlanningScenario,
    waypoints: Vec<Waypoint>,
    reached_goal: bool,
    planning_time_us: u128,
}

fn default_scenario() -> PlanningScenario {
    let obstacles = vec![
        // defense area
        RectangularObstacle::new(Vector::new(4.0, -1.0), Vector::new(5.0, 1.0)).unwrap().into(),
        // opponents
        CircleObstacle::new(Vector::new(0.0, 0.0), 1.0).unwrap().into(),
        CircleObstacle::new(Vector::new(2.0, 1.5), 0.18).unwrap().into(),
        CircleObstacle::new(Vector::new(2.0, -1.2), 0.18).unwrap().into(),
        // a robot driving along its trajectory
        CapsuleObstacle::new(Vector::new(-2.0, 2.0), Vector::new(-1.0, 3.5), 0.18).unwrap().into(),
    ];
    PlanningScenario {
        boundary: Boundary::new(-5.0, -3.5, 5.0, 3.5),
        radius: 0.09,
        obstacles,
        start: Vector::new(-4.0, -3.0),
        end: Vector::new(3.5, 2.5),
    }
}

fn main() {
    env_logger::init();
    let args: CliArgs = CliArgs::parse();

    let config = match &args.config {
        Some(file) => Config::from_file(file).unwrap(),
        None => Config::default(),
    };
    let scenario = match &args.scenario {
        Some(file) => serde_yaml::from_str(&fs::read_to_string(file).unwrap()).unwrap(),
        None => default_scenario(),
    };

    let mut path = Path::with_config(config.planner).unwrap();
    let boundary = &scenario.boundary;
    path.set_boundary(
        boundary.bottom_left.x,
        boundary.bottom_left.y,
        boundary.top_right.x,
        boundary.top_right.y,
    );
    path.set_radius(scenario.radius);
    for obstacle in &scenario.obstacles {
        path.add_obstacle(obstacle.clone());
    }

    let output_dir = std::path::Path::new(&args.output_dir);
    fs::create_dir_all(output_dir).unwrap();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut trials_json = json::array![];
    for trial in 0..args.trials {
        let started = Instant::now();
        let waypoints = path
            .get(scenario.start.x, scenario.start.y, scenario.end.x, scenario.end.y, &mut rng)
            .unwrap();
        let planning_time_us = started.elapsed().as_micros();
        let reached_goal = waypoints
            .last()
            .map_or(false, |w| w.position().distance(&scenario.end) < 1e-4);

        println!(
            "Trial {:02}: {} waypoints, goal reached: {}, {} us, {} cached waypoints",
            trial,
            waypoints.len(),
            reached_goal,
            planning_time_us,
            path.waypoint_cache().len()
        );

        trials_json
            .push(object! {
                "trial" => trial,
                "reached_goal" => reached_goal,
                "planning_time_us" => planning_time_us as u64,
                "debug" => path.debug_json(),
            })
            .expect("Failed to push trial json.");

        let run = PlanningRun {
            scenario: scenario.clone(),
            waypoints,
            reached_goal,
            planning_time_us,
        };
        let encoded: Vec<u8> = bincode::serialize(&run).unwrap();
        fs::write(output_dir.join(format!("run_{:02}.bin", trial)), encoded).unwrap();
    }

    fs::write(
        output_dir.join("plan_path.json"),
        object! { "trials" => trials_json }.pretty(2),
    )
    .unwrap();
}
