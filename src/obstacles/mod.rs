pub mod analytic_obstacle;
pub mod capsule_obstacle;
pub mod circle_obstacle;
pub mod obstacle;
pub mod rectangular_obstacle;

pub use analytic_obstacle::AnalyticObstacle;
pub use capsule_obstacle::CapsuleObstacle;
pub use circle_obstacle::CircleObstacle;
pub use obstacle::Obstacle;
pub use rectangular_obstacle::RectangularObstacle;
