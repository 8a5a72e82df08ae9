pub mod debug;
pub mod kdtree;
pub mod path;
pub mod sampling;
pub mod spline;
pub mod validity_checker;
pub mod world;

pub use kdtree::KdTree;
pub use path::{Path, Waypoint};
pub use sampling::{TargetSampler, WaypointCache};
pub use spline::{CubicPolynomial, Spline};
pub use validity_checker::ValidityChecker;
pub use world::{Boundary, World};
