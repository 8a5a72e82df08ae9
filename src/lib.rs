//! Path planning and radio protocol core of a small-size league robot soccer team.
//!
//! - [`rrt`]: bidirectional RRT path planner on a static 2D world.
//! - [`radio`]: robot command packing, telemetry decoding and transceiver framing.

pub mod config;
pub mod error;
pub mod geometry;
pub mod obstacles;
pub mod radio;
pub mod rrt;

pub use config::{Config, PlannerConfig, RadioConfig};
pub use error::{Error, Result};
