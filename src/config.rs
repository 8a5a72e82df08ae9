use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning parameters of the bidirectional RRT planner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Probability of sampling the root of the opposite tree.
    pub p_dest: f32,
    /// Probability of sampling a cached waypoint.
    pub p_wp: f32,
    /// Maximum distance a single extension may cover.
    pub step_size: f32,
    /// Capacity of the waypoint cache.
    pub cache_size: usize,
    /// Number of growth iterations before giving up on merging the trees.
    pub max_iterations: usize,
    /// Extensions of the second tree towards a freshly added node.
    pub extend_multi_steps: usize,
    /// Distance below which the two trees count as connected.
    pub merge_tolerance: f32,
    /// Rounds of `simplify` + `cut_corners` before the final `simplify`.
    pub smoothing_rounds: usize,
    pub valid_point_iterations: usize,
    pub valid_point_tolerance: f32,
    pub corner_cut_tolerance: f32,
    /// Number of samples taken along a spline by the spline check.
    pub spline_steps: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            p_dest: 0.1,
            p_wp: 0.4,
            step_size: 0.1,
            cache_size: 100,
            max_iterations: 200,
            extend_multi_steps: 4,
            merge_tolerance: 1e-5,
            smoothing_rounds: 3,
            valid_point_iterations: 100,
            valid_point_tolerance: 1e-3,
            corner_cut_tolerance: 0.01,
            spline_steps: 10,
        }
    }
}

/// Link budget and transport parameters of the radio codec.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// USB transfer chunk size. Buffers of an exact multiple get a padding ping.
    pub transfer_chunk_size: usize,
    pub usb_transfer_time_us: i64,
    pub nrf_startup_time_us: i64,
    pub nrf_header_bits: i64,
    pub bit_transfer_time_us: i64,
    /// Upper bound for the measured processing delay, larger values are outliers.
    pub max_processing_delay_us: i64,
    pub default_channel: u8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            transfer_chunk_size: 64,
            usb_transfer_time_us: 250,
            nrf_startup_time_us: 130,
            nrf_header_bits: 65,
            bit_transfer_time_us: 1,
            max_processing_delay_us: 2000,
            default_channel: 10,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub planner: PlannerConfig,
    pub radio: RadioConfig,
}

impl Config {
    /// Parses a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
