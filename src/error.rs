/// Errors reported by the planner, the radio codec and the configuration loader.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid robot radius {0}, the radius must not be negative")]
    InvalidRadius(f32),

    #[error("Invalid sampling probabilities p_dest={p_dest}, p_wp={p_wp}")]
    InvalidProbabilities { p_dest: f32, p_wp: f32 },

    #[error("Robot id {0} is outside of the unicast range 0..=15")]
    InvalidRobotId(u32),

    #[error("Unsupported robot generation {0}")]
    UnsupportedGeneration(u32),

    #[error("Transceiver protocol version mismatch: expected {expected}, got {actual}")]
    ProtocolVersion { expected: u16, actual: u16 },

    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
