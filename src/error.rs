use thiserror::Error;

/// Errors surfaced by configuration loading and the frame driver.
///
/// The per-frame math itself never fails; degenerate inputs fall back to
/// defined defaults inside the steering functions.
#[derive(Debug, Error)]
pub enum FlockError {
    /// A configuration value breaks one of the parameter invariants.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown scenario id '{0}'")]
    UnknownScenario(String),
    #[error("agent handle does not refer to a living agent")]
    UnknownAgent,
    /// `apply_frame` received results computed for a different frame.
    #[error("frame results out of order: expected frame {expected}, got {actual}")]
    FrameOutOfOrder { expected: u64, actual: u64 },
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlockError>;
