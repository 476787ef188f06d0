use crate::algorithms::flocking::FlockParams;
use crate::algorithms::scheduler::{DEFAULT_CHUNK_SIZE, ExecutionMode};
use crate::error::{FlockError, Result};
use crate::integrator::DEFAULT_SMOOTH_TIME;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub const DEFAULT_BOIDS: usize = 300;
pub const DEFAULT_PREDATORS: usize = 0;
pub const DEFAULT_SEED: u64 = 0x5EED_B01D_2024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub boids: usize,
    pub predators: usize,
    pub seed: u64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            boids: DEFAULT_BOIDS,
            predators: DEFAULT_PREDATORS,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub chunk_size: usize,
    pub mode: ExecutionMode,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            mode: ExecutionMode::Parallel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Heading damping time constant in seconds.
    pub smooth_time: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            smooth_time: DEFAULT_SMOOTH_TIME,
        }
    }
}

/// Everything needed to build an [`Engine`](crate::engine::Engine).
///
/// ```json
/// {
///   "params": { "domain_radius": 12.0, "kill_distance": 0.4 },
///   "population": { "boids": 800, "predators": 2, "seed": 7 },
///   "scheduler": { "chunk_size": 64, "mode": "parallel" },
///   "motion": { "smooth_time": 0.4 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub params: FlockParams,
    pub population: PopulationConfig,
    pub scheduler: SchedulerConfig,
    pub motion: MotionConfig,
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        info!(path = %path.display(), "loaded simulation config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        if self.scheduler.chunk_size == 0 {
            return Err(FlockError::InvalidConfig(
                "scheduler.chunk_size must be at least 1".to_string(),
            ));
        }
        if !self.motion.smooth_time.is_finite() || self.motion.smooth_time <= 0.0 {
            return Err(FlockError::InvalidConfig(
                "motion.smooth_time must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
