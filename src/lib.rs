//! Predator/prey boid flocking core.
//!
//! Each frame reads a frozen [`Snapshot`] of every agent, computes steering
//! for all of them in data-parallel batches, then applies the results and
//! removes killed prey in one pass. See [`engine::Engine`].

pub mod algorithms;
pub mod config;
pub mod engine;
pub mod error;
pub mod integrator;
pub mod models;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use algorithms::flocking::FlockParams;
pub use algorithms::scheduler::{BatchScheduler, ExecutionMode};
pub use config::SimConfig;
pub use engine::{Engine, FramePhase, FrameReport};
pub use error::{FlockError, Result};
pub use models::population::{Agent, AgentId, Population, Species};
pub use sim::{FrameOutput, FrameResults, KillRequest, Snapshot, SteeringResult};
