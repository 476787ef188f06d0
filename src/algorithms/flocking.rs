use crate::error::{FlockError, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DOMAIN_RADIUS: f64 = 10.0;

pub const DEFAULT_COHESION_RADIUS: f64 = 3.0;
pub const DEFAULT_AVOIDANCE_RADIUS: f64 = 1.0;
pub const DEFAULT_ALIGNMENT_RADIUS: f64 = 3.0;
pub const DEFAULT_PREDATOR_AVOIDANCE_RADIUS: f64 = 4.0;
pub const DEFAULT_HUNT_RADIUS: f64 = 6.0;
pub const DEFAULT_TERMINAL_HUNT_RADIUS: f64 = 1.5;

pub const DEFAULT_COHESION_WEIGHT: f64 = 1.0;
pub const DEFAULT_AVOIDANCE_WEIGHT: f64 = 1.5;
pub const DEFAULT_ALIGNMENT_WEIGHT: f64 = 1.0;
pub const DEFAULT_BOUNDS_WEIGHT: f64 = 2.0;
pub const DEFAULT_PREDATOR_AVOIDANCE_WEIGHT: f64 = 3.0;
pub const DEFAULT_HUNT_WEIGHT: f64 = 1.0;
pub const DEFAULT_TERMINAL_HUNT_WEIGHT: f64 = 2.0;
pub const DEFAULT_PREDATOR_BOUNDS_WEIGHT: f64 = 2.0;

pub const DEFAULT_MIN_SPEED: f64 = 1.0;
pub const DEFAULT_MAX_SPEED: f64 = 3.0;
pub const DEFAULT_MIN_SPEED_PREDATOR: f64 = 1.5;
pub const DEFAULT_MAX_SPEED_PREDATOR: f64 = 4.5;
pub const DEFAULT_PREDATOR_SPEED_FACTOR: f64 = 1.5;

pub const DEFAULT_KILL_DISTANCE: f64 = 0.5;
pub const DEFAULT_MAX_NEIGHBORS: usize = 50;

/// Fraction of the domain radius past which the containment force engages.
pub const BOUNDS_THRESHOLD: f64 = 0.9;

/// Shared simulation parameters for one flock.
///
/// Radii are detection distances (compared squared), weights scale the unit
/// steering vectors before they are summed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockParams {
    pub domain_center: [f64; 3],
    pub domain_radius: f64,

    pub cohesion_radius: f64,
    pub avoidance_radius: f64,
    pub alignment_radius: f64,
    pub predator_avoidance_radius: f64,
    pub hunt_radius: f64,
    pub terminal_hunt_radius: f64,

    pub cohesion_weight: f64,
    pub avoidance_weight: f64,
    pub alignment_weight: f64,
    pub bounds_weight: f64,
    pub predator_avoidance_weight: f64,
    pub hunt_weight: f64,
    pub terminal_hunt_weight: f64,
    /// Containment weight for predators; independent of `bounds_weight`.
    pub predator_bounds_weight: f64,

    pub min_speed: f64,
    pub max_speed: f64,
    pub min_speed_predator: f64,
    pub max_speed_predator: f64,
    /// Predators chase at this multiple of the average prey speed.
    pub predator_speed_factor: f64,

    pub kill_distance: f64,
    /// Upper bound on each neighbor list. Candidates past the cap are dropped
    /// in scan order.
    pub max_neighbors: usize,
}

impl Default for FlockParams {
    fn default() -> Self {
        Self {
            domain_center: [0.0, 0.0, 0.0],
            domain_radius: DEFAULT_DOMAIN_RADIUS,
            cohesion_radius: DEFAULT_COHESION_RADIUS,
            avoidance_radius: DEFAULT_AVOIDANCE_RADIUS,
            alignment_radius: DEFAULT_ALIGNMENT_RADIUS,
            predator_avoidance_radius: DEFAULT_PREDATOR_AVOIDANCE_RADIUS,
            hunt_radius: DEFAULT_HUNT_RADIUS,
            terminal_hunt_radius: DEFAULT_TERMINAL_HUNT_RADIUS,
            cohesion_weight: DEFAULT_COHESION_WEIGHT,
            avoidance_weight: DEFAULT_AVOIDANCE_WEIGHT,
            alignment_weight: DEFAULT_ALIGNMENT_WEIGHT,
            bounds_weight: DEFAULT_BOUNDS_WEIGHT,
            predator_avoidance_weight: DEFAULT_PREDATOR_AVOIDANCE_WEIGHT,
            hunt_weight: DEFAULT_HUNT_WEIGHT,
            terminal_hunt_weight: DEFAULT_TERMINAL_HUNT_WEIGHT,
            predator_bounds_weight: DEFAULT_PREDATOR_BOUNDS_WEIGHT,
            min_speed: DEFAULT_MIN_SPEED,
            max_speed: DEFAULT_MAX_SPEED,
            min_speed_predator: DEFAULT_MIN_SPEED_PREDATOR,
            max_speed_predator: DEFAULT_MAX_SPEED_PREDATOR,
            predator_speed_factor: DEFAULT_PREDATOR_SPEED_FACTOR,
            kill_distance: DEFAULT_KILL_DISTANCE,
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
        }
    }
}

impl FlockParams {
    pub fn domain_center(&self) -> Vector3<f64> {
        Vector3::from(self.domain_center)
    }

    /// Check every invariant the per-frame math relies on.
    pub fn validate(&self) -> Result<()> {
        if !self.domain_center.iter().all(|c| c.is_finite()) {
            return Err(invalid("domain_center must be finite"));
        }
        if !self.domain_radius.is_finite() || self.domain_radius <= 0.0 {
            return Err(invalid("domain_radius must be positive"));
        }

        let non_negative = [
            ("cohesion_radius", self.cohesion_radius),
            ("avoidance_radius", self.avoidance_radius),
            ("alignment_radius", self.alignment_radius),
            ("predator_avoidance_radius", self.predator_avoidance_radius),
            ("hunt_radius", self.hunt_radius),
            ("terminal_hunt_radius", self.terminal_hunt_radius),
            ("cohesion_weight", self.cohesion_weight),
            ("avoidance_weight", self.avoidance_weight),
            ("alignment_weight", self.alignment_weight),
            ("bounds_weight", self.bounds_weight),
            ("predator_avoidance_weight", self.predator_avoidance_weight),
            ("hunt_weight", self.hunt_weight),
            ("terminal_hunt_weight", self.terminal_hunt_weight),
            ("predator_bounds_weight", self.predator_bounds_weight),
            ("min_speed", self.min_speed),
            ("max_speed", self.max_speed),
            ("min_speed_predator", self.min_speed_predator),
            ("max_speed_predator", self.max_speed_predator),
            ("kill_distance", self.kill_distance),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(&format!("{} must be finite and >= 0 (got {})", name, value)));
            }
        }

        if self.min_speed > self.max_speed {
            return Err(invalid(&format!(
                "min_speed {} exceeds max_speed {}",
                self.min_speed, self.max_speed
            )));
        }
        if self.min_speed_predator > self.max_speed_predator {
            return Err(invalid(&format!(
                "min_speed_predator {} exceeds max_speed_predator {}",
                self.min_speed_predator, self.max_speed_predator
            )));
        }
        if !self.predator_speed_factor.is_finite() || self.predator_speed_factor <= 0.0 {
            return Err(invalid("predator_speed_factor must be positive"));
        }
        if self.max_neighbors == 0 {
            return Err(invalid("max_neighbors must be at least 1"));
        }
        Ok(())
    }

    /// Squared detection radii, precomputed once per frame.
    pub fn radii_sq(&self) -> DetectionRadii {
        DetectionRadii {
            cohesion: self.cohesion_radius * self.cohesion_radius,
            avoidance: self.avoidance_radius * self.avoidance_radius,
            alignment: self.alignment_radius * self.alignment_radius,
            predator_avoidance: self.predator_avoidance_radius * self.predator_avoidance_radius,
            hunt: self.hunt_radius * self.hunt_radius,
            terminal_hunt: self.terminal_hunt_radius * self.terminal_hunt_radius,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionRadii {
    pub cohesion: f64,
    pub avoidance: f64,
    pub alignment: f64,
    pub predator_avoidance: f64,
    pub hunt: f64,
    pub terminal_hunt: f64,
}

fn invalid(msg: &str) -> FlockError {
    FlockError::InvalidConfig(msg.to_string())
}
