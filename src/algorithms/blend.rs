use crate::algorithms::flocking::{DetectionRadii, FlockParams};
use crate::algorithms::neighbors::{find_flock_neighbors, within_radius};
use crate::algorithms::predator::evaluate_predator;
use crate::algorithms::steering;
use crate::models::population::Species;
use crate::sim::{KillRequest, Snapshot, SteeringResult};
use nalgebra::Vector3;

/// Unweighted steering contributions for one agent. Behaviors that do not
/// apply to the agent's species stay zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringVectors {
    pub cohesion: Vector3<f64>,
    pub avoidance: Vector3<f64>,
    pub alignment: Vector3<f64>,
    pub bounds: Vector3<f64>,
    pub predator_avoidance: Vector3<f64>,
    pub hunt: Vector3<f64>,
    pub terminal_hunt: Vector3<f64>,
}

impl Default for SteeringVectors {
    fn default() -> Self {
        Self {
            cohesion: Vector3::zeros(),
            avoidance: Vector3::zeros(),
            alignment: Vector3::zeros(),
            bounds: Vector3::zeros(),
            predator_avoidance: Vector3::zeros(),
            hunt: Vector3::zeros(),
            terminal_hunt: Vector3::zeros(),
        }
    }
}

/// Speed limits and chase multiplier of one species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedProfile {
    pub min: f64,
    pub max: f64,
    pub factor: f64,
}

impl SpeedProfile {
    pub fn for_species(species: Species, params: &FlockParams) -> Self {
        match species {
            Species::Ordinary => Self {
                min: params.min_speed,
                max: params.max_speed,
                factor: 1.0,
            },
            Species::Predator => Self {
                min: params.min_speed_predator,
                max: params.max_speed_predator,
                factor: params.predator_speed_factor,
            },
        }
    }
}

/// Weighted sum of the behaviors that apply to `species`.
///
/// Left unnormalized; the motion integrator owns normalization and smoothing.
pub fn blend_heading(species: Species, v: &SteeringVectors, params: &FlockParams) -> Vector3<f64> {
    match species {
        Species::Ordinary => {
            v.cohesion * params.cohesion_weight
                + v.avoidance * params.avoidance_weight
                + v.alignment * params.alignment_weight
                + v.bounds * params.bounds_weight
                + v.predator_avoidance * params.predator_avoidance_weight
        }
        Species::Predator => {
            v.bounds * params.predator_bounds_weight
                + v.hunt * params.hunt_weight
                + v.terminal_hunt * params.terminal_hunt_weight
        }
    }
}

/// Mean speed of `neighbors` times the species factor, clamped to the
/// species bounds. An empty set carries `current` forward (still clamped).
pub fn resolve_speed(
    species: Species,
    current: f64,
    speeds: &[f64],
    neighbors: &[usize],
    params: &FlockParams,
) -> f64 {
    let profile = SpeedProfile::for_species(species, params);
    let proposed = if neighbors.is_empty() {
        current
    } else {
        let sum: f64 = neighbors.iter().map(|&j| speeds[j]).sum();
        sum / neighbors.len() as f64 * profile.factor
    };
    let speed = if proposed.is_finite() {
        proposed
    } else if current.is_finite() {
        current
    } else {
        profile.min
    };
    speed.clamp(profile.min, profile.max)
}

/// Outcome of evaluating one agent against a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub result: SteeringResult,
    pub vectors: SteeringVectors,
    pub kill: Option<KillRequest>,
}

/// Species dispatch: `index` addresses the ordinary or predator columns of
/// the snapshot depending on `species`.
pub fn evaluate(
    species: Species,
    index: usize,
    snapshot: &Snapshot,
    params: &FlockParams,
    radii: &DetectionRadii,
) -> Evaluation {
    match species {
        Species::Ordinary => evaluate_ordinary(index, snapshot, params, radii),
        Species::Predator => evaluate_predator(index, snapshot, params, radii),
    }
}

pub fn evaluate_ordinary(
    index: usize,
    snapshot: &Snapshot,
    params: &FlockParams,
    radii: &DetectionRadii,
) -> Evaluation {
    let positions = snapshot.positions();
    let origin = positions[index];
    let neighbors = find_flock_neighbors(index, positions, radii, params.max_neighbors);
    let predators = within_radius(
        &origin,
        snapshot.predator_positions(),
        radii.predator_avoidance,
        params.max_neighbors,
    );

    let vectors = SteeringVectors {
        cohesion: steering::cohesion(&origin, positions, &neighbors.cohesion),
        avoidance: steering::avoidance(&origin, positions, &neighbors.avoidance),
        alignment: steering::alignment(
            &snapshot.headings()[index],
            snapshot.headings(),
            &neighbors.alignment,
        ),
        bounds: steering::bounds(&origin, &params.domain_center(), params.domain_radius),
        predator_avoidance: steering::predator_avoidance(
            &origin,
            snapshot.predator_positions(),
            &predators,
        ),
        ..SteeringVectors::default()
    };

    let heading = blend_heading(Species::Ordinary, &vectors, params);
    let speed = resolve_speed(
        Species::Ordinary,
        snapshot.speeds()[index],
        snapshot.speeds(),
        &neighbors.cohesion,
        params,
    );

    Evaluation {
        result: SteeringResult { heading, speed },
        vectors,
        kill: None,
    }
}
