//! Pure steering functions. Each returns a unit vector or exactly zero,
//! except alignment, which falls back to the agent's own heading.

use crate::algorithms::flocking::BOUNDS_THRESHOLD;
use nalgebra::Vector3;

const MIN_NORM: f64 = 1.0e-12;

/// Unit vector along `v`, or zero when `v` is degenerate or not finite.
pub fn normalize_or_zero(v: Vector3<f64>) -> Vector3<f64> {
    if !v.iter().all(|c| c.is_finite()) {
        return Vector3::zeros();
    }
    v.try_normalize(MIN_NORM).unwrap_or_else(Vector3::zeros)
}

/// Toward the average position of the cohesion neighbors.
pub fn cohesion(
    origin: &Vector3<f64>,
    positions: &[Vector3<f64>],
    neighbors: &[usize],
) -> Vector3<f64> {
    if neighbors.is_empty() {
        return Vector3::zeros();
    }
    let mut center = Vector3::zeros();
    for &j in neighbors {
        center += positions[j];
    }
    center /= neighbors.len() as f64;
    normalize_or_zero(center - origin)
}

/// Away from the average offset of the avoidance neighbors.
pub fn avoidance(
    origin: &Vector3<f64>,
    positions: &[Vector3<f64>],
    neighbors: &[usize],
) -> Vector3<f64> {
    flee(origin, positions, neighbors)
}

/// Average heading of the neighbors and the agent itself.
pub fn alignment(
    own_heading: &Vector3<f64>,
    headings: &[Vector3<f64>],
    neighbors: &[usize],
) -> Vector3<f64> {
    let own = normalize_or_zero(*own_heading);
    if neighbors.is_empty() {
        return own;
    }
    let mut sum = own;
    for &j in neighbors {
        sum += normalize_or_zero(headings[j]);
    }
    sum /= (neighbors.len() + 1) as f64;
    match sum.try_normalize(MIN_NORM) {
        Some(v) if v.iter().all(|c| c.is_finite()) => v,
        // opposing headings cancelled out
        _ => own,
    }
}

/// Soft containment: toward the domain center once past 90% of the radius.
pub fn bounds(origin: &Vector3<f64>, center: &Vector3<f64>, domain_radius: f64) -> Vector3<f64> {
    let to_center = center - origin;
    if to_center.norm() > domain_radius * BOUNDS_THRESHOLD {
        normalize_or_zero(to_center)
    } else {
        Vector3::zeros()
    }
}

/// Away from the average offset of nearby predators.
pub fn predator_avoidance(
    origin: &Vector3<f64>,
    predator_positions: &[Vector3<f64>],
    predators: &[usize],
) -> Vector3<f64> {
    flee(origin, predator_positions, predators)
}

/// Toward the average offset of prey inside the hunt radius.
pub fn hunt(
    origin: &Vector3<f64>,
    prey_positions: &[Vector3<f64>],
    prey: &[usize],
) -> Vector3<f64> {
    -flee(origin, prey_positions, prey)
}

/// Straight at a single target, used for the final approach.
pub fn terminal_hunt(origin: &Vector3<f64>, target: Option<&Vector3<f64>>) -> Vector3<f64> {
    match target {
        Some(target) => normalize_or_zero(target - origin),
        None => Vector3::zeros(),
    }
}

fn flee(origin: &Vector3<f64>, positions: &[Vector3<f64>], others: &[usize]) -> Vector3<f64> {
    if others.is_empty() {
        return Vector3::zeros();
    }
    let mut offset = Vector3::zeros();
    for &j in others {
        offset += origin - positions[j];
    }
    offset /= others.len() as f64;
    normalize_or_zero(offset)
}
