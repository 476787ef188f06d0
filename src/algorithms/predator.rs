use crate::algorithms::blend::{Evaluation, SteeringVectors, blend_heading, resolve_speed};
use crate::algorithms::flocking::{DetectionRadii, FlockParams};
use crate::algorithms::neighbors::{nearest_within, within_radius};
use crate::algorithms::steering;
use crate::models::population::Species;
use crate::sim::{KillRequest, Snapshot, SteeringResult};

/// Hunt logic for predator `index` of the snapshot.
///
/// Pursues the average of prey inside the hunt radius, dives straight at the
/// nearest prey once it is inside the terminal radius, and flags that prey
/// for removal when it is closer than the kill distance. The kill is only
/// reported here; removing the prey is the caller's job.
pub fn evaluate_predator(
    index: usize,
    snapshot: &Snapshot,
    params: &FlockParams,
    radii: &DetectionRadii,
) -> Evaluation {
    let origin = snapshot.predator_positions()[index];
    let current_heading = snapshot.predator_headings()[index];
    let current_speed = snapshot.predator_speeds()[index];
    let prey_positions = snapshot.positions();

    let prey = within_radius(&origin, prey_positions, radii.hunt, params.max_neighbors);
    let nearest = nearest_within(&origin, prey_positions, radii.hunt);

    // own search: the terminal radius may exceed the hunt radius
    let terminal_target = nearest_within(&origin, prey_positions, radii.terminal_hunt)
        .map(|(j, _)| &prey_positions[j]);

    let vectors = SteeringVectors {
        bounds: steering::bounds(&origin, &params.domain_center(), params.domain_radius),
        hunt: steering::hunt(&origin, prey_positions, &prey),
        terminal_hunt: steering::terminal_hunt(&origin, terminal_target),
        ..SteeringVectors::default()
    };

    let mut heading = blend_heading(Species::Predator, &vectors, params);
    if heading.norm_squared() == 0.0 {
        // nothing to chase and inside the domain
        heading = current_heading;
    }
    let speed = resolve_speed(Species::Predator, current_speed, snapshot.speeds(), &prey, params);

    let kill = nearest.and_then(|(prey, dist2)| {
        let distance = dist2.sqrt();
        (distance < params.kill_distance).then_some(KillRequest {
            predator: index,
            prey,
            distance,
        })
    });

    Evaluation {
        result: SteeringResult { heading, speed },
        vectors,
        kill,
    }
}
