use crate::algorithms::flocking::DetectionRadii;
use nalgebra::Vector3;

/// Neighbor index lists of one ordinary agent, one per flocking radius.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlockNeighbors {
    pub cohesion: Vec<usize>,
    pub avoidance: Vec<usize>,
    pub alignment: Vec<usize>,
}

/// Scan every other agent once and sort it into the cohesion, avoidance and
/// alignment lists. A candidate qualifies when its squared distance is
/// strictly below the squared radius. Each list stops growing at `cap`;
/// which candidates make it in is decided by scan order.
pub fn find_flock_neighbors(
    index: usize,
    positions: &[Vector3<f64>],
    radii: &DetectionRadii,
    cap: usize,
) -> FlockNeighbors {
    let origin = positions[index];
    let reserve = cap.min(positions.len().saturating_sub(1));
    let mut out = FlockNeighbors {
        cohesion: Vec::with_capacity(reserve),
        avoidance: Vec::with_capacity(reserve),
        alignment: Vec::with_capacity(reserve),
    };

    for (i, p) in positions.iter().enumerate() {
        if i == index {
            continue;
        }
        let dist2 = (p - origin).norm_squared();
        if dist2 < radii.cohesion && out.cohesion.len() < cap {
            out.cohesion.push(i);
        }
        if dist2 < radii.avoidance && out.avoidance.len() < cap {
            out.avoidance.push(i);
        }
        if dist2 < radii.alignment && out.alignment.len() < cap {
            out.alignment.push(i);
        }
    }
    out
}

/// Indices of `candidates` strictly inside `radius_sq` of `origin`, capped.
///
/// Used across species (prey looking for predators, predators looking for
/// prey), so no self index is skipped.
pub fn within_radius(
    origin: &Vector3<f64>,
    candidates: &[Vector3<f64>],
    radius_sq: f64,
    cap: usize,
) -> Vec<usize> {
    let mut out = Vec::new();
    for (i, p) in candidates.iter().enumerate() {
        if out.len() >= cap {
            break;
        }
        if (p - origin).norm_squared() < radius_sq {
            out.push(i);
        }
    }
    out
}

/// Closest candidate strictly inside `radius_sq`, with its squared distance.
/// Ties keep the earliest index.
pub fn nearest_within(
    origin: &Vector3<f64>,
    candidates: &[Vector3<f64>],
    radius_sq: f64,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in candidates.iter().enumerate() {
        let dist2 = (p - origin).norm_squared();
        if dist2.is_nan() || dist2 >= radius_sq {
            continue;
        }
        match best {
            Some((_, best_dist2)) if dist2 >= best_dist2 => {}
            _ => best = Some((i, dist2)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radii(cohesion: f64, avoidance: f64, alignment: f64) -> DetectionRadii {
        DetectionRadii {
            cohesion: cohesion * cohesion,
            avoidance: avoidance * avoidance,
            alignment: alignment * alignment,
            predator_avoidance: 0.0,
            hunt: 0.0,
            terminal_hunt: 0.0,
        }
    }

    fn line(n: usize) -> Vec<Vector3<f64>> {
        (0..n).map(|i| Vector3::new(i as f64, 0.0, 0.0)).collect()
    }

    #[test]
    fn middle_agent_sees_both_ends() {
        let positions = line(3);
        let n = find_flock_neighbors(1, &positions, &radii(3.0, 1.5, 3.0), 50);
        assert_eq!(n.cohesion, vec![0, 2]);
        assert_eq!(n.avoidance, vec![0, 2]);
        assert_eq!(n.alignment, vec![0, 2]);
    }

    #[test]
    fn boundary_distance_is_excluded() {
        let positions = line(3);
        // distance exactly 1.0 does not satisfy d^2 < r^2 with r = 1.0
        let n = find_flock_neighbors(0, &positions, &radii(1.0, 1.0, 1.0), 50);
        assert!(n.cohesion.is_empty());
        assert!(n.avoidance.is_empty());
    }

    #[test]
    fn cap_keeps_first_candidates_in_scan_order() {
        let mut positions = vec![Vector3::zeros()];
        positions.extend((0..60).map(|i| Vector3::new(0.01 * i as f64, 0.1, 0.0)));
        let n = find_flock_neighbors(0, &positions, &radii(3.0, 3.0, 3.0), 50);
        assert_eq!(n.cohesion.len(), 50);
        assert_eq!(n.cohesion, (1..=50).collect::<Vec<_>>());
        assert_eq!(n.avoidance.len(), 50);
        assert_eq!(n.alignment.len(), 50);
    }

    #[test]
    fn avoidance_lists_are_symmetric() {
        let positions = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.7, 0.2, 0.0),
            Vector3::new(2.5, 0.0, 0.0),
            Vector3::new(0.1, -0.6, 0.3),
        ];
        let r = radii(1.0, 1.0, 1.0);
        let lists: Vec<_> = (0..positions.len())
            .map(|i| find_flock_neighbors(i, &positions, &r, 50).avoidance)
            .collect();
        for a in 0..positions.len() {
            for b in 0..positions.len() {
                assert_eq!(lists[a].contains(&b), lists[b].contains(&a), "pair ({a}, {b})");
            }
        }
    }

    #[test]
    fn nan_candidates_never_qualify() {
        let positions = vec![Vector3::zeros(), Vector3::new(f64::NAN, 0.0, 0.0)];
        let n = find_flock_neighbors(0, &positions, &radii(5.0, 5.0, 5.0), 50);
        assert!(n.cohesion.is_empty());
        assert!(nearest_within(&Vector3::zeros(), &positions[1..], 25.0).is_none());
    }

    #[test]
    fn within_radius_respects_cap() {
        let candidates = line(10);
        let found = within_radius(&Vector3::zeros(), &candidates, 100.0, 4);
        assert_eq!(found, vec![0, 1, 2, 3]);
    }

    #[test]
    fn nearest_picks_closest_and_first_on_ties() {
        let candidates = vec![
            Vector3::new(3.0, 0.0, 0.0),
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
        ];
        assert_eq!(nearest_within(&Vector3::zeros(), &candidates, 16.0), Some((1, 1.0)));
        assert_eq!(nearest_within(&Vector3::zeros(), &candidates, 0.5), None);
    }
}
