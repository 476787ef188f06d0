use crate::algorithms::flocking::FlockParams;
use crate::sim::Snapshot;
use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use std::collections::HashSet;
use std::f64::consts::PI;

new_key_type! {
    /// Stable handle for agents backed by a generational slot map.
    pub struct AgentId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Species {
    Ordinary,
    Predator,
}

/// Scalar state of one agent, used for insertion and lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub species: Species,
    pub position: Vector3<f64>,
    /// Unit heading. Zero-length input is replaced by +X.
    pub heading: Vector3<f64>,
    pub speed: f64,
}

impl Agent {
    pub fn new(
        species: Species,
        position: Vector3<f64>,
        heading: Vector3<f64>,
        speed: f64,
    ) -> Self {
        let heading = heading.try_normalize(1.0e-12).unwrap_or_else(Vector3::x);
        Self {
            species,
            position,
            heading,
            speed,
        }
    }

    pub fn ordinary(position: Vector3<f64>, heading: Vector3<f64>, speed: f64) -> Self {
        Self::new(Species::Ordinary, position, heading, speed)
    }

    pub fn predator(position: Vector3<f64>, heading: Vector3<f64>, speed: f64) -> Self {
        Self::new(Species::Predator, position, heading, speed)
    }
}

/// Dense per-species columns. Row `i` of every column belongs to `handles[i]`.
#[derive(Debug, Clone, Default)]
pub struct AgentColumns {
    handles: Vec<AgentId>,
    positions: Vec<Vector3<f64>>,
    headings: Vec<Vector3<f64>>,
    speeds: Vec<f64>,
    // damping velocity carried between frames by the motion integrator
    turn_velocities: Vec<Vector3<f64>>,
}

/// Mutable view of a single row, handed to the motion integrator.
pub struct AgentRowMut<'a> {
    pub position: &'a mut Vector3<f64>,
    pub heading: &'a mut Vector3<f64>,
    pub speed: &'a mut f64,
    pub turn_velocity: &'a mut Vector3<f64>,
}

impl AgentColumns {
    pub fn len(&self) -> usize { self.handles.len() }
    pub fn is_empty(&self) -> bool { self.handles.is_empty() }
    pub fn handles(&self) -> &[AgentId] { &self.handles }
    pub fn positions(&self) -> &[Vector3<f64>] { &self.positions }
    pub fn headings(&self) -> &[Vector3<f64>] { &self.headings }
    pub fn speeds(&self) -> &[f64] { &self.speeds }

    pub(crate) fn row_mut(&mut self, i: usize) -> AgentRowMut<'_> {
        AgentRowMut {
            position: &mut self.positions[i],
            heading: &mut self.headings[i],
            speed: &mut self.speeds[i],
            turn_velocity: &mut self.turn_velocities[i],
        }
    }

    fn push(&mut self, id: AgentId, agent: &Agent) {
        self.handles.push(id);
        self.positions.push(agent.position);
        self.headings.push(agent.heading);
        self.speeds.push(agent.speed);
        self.turn_velocities.push(Vector3::zeros());
    }

    fn agent(&self, i: usize, species: Species) -> Agent {
        Agent {
            species,
            position: self.positions[i],
            heading: self.headings[i],
            speed: self.speeds[i],
        }
    }

    fn swap_remove(&mut self, i: usize) -> AgentId {
        self.positions.swap_remove(i);
        self.headings.swap_remove(i);
        self.speeds.swap_remove(i);
        self.turn_velocities.swap_remove(i);
        self.handles.swap_remove(i)
    }

    fn move_row(&mut self, from: usize, to: usize) {
        self.handles[to] = self.handles[from];
        self.positions[to] = self.positions[from];
        self.headings[to] = self.headings[from];
        self.speeds[to] = self.speeds[from];
        self.turn_velocities[to] = self.turn_velocities[from];
    }

    fn truncate(&mut self, len: usize) {
        self.handles.truncate(len);
        self.positions.truncate(len);
        self.headings.truncate(len);
        self.speeds.truncate(len);
        self.turn_velocities.truncate(len);
    }

    fn clear(&mut self) {
        self.truncate(0);
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    species: Species,
    index: usize,
}

/// Living agents of both species, addressed by generational [`AgentId`].
///
/// Ordinary agents and predators live in separate dense columns so a frame
/// snapshot is a plain copy of each column set.
#[derive(Debug, Default)]
pub struct Population {
    slots: SlotMap<AgentId, Slot>,
    boids: AgentColumns,
    predators: AgentColumns,
    // predator handles in insertion order; dense rows get reordered by swap removal
    predator_order: Vec<AgentId>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize { self.slots.len() }
    pub fn is_empty(&self) -> bool { self.slots.is_empty() }
    pub fn boid_count(&self) -> usize { self.boids.len() }
    pub fn predator_count(&self) -> usize { self.predators.len() }
    pub fn boids(&self) -> &AgentColumns { &self.boids }
    pub fn predators(&self) -> &AgentColumns { &self.predators }

    pub fn columns(&self, species: Species) -> &AgentColumns {
        match species {
            Species::Ordinary => &self.boids,
            Species::Predator => &self.predators,
        }
    }

    pub(crate) fn columns_mut(&mut self, species: Species) -> &mut AgentColumns {
        match species {
            Species::Ordinary => &mut self.boids,
            Species::Predator => &mut self.predators,
        }
    }

    pub fn insert(&mut self, agent: Agent) -> AgentId {
        let index = self.columns(agent.species).len();
        let id = self.slots.insert(Slot {
            species: agent.species,
            index,
        });
        self.columns_mut(agent.species).push(id, &agent);
        if agent.species == Species::Predator {
            self.predator_order.push(id);
        }
        id
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.slots.contains_key(id)
    }

    /// Species and dense row of `id`, if it is alive.
    pub fn index_of(&self, id: AgentId) -> Option<(Species, usize)> {
        self.slots.get(id).map(|slot| (slot.species, slot.index))
    }

    pub fn get(&self, id: AgentId) -> Option<Agent> {
        let (species, index) = self.index_of(id)?;
        Some(self.columns(species).agent(index, species))
    }

    /// O(1) removal; the last row of the species moves into the hole.
    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        let slot = self.slots.remove(id)?;
        if slot.species == Species::Predator {
            self.predator_order.retain(|&p| p != id);
        }
        let columns = self.columns_mut(slot.species);
        let removed = columns.agent(slot.index, slot.species);
        let removed_handle = columns.swap_remove(slot.index);
        debug_assert_eq!(removed_handle, id);
        if slot.index < columns.len() {
            let moved = columns.handles[slot.index];
            if let Some(moved_slot) = self.slots.get_mut(moved) {
                moved_slot.index = slot.index;
            }
        }
        Some(removed)
    }

    /// Remove every id in `dead` in one pass, preserving scan order of the survivors.
    pub fn remove_many(&mut self, dead: &HashSet<AgentId>) -> usize {
        if dead.is_empty() {
            return 0;
        }
        let before = self.len();
        for species in [Species::Ordinary, Species::Predator] {
            let columns = match species {
                Species::Ordinary => &mut self.boids,
                Species::Predator => &mut self.predators,
            };
            let mut write = 0;
            for read in 0..columns.len() {
                let id = columns.handles[read];
                if dead.contains(&id) {
                    self.slots.remove(id);
                    continue;
                }
                if write != read {
                    columns.move_row(read, write);
                }
                if let Some(slot) = self.slots.get_mut(id) {
                    slot.index = write;
                }
                write += 1;
            }
            columns.truncate(write);
        }
        self.predator_order.retain(|p| !dead.contains(p));
        before - self.len()
    }

    /// Most recently inserted predator that is still alive.
    pub fn last_predator(&self) -> Option<AgentId> {
        self.predator_order.last().copied()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.boids.clear();
        self.predators.clear();
        self.predator_order.clear();
    }

    /// Copy last-frame state of every living agent into a frame snapshot.
    pub fn capture_snapshot(&self) -> Snapshot {
        Snapshot::from_columns(&self.boids, &self.predators)
    }

    /// Spawn `boids` ordinary agents and `predators` predators at random
    /// points inside the domain.
    pub fn populate<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        params: &FlockParams,
        boids: usize,
        predators: usize,
    ) {
        self.slots.reserve(boids + predators);
        for _ in 0..boids {
            self.insert(random_agent(rng, params, Species::Ordinary));
        }
        for _ in 0..predators {
            self.insert(random_agent(rng, params, Species::Predator));
        }
    }
}

/// Agent placed uniformly inside the domain sphere, random heading, speed
/// uniform within the species bounds.
pub fn random_agent<R: Rng + ?Sized>(rng: &mut R, params: &FlockParams, species: Species) -> Agent {
    let position = params.domain_center() + random_in_unit_sphere(rng) * params.domain_radius;
    let heading = random_unit_vector(rng);
    let (min, max) = match species {
        Species::Ordinary => (params.min_speed, params.max_speed),
        Species::Predator => (params.min_speed_predator, params.max_speed_predator),
    };
    let speed = rng.gen_range(min..=max);
    Agent::new(species, position, heading, speed)
}

pub fn random_in_unit_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f64> {
    loop {
        let p = Vector3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if p.norm_squared() <= 1.0 {
            return p;
        }
    }
}

pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f64> {
    loop {
        if let Some(v) = random_in_unit_sphere(rng).try_normalize(1.0e-6) {
            return v;
        }
    }
}

/// Deterministic ball of ordinary agents: Fibonacci directions with radii
/// growing by cube root so the ball is filled evenly. Headings circulate
/// around the Z axis.
pub fn fibonacci_ball(count: usize, center: Vector3<f64>, radius: f64, speed: f64) -> Vec<Agent> {
    let mut agents = Vec::with_capacity(count);
    if count == 0 {
        return agents;
    }
    let golden = (1.0 + 5.0_f64.sqrt()) * 0.5;
    let ga = 2.0 - 1.0 / golden;
    for i in 0..count {
        let fi = i as f64 + 0.5;
        let z = 1.0 - (2.0 * fi) / count as f64;
        let r = (1.0 - z * z).max(0.0).sqrt();
        let theta = 2.0 * PI * fi * ga;
        let dir = Vector3::new(theta.cos() * r, theta.sin() * r, z);
        let shell = radius * (fi / count as f64).cbrt();
        let tangent = Vector3::new(-dir.y, dir.x, 0.0);
        let heading = tangent.try_normalize(1.0e-12).unwrap_or_else(Vector3::x);
        agents.push(Agent::ordinary(center + dir * shell, heading, speed));
    }
    agents
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn boid_at(x: f64) -> Agent {
        Agent::ordinary(Vector3::new(x, 0.0, 0.0), Vector3::x(), 1.0)
    }

    #[test]
    fn insert_allocates_unique_handles_per_species() {
        let mut population = Population::new();
        let a = population.insert(boid_at(0.0));
        let b = population.insert(boid_at(1.0));
        let p = population.insert(Agent::predator(Vector3::zeros(), Vector3::y(), 2.0));
        assert_ne!(a, b);
        assert_eq!(population.boid_count(), 2);
        assert_eq!(population.predator_count(), 1);
        assert_eq!(population.index_of(p), Some((Species::Predator, 0)));
        assert_eq!(population.index_of(b), Some((Species::Ordinary, 1)));
    }

    #[test]
    fn remove_keeps_dense_storage_coherent() {
        let mut population = Population::new();
        let a = population.insert(boid_at(0.0));
        let b = population.insert(boid_at(1.0));
        let c = population.insert(boid_at(2.0));

        let removed = population.remove(a).expect("agent removed");
        assert_eq!(removed.position.x, 0.0);
        assert!(!population.contains(a));
        assert_eq!(population.index_of(c), Some((Species::Ordinary, 0)));
        assert_eq!(population.get(c).expect("c alive").position.x, 2.0);
        assert_eq!(population.get(b).expect("b alive").position.x, 1.0);

        let d = population.insert(boid_at(3.0));
        assert_ne!(a, d, "generational handles should not be reused immediately");
        assert!(population.remove(a).is_none());
    }

    #[test]
    fn remove_many_preserves_survivor_order() {
        let mut population = Population::new();
        let ids: Vec<_> = (0..5).map(|i| population.insert(boid_at(i as f64))).collect();
        let dead: HashSet<_> = [ids[1], ids[3]].into_iter().collect();
        assert_eq!(population.remove_many(&dead), 2);
        assert_eq!(population.boids().handles(), &[ids[0], ids[2], ids[4]]);
        let xs: Vec<f64> = population.boids().positions().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 2.0, 4.0]);
        assert_eq!(population.index_of(ids[4]), Some((Species::Ordinary, 2)));
    }

    #[test]
    fn last_predator_follows_insertion_order_after_swap_removal() {
        let mut population = Population::new();
        let predator = |x: f64| Agent::predator(Vector3::new(x, 0.0, 0.0), Vector3::x(), 2.0);
        let a = population.insert(predator(0.0));
        let b = population.insert(predator(1.0));
        let c = population.insert(predator(2.0));

        population.remove(a).expect("a removed");
        // c was swapped into row 0, b now sits in the last row
        assert_eq!(population.predators().handles(), &[c, b]);
        assert_eq!(population.last_predator(), Some(c));

        let dead: HashSet<_> = [c].into_iter().collect();
        population.remove_many(&dead);
        assert_eq!(population.last_predator(), Some(b));
        population.clear();
        assert_eq!(population.last_predator(), None);
    }

    #[test]
    fn snapshot_copies_both_species() {
        let mut population = Population::new();
        population.insert(boid_at(1.0));
        population.insert(Agent::predator(Vector3::new(0.0, 5.0, 0.0), Vector3::x(), 2.0));
        let snapshot = population.capture_snapshot();
        assert_eq!(snapshot.boid_count(), 1);
        assert_eq!(snapshot.predator_count(), 1);
        assert_eq!(snapshot.predator_positions()[0].y, 5.0);
    }

    #[test]
    fn random_population_respects_domain_and_speed_bounds() {
        let params = FlockParams::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut population = Population::new();
        population.populate(&mut rng, &params, 200, 3);
        assert_eq!(population.boid_count(), 200);
        assert_eq!(population.predator_count(), 3);
        for (p, s) in population.boids().positions().iter().zip(population.boids().speeds()) {
            assert!((p - params.domain_center()).norm() <= params.domain_radius + 1.0e-9);
            assert!(*s >= params.min_speed && *s <= params.max_speed);
        }
        for h in population.boids().headings() {
            assert!((h.norm() - 1.0).abs() < 1.0e-9);
        }
        for s in population.predators().speeds() {
            assert!(*s >= params.min_speed_predator && *s <= params.max_speed_predator);
        }
    }

    #[test]
    fn fibonacci_ball_stays_inside_radius() {
        let agents = fibonacci_ball(100, Vector3::new(1.0, 1.0, 1.0), 2.0, 1.5);
        assert_eq!(agents.len(), 100);
        for a in &agents {
            assert!((a.position - Vector3::new(1.0, 1.0, 1.0)).norm() <= 2.0 + 1.0e-9);
            assert!((a.heading.norm() - 1.0).abs() < 1.0e-9);
        }
    }
}
