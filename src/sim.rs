use crate::models::population::{AgentColumns, AgentId};
use nalgebra::Vector3;

/// Frozen copy of last-frame agent state.
///
/// Every agent of a frame computes against the same snapshot, so the
/// evaluation order cannot leak into the results. Nothing hands out a
/// mutable view of it.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    boid_ids: Vec<AgentId>,
    positions: Vec<Vector3<f64>>,
    headings: Vec<Vector3<f64>>,
    speeds: Vec<f64>,

    predator_ids: Vec<AgentId>,
    predator_positions: Vec<Vector3<f64>>,
    predator_headings: Vec<Vector3<f64>>,
    predator_speeds: Vec<f64>,
}

impl Snapshot {
    /// Snapshot of ordinary agents only; ids are null handles.
    pub fn new(
        positions: Vec<Vector3<f64>>,
        headings: Vec<Vector3<f64>>,
        speeds: Vec<f64>,
    ) -> Self {
        assert_eq!(positions.len(), headings.len(), "one heading per position");
        assert_eq!(positions.len(), speeds.len(), "one speed per position");
        Self {
            boid_ids: vec![AgentId::default(); positions.len()],
            positions,
            headings,
            speeds,
            ..Self::default()
        }
    }

    /// Attach predators to a snapshot built with [`Snapshot::new`].
    pub fn with_predators(
        mut self,
        positions: Vec<Vector3<f64>>,
        headings: Vec<Vector3<f64>>,
        speeds: Vec<f64>,
    ) -> Self {
        assert_eq!(positions.len(), headings.len(), "one heading per predator");
        assert_eq!(positions.len(), speeds.len(), "one speed per predator");
        self.predator_ids = vec![AgentId::default(); positions.len()];
        self.predator_positions = positions;
        self.predator_headings = headings;
        self.predator_speeds = speeds;
        self
    }

    pub(crate) fn from_columns(boids: &AgentColumns, predators: &AgentColumns) -> Self {
        Self {
            boid_ids: boids.handles().to_vec(),
            positions: boids.positions().to_vec(),
            headings: boids.headings().to_vec(),
            speeds: boids.speeds().to_vec(),
            predator_ids: predators.handles().to_vec(),
            predator_positions: predators.positions().to_vec(),
            predator_headings: predators.headings().to_vec(),
            predator_speeds: predators.speeds().to_vec(),
        }
    }

    pub fn boid_count(&self) -> usize { self.positions.len() }
    pub fn predator_count(&self) -> usize { self.predator_positions.len() }
    pub fn boid_ids(&self) -> &[AgentId] { &self.boid_ids }
    pub fn positions(&self) -> &[Vector3<f64>] { &self.positions }
    pub fn headings(&self) -> &[Vector3<f64>] { &self.headings }
    pub fn speeds(&self) -> &[f64] { &self.speeds }
    pub fn predator_ids(&self) -> &[AgentId] { &self.predator_ids }
    pub fn predator_positions(&self) -> &[Vector3<f64>] { &self.predator_positions }
    pub fn predator_headings(&self) -> &[Vector3<f64>] { &self.predator_headings }
    pub fn predator_speeds(&self) -> &[f64] { &self.predator_speeds }
}

/// Desired heading (not normalized) and speed for one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringResult {
    pub heading: Vector3<f64>,
    pub speed: f64,
}

impl Default for SteeringResult {
    fn default() -> Self {
        Self {
            heading: Vector3::zeros(),
            speed: 0.0,
        }
    }
}

/// A predator came within kill distance of a prey. Indices refer to the
/// snapshot the request was computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KillRequest {
    pub predator: usize,
    pub prey: usize,
    pub distance: f64,
}

/// Everything the batch scheduler produces for one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameResults {
    /// Slot `i` belongs to ordinary agent `i` of the snapshot.
    pub boids: Vec<SteeringResult>,
    /// Slot `i` belongs to predator `i` of the snapshot.
    pub predators: Vec<SteeringResult>,
    /// Deferred removals, applied after the frame barrier.
    pub kills: Vec<KillRequest>,
}

/// Results of one frame together with the snapshot they were computed from.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub frame: u64,
    pub snapshot: Snapshot,
    pub results: FrameResults,
}

impl FrameOutput {
    /// Handles of the prey flagged by this frame's kill requests, deduplicated.
    pub fn killed_ids(&self) -> Vec<AgentId> {
        let mut ids: Vec<AgentId> = Vec::with_capacity(self.results.kills.len());
        for kill in &self.results.kills {
            let id = self.snapshot.boid_ids()[kill.prey];
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}
