use crate::algorithms::blend::evaluate;
use crate::algorithms::flocking::{DetectionRadii, FlockParams};
use crate::models::population::Species;
use crate::sim::{FrameResults, Snapshot, SteeringResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_CHUNK_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    Sequential,
    /// Fork-join over chunks of ordinary agents. Without the `parallel`
    /// feature this runs the same chunks on the calling thread.
    Parallel,
}

/// Computes next-frame steering for every agent of a snapshot.
///
/// The snapshot is only read; each ordinary agent writes its own slot of a
/// fresh result buffer, so chunking and thread count never change the
/// output. `compute` returns only after every chunk has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchScheduler {
    chunk_size: usize,
    mode: ExecutionMode,
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, ExecutionMode::Parallel)
    }
}

impl BatchScheduler {
    pub fn new(chunk_size: usize, mode: ExecutionMode) -> Self {
        Self {
            chunk_size: clamp_chunk_size(chunk_size),
            mode,
        }
    }

    pub fn sequential() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, ExecutionMode::Sequential)
    }

    pub fn chunk_size(&self) -> usize { self.chunk_size }
    pub fn mode(&self) -> ExecutionMode { self.mode }
    pub fn set_mode(&mut self, mode: ExecutionMode) { self.mode = mode; }
    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.chunk_size = clamp_chunk_size(chunk_size);
    }

    pub fn compute(&self, snapshot: &Snapshot, params: &FlockParams) -> FrameResults {
        let radii = params.radii_sq();

        let mut boids = vec![SteeringResult::default(); snapshot.boid_count()];
        if !boids.is_empty() {
            match self.mode {
                ExecutionMode::Sequential => {
                    fill_sequential(&mut boids, self.chunk_size, snapshot, params, &radii)
                }
                ExecutionMode::Parallel => {
                    fill_parallel(&mut boids, self.chunk_size, snapshot, params, &radii)
                }
            }
        }

        // Predators are few; evaluate them in order on this thread.
        let mut predators = Vec::with_capacity(snapshot.predator_count());
        let mut kills = Vec::new();
        for i in 0..snapshot.predator_count() {
            let eval = evaluate(Species::Predator, i, snapshot, params, &radii);
            predators.push(eval.result);
            kills.extend(eval.kill);
        }

        debug!(
            boids = boids.len(),
            predators = predators.len(),
            kills = kills.len(),
            mode = ?self.mode,
            "frame computed"
        );

        FrameResults {
            boids,
            predators,
            kills,
        }
    }
}

fn clamp_chunk_size(chunk_size: usize) -> usize {
    if chunk_size == 0 {
        warn!("chunk_size 0 clamped to 1");
        return 1;
    }
    chunk_size
}

fn fill_chunk(
    offset: usize,
    chunk: &mut [SteeringResult],
    snapshot: &Snapshot,
    params: &FlockParams,
    radii: &DetectionRadii,
) {
    for (k, slot) in chunk.iter_mut().enumerate() {
        *slot = evaluate(Species::Ordinary, offset + k, snapshot, params, radii).result;
    }
}

fn fill_sequential(
    out: &mut [SteeringResult],
    chunk_size: usize,
    snapshot: &Snapshot,
    params: &FlockParams,
    radii: &DetectionRadii,
) {
    for (c, chunk) in out.chunks_mut(chunk_size).enumerate() {
        fill_chunk(c * chunk_size, chunk, snapshot, params, radii);
    }
}

#[cfg(feature = "parallel")]
fn fill_parallel(
    out: &mut [SteeringResult],
    chunk_size: usize,
    snapshot: &Snapshot,
    params: &FlockParams,
    radii: &DetectionRadii,
) {
    use rayon::prelude::*;
    out.par_chunks_mut(chunk_size)
        .enumerate()
        .for_each(|(c, chunk)| fill_chunk(c * chunk_size, chunk, snapshot, params, radii));
}

#[cfg(not(feature = "parallel"))]
fn fill_parallel(
    out: &mut [SteeringResult],
    chunk_size: usize,
    snapshot: &Snapshot,
    params: &FlockParams,
    radii: &DetectionRadii,
) {
    fill_sequential(out, chunk_size, snapshot, params, radii);
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn grid_snapshot(side: usize, spacing: f64) -> Snapshot {
        let mut positions = Vec::new();
        let mut headings = Vec::new();
        let mut speeds = Vec::new();
        for x in 0..side {
            for y in 0..side {
                for z in 0..side {
                    let i = positions.len() as f64;
                    positions.push(Vector3::new(x as f64, y as f64, z as f64) * spacing);
                    let heading = Vector3::new((i * 0.37).cos(), (i * 0.37).sin(), 0.2);
                    headings.push(heading.normalize());
                    speeds.push(1.0 + (i * 0.11).sin().abs());
                }
            }
        }
        Snapshot::new(positions, headings, speeds).with_predators(
            vec![Vector3::new(1.0, 1.0, 1.0), Vector3::new(-8.0, 0.0, 0.0)],
            vec![Vector3::x(), Vector3::y()],
            vec![2.0, 2.5],
        )
    }

    #[test]
    fn empty_snapshot_produces_empty_results() {
        let results =
            BatchScheduler::default().compute(&Snapshot::default(), &FlockParams::default());
        assert!(results.boids.is_empty());
        assert!(results.predators.is_empty());
        assert!(results.kills.is_empty());
    }

    #[test]
    fn chunking_and_mode_do_not_change_results() {
        let snapshot = grid_snapshot(5, 0.8);
        let params = FlockParams::default();
        let reference =
            BatchScheduler::new(1, ExecutionMode::Sequential).compute(&snapshot, &params);
        for chunk in [1, 3, 7, 32, 1000] {
            for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
                let results = BatchScheduler::new(chunk, mode).compute(&snapshot, &params);
                assert_eq!(results, reference, "chunk {chunk} mode {mode:?}");
            }
        }
    }

    #[test]
    fn one_result_per_agent() {
        let snapshot = grid_snapshot(3, 1.0);
        let results = BatchScheduler::default().compute(&snapshot, &FlockParams::default());
        assert_eq!(results.boids.len(), 27);
        assert_eq!(results.predators.len(), 2);
        // predator at (1,1,1) sits on a grid point
        assert_eq!(results.kills.len(), 1);
        assert_eq!(results.kills[0].predator, 0);
    }

    #[test]
    fn zero_chunk_size_is_clamped() {
        let mut scheduler = BatchScheduler::new(0, ExecutionMode::Parallel);
        assert_eq!(scheduler.chunk_size(), 1);
        scheduler.set_chunk_size(16);
        assert_eq!(scheduler.chunk_size(), 16);
        scheduler.set_chunk_size(0);
        assert_eq!(scheduler.chunk_size(), 1);
    }
}
