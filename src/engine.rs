use crate::algorithms::flocking::FlockParams;
use crate::algorithms::scheduler::{BatchScheduler, ExecutionMode};
use crate::config::SimConfig;
use crate::error::{FlockError, Result};
use crate::integrator::MotionIntegrator;
use crate::models::population::{Agent, AgentId, Population, Species, fibonacci_ball, random_agent};
use crate::sim::{FrameOutput, SteeringResult};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

pub const SCENARIO_CALM: &str = "calm-flock";
pub const SCENARIO_HUNTED: &str = "hunted-flock";
pub const SCENARIO_DENSE: &str = "dense-ball";
pub const SCENARIO_FROM_CONFIG: &str = "from-config";

pub struct ScenarioInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub boids: usize,
    pub predators: usize,
}

pub fn scenario_catalog() -> &'static [ScenarioInfo] {
    &[
        ScenarioInfo {
            id: SCENARIO_CALM,
            name: "Calm flock",
            description: "Boids scattered through the domain with no predators.",
            boids: 300,
            predators: 0,
        },
        ScenarioInfo {
            id: SCENARIO_HUNTED,
            name: "Hunted flock",
            description: "Scattered boids with two predators culling the flock.",
            boids: 300,
            predators: 2,
        },
        ScenarioInfo {
            id: SCENARIO_DENSE,
            name: "Dense ball",
            description: "A tightly packed ball of boids circling the Z axis, one predator.",
            boids: 1000,
            predators: 1,
        },
        ScenarioInfo {
            id: SCENARIO_FROM_CONFIG,
            name: "From config",
            description: "Population and parameters read from a JSON configuration.",
            boids: 0,
            predators: 0,
        },
    ]
}

pub fn find_scenario(id: &str) -> Option<&'static ScenarioInfo> {
    scenario_catalog().iter().find(|s| s.id == id)
}

/// Where the engine stands in the compute/apply cycle of a frame.
///
/// Neighbor search and blending run inside the blocking scheduler call
/// between `SnapshotCaptured` and `ResultsReady`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    SnapshotCaptured,
    ResultsReady,
    Applied,
}

impl fmt::Display for FramePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FramePhase::SnapshotCaptured => "snapshot-captured",
            FramePhase::ResultsReady => "results-ready",
            FramePhase::Applied => "applied",
        };
        f.write_str(name)
    }
}

/// What changed in the population during one applied frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub killed: Vec<AgentId>,
    pub boids: usize,
    pub predators: usize,
}

/// Owns the population and drives frames in two phases:
/// [`compute_frame`](Engine::compute_frame) reads a snapshot and produces
/// results, [`apply_frame`](Engine::apply_frame) moves the agents and
/// removes killed prey.
pub struct Engine {
    scenario_id: &'static str,
    params: FlockParams,
    population: Population,
    scheduler: BatchScheduler,
    integrator: MotionIntegrator,
    rng: StdRng,
    frame: u64,
    phase: FramePhase,
}

impl Engine {
    pub fn new_builtin(scenario_id: &str) -> Result<Self> {
        let scenario = find_scenario(scenario_id)
            .ok_or_else(|| FlockError::UnknownScenario(scenario_id.to_string()))?;
        let config = SimConfig::default();
        let params = config.params.clone();
        let mut rng = StdRng::seed_from_u64(config.population.seed);
        let mut population = Population::new();

        match scenario.id {
            SCENARIO_CALM | SCENARIO_HUNTED => {
                population.populate(&mut rng, &params, scenario.boids, scenario.predators);
            }
            SCENARIO_DENSE => {
                let cruise = 0.5 * (params.min_speed + params.max_speed);
                for agent in fibonacci_ball(
                    scenario.boids,
                    params.domain_center(),
                    params.domain_radius * 0.5,
                    cruise,
                ) {
                    population.insert(agent);
                }
                for _ in 0..scenario.predators {
                    population.insert(random_agent(&mut rng, &params, Species::Predator));
                }
            }
            _ => {
                return Err(FlockError::InvalidConfig(format!(
                    "scenario '{}' must be constructed from a configuration",
                    scenario.id
                )));
            }
        }

        info!(
            scenario = scenario.id,
            boids = population.boid_count(),
            predators = population.predator_count(),
            "built scenario"
        );
        Ok(Self {
            scenario_id: scenario.id,
            params,
            population,
            scheduler: BatchScheduler::default(),
            integrator: MotionIntegrator::new(config.motion.smooth_time),
            rng,
            frame: 0,
            phase: FramePhase::Applied,
        })
    }

    pub fn from_config(config: &SimConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.population.seed);
        let mut population = Population::new();
        population.populate(
            &mut rng,
            &config.params,
            config.population.boids,
            config.population.predators,
        );
        info!(
            boids = population.boid_count(),
            predators = population.predator_count(),
            mode = ?config.scheduler.mode,
            "built engine from config"
        );
        Ok(Self {
            scenario_id: SCENARIO_FROM_CONFIG,
            params: config.params.clone(),
            population,
            scheduler: BatchScheduler::new(config.scheduler.chunk_size, config.scheduler.mode),
            integrator: MotionIntegrator::new(config.motion.smooth_time),
            rng,
            frame: 0,
            phase: FramePhase::Applied,
        })
    }

    /// Engine over an explicit population, e.g. one assembled by a host.
    pub fn with_population(
        params: FlockParams,
        population: Population,
        scheduler: BatchScheduler,
        integrator: MotionIntegrator,
        seed: u64,
    ) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            scenario_id: SCENARIO_FROM_CONFIG,
            params,
            population,
            scheduler,
            integrator,
            rng: StdRng::seed_from_u64(seed),
            frame: 0,
            phase: FramePhase::Applied,
        })
    }

    pub fn scenario_id(&self) -> &'static str { self.scenario_id }
    pub fn len(&self) -> usize { self.population.len() }
    pub fn is_empty(&self) -> bool { self.population.is_empty() }
    pub fn boid_count(&self) -> usize { self.population.boid_count() }
    pub fn predator_count(&self) -> usize { self.population.predator_count() }
    pub fn population(&self) -> &Population { &self.population }
    pub fn params(&self) -> &FlockParams { &self.params }
    pub fn scheduler(&self) -> &BatchScheduler { &self.scheduler }
    pub fn integrator(&self) -> &MotionIntegrator { &self.integrator }
    pub fn frame(&self) -> u64 { self.frame }
    pub fn phase(&self) -> FramePhase { self.phase }

    pub fn set_params(&mut self, params: FlockParams) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn set_execution_mode(&mut self, mode: ExecutionMode) { self.scheduler.set_mode(mode); }

    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.scheduler.set_chunk_size(chunk_size);
    }

    pub fn set_smooth_time(&mut self, smooth_time: f64) -> Result<()> {
        if !smooth_time.is_finite() || smooth_time <= 0.0 {
            return Err(FlockError::InvalidConfig("smooth_time must be positive".to_string()));
        }
        self.integrator.set_smooth_time(smooth_time);
        Ok(())
    }

    /// Snapshot the population and compute every agent's next heading and
    /// speed. Blocks until all parallel work is done.
    pub fn compute_frame(&mut self) -> FrameOutput {
        let snapshot = self.population.capture_snapshot();
        self.phase = FramePhase::SnapshotCaptured;
        let results = self.scheduler.compute(&snapshot, &self.params);
        self.phase = FramePhase::ResultsReady;
        FrameOutput {
            frame: self.frame,
            snapshot,
            results,
        }
    }

    /// Move every agent that is still alive by its result, then remove the
    /// prey killed this frame in a single compaction pass.
    pub fn apply_frame(&mut self, output: FrameOutput, dt: f64) -> Result<FrameReport> {
        if self.phase != FramePhase::ResultsReady || output.frame != self.frame {
            warn!(
                expected = self.frame,
                actual = output.frame,
                phase = %self.phase,
                "rejected frame results"
            );
            return Err(FlockError::FrameOutOfOrder {
                expected: self.frame,
                actual: output.frame,
            });
        }

        let flagged = output.killed_ids();
        let snapshot = &output.snapshot;
        for (id, result) in snapshot.boid_ids().iter().zip(&output.results.boids) {
            self.apply_result(*id, result, dt);
        }
        for (id, result) in snapshot.predator_ids().iter().zip(&output.results.predators) {
            self.apply_result(*id, result, dt);
        }

        let dead: HashSet<AgentId> = flagged
            .iter()
            .copied()
            .filter(|id| self.population.contains(*id))
            .collect();
        self.population.remove_many(&dead);
        let killed: Vec<AgentId> = flagged.into_iter().filter(|id| dead.contains(id)).collect();
        if !killed.is_empty() {
            info!(
                frame = self.frame,
                killed = killed.len(),
                remaining = self.population.boid_count(),
                "prey killed"
            );
        }

        let report = FrameReport {
            frame: self.frame,
            killed,
            boids: self.population.boid_count(),
            predators: self.population.predator_count(),
        };
        debug!(frame = self.frame, boids = report.boids, "frame applied");
        self.phase = FramePhase::Applied;
        self.frame += 1;
        Ok(report)
    }

    pub fn tick(&mut self, dt: f64) -> Result<FrameReport> {
        let output = self.compute_frame();
        self.apply_frame(output, dt)
    }

    fn apply_result(&mut self, id: AgentId, result: &SteeringResult, dt: f64) {
        let Some((species, index)) = self.population.index_of(id) else {
            return;
        };
        let row = self.population.columns_mut(species).row_mut(index);
        self.integrator.integrate(row, result.heading, result.speed, dt);
    }

    pub fn insert_agent(&mut self, agent: Agent) -> AgentId {
        self.population.insert(agent)
    }

    pub fn remove_agent(&mut self, id: AgentId) -> Result<Agent> {
        self.population.remove(id).ok_or(FlockError::UnknownAgent)
    }

    /// Spawn a predator at a random point of the domain.
    pub fn add_predator(&mut self) -> AgentId {
        let agent = random_agent(&mut self.rng, &self.params, Species::Predator);
        let id = self.population.insert(agent);
        info!(predators = self.population.predator_count(), "predator added");
        id
    }

    /// Remove the most recently added predator, if any.
    pub fn remove_predator(&mut self) -> Option<AgentId> {
        let id = self.population.last_predator()?;
        self.population.remove(id)?;
        info!(predators = self.population.predator_count(), "predator removed");
        Some(id)
    }

    pub fn positions_flat(&self, species: Species) -> Vec<f32> {
        flatten(self.population.columns(species).positions())
    }

    pub fn headings_flat(&self, species: Species) -> Vec<f32> {
        flatten(self.population.columns(species).headings())
    }
}

fn flatten(vectors: &[nalgebra::Vector3<f64>]) -> Vec<f32> {
    let mut out = Vec::with_capacity(vectors.len() * 3);
    for v in vectors {
        out.push(v.x as f32);
        out.push(v.y as f32);
        out.push(v.z as f32);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn tiny_engine() -> Engine {
        let mut population = Population::new();
        population.insert(Agent::ordinary(Vector3::zeros(), Vector3::x(), 2.0));
        population.insert(Agent::ordinary(Vector3::new(0.5, 0.0, 0.0), Vector3::x(), 2.0));
        population.insert(Agent::ordinary(Vector3::new(5.0, 5.0, 0.0), Vector3::y(), 2.0));
        Engine::with_population(
            FlockParams::default(),
            population,
            BatchScheduler::sequential(),
            MotionIntegrator::default(),
            1,
        )
        .expect("engine")
    }

    #[test]
    fn catalog_lists_every_scenario() {
        for id in [SCENARIO_CALM, SCENARIO_HUNTED, SCENARIO_DENSE, SCENARIO_FROM_CONFIG] {
            assert!(find_scenario(id).is_some(), "{id}");
        }
        assert!(find_scenario("nope").is_none());
    }

    #[test]
    fn builtin_scenarios_populate() {
        let engine = Engine::new_builtin(SCENARIO_HUNTED).expect("hunted");
        assert_eq!(engine.boid_count(), 300);
        assert_eq!(engine.predator_count(), 2);

        let engine = Engine::new_builtin(SCENARIO_DENSE).expect("dense");
        assert_eq!(engine.boid_count(), 1000);
        assert_eq!(engine.predator_count(), 1);

        assert!(matches!(
            Engine::new_builtin("unknown"),
            Err(FlockError::UnknownScenario(_))
        ));
        assert!(Engine::new_builtin(SCENARIO_FROM_CONFIG).is_err());
    }

    #[test]
    fn phases_follow_compute_then_apply() {
        let mut engine = tiny_engine();
        assert_eq!(engine.phase(), FramePhase::Applied);
        let output = engine.compute_frame();
        assert_eq!(engine.phase(), FramePhase::ResultsReady);
        assert_eq!(output.results.boids.len(), 3);
        let report = engine.apply_frame(output, 1.0 / 60.0).expect("apply");
        assert_eq!(report.frame, 0);
        assert_eq!(engine.phase(), FramePhase::Applied);
        assert_eq!(engine.frame(), 1);
    }

    #[test]
    fn stale_results_are_rejected() {
        let mut engine = tiny_engine();
        let stale = engine.compute_frame();
        engine.tick(0.01).expect("tick");
        let err = engine.apply_frame(stale, 0.01).unwrap_err();
        assert!(matches!(err, FlockError::FrameOutOfOrder { expected: 1, actual: 0 }));
    }

    #[test]
    fn apply_without_compute_is_rejected() {
        let mut engine = tiny_engine();
        let output = engine.compute_frame();
        let copy = output.clone();
        engine.apply_frame(output, 0.01).expect("first apply");
        assert!(engine.apply_frame(copy, 0.01).is_err());
    }

    #[test]
    fn apply_moves_agents_along_heading() {
        let mut engine = tiny_engine();
        let before = engine.population().boids().positions().to_vec();
        engine.tick(0.1).expect("tick");
        let after = engine.population().boids().positions();
        for (a, b) in before.iter().zip(after) {
            assert!((a - b).norm() > 0.0);
        }
        for s in engine.population().boids().speeds() {
            assert!(*s >= engine.params().min_speed && *s <= engine.params().max_speed);
        }
    }

    #[test]
    fn predator_kill_is_applied_after_the_frame() {
        let mut engine = tiny_engine();
        let prey_pos = Vector3::new(5.0, 5.0, 0.0);
        let hunter = Agent::predator(prey_pos + Vector3::new(0.2, 0.0, 0.0), -Vector3::x(), 2.0);
        let predator = engine.insert_agent(hunter);
        let output = engine.compute_frame();
        assert_eq!(output.results.kills.len(), 1);
        // still alive until the frame is applied
        assert_eq!(engine.boid_count(), 3);
        let victim = output.killed_ids()[0];
        let report = engine.apply_frame(output, 0.01).expect("apply");
        assert_eq!(report.killed, vec![victim]);
        assert_eq!(report.boids, 2);
        assert!(!engine.population().contains(victim));
        assert!(engine.population().contains(predator));
    }

    #[test]
    fn agents_removed_between_phases_are_skipped() {
        let mut engine = tiny_engine();
        let output = engine.compute_frame();
        let gone = output.snapshot.boid_ids()[0];
        engine.remove_agent(gone).expect("removed");
        let report = engine.apply_frame(output, 0.01).expect("apply");
        assert_eq!(report.boids, 2);
        assert!(matches!(engine.remove_agent(gone), Err(FlockError::UnknownAgent)));
    }

    #[test]
    fn add_and_remove_predators() {
        let mut engine = tiny_engine();
        assert!(engine.remove_predator().is_none());
        let a = engine.add_predator();
        let b = engine.add_predator();
        assert_eq!(engine.predator_count(), 2);
        assert_eq!(engine.remove_predator(), Some(b));
        assert_eq!(engine.remove_predator(), Some(a));
        assert_eq!(engine.predator_count(), 0);
    }

    #[test]
    fn remove_predator_takes_newest_after_out_of_order_removal() {
        let mut engine = tiny_engine();
        let a = engine.add_predator();
        let b = engine.add_predator();
        let c = engine.add_predator();
        engine.remove_agent(a).expect("a removed");
        assert_eq!(engine.remove_predator(), Some(c));
        assert_eq!(engine.remove_predator(), Some(b));
        assert_eq!(engine.remove_predator(), None);
    }

    #[test]
    fn invalid_params_are_refused() {
        let mut engine = tiny_engine();
        let bad = FlockParams {
            max_speed: 0.1,
            ..FlockParams::default()
        };
        assert!(engine.set_params(bad).is_err());
        assert_eq!(engine.params(), &FlockParams::default());
        assert!(engine.set_smooth_time(0.0).is_err());
    }

    #[test]
    fn flat_buffers_have_three_floats_per_agent() {
        let engine = tiny_engine();
        assert_eq!(engine.positions_flat(Species::Ordinary).len(), 9);
        assert_eq!(engine.headings_flat(Species::Predator).len(), 0);
    }
}
