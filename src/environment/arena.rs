use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Deserialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::action::Action;
use crate::error::{CaptureError, Result};
use crate::observation::{distance, CriticalPoint, Observation};
use super::{EnvironmentAdapter, StepInfo, StepOutcome};

/// Raw distances are divided by this before being reported, then capped at 1
pub const DISTANCE_SCALE: f32 = 10.0;

/// Layout and rules of the simulated arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub num_agents: usize,
    /// Side length of the square map centred on the origin
    pub map_size: f32,
    /// Distance covered by one movement action
    pub move_speed: f32,
    pub capture_radius: f32,
    /// Steps a freshly captured point stays unavailable
    pub capture_cooldown: usize,
    /// Step calls, across all agents, before time runs out
    pub time_limit: usize,
    pub grid_size: usize,
    /// Spawn position of agent `i` is `spawn_points[i]`
    pub spawn_points: Vec<[f32; 3]>,
    pub critical_points: Vec<[f32; 3]>,
    /// Extra points scattered on walkable cells at every reset
    pub random_points: usize,
    /// Unit wall cells; cell `[x, z]` covers `[x, x + 1) × [z, z + 1)`
    pub wall_cells: Vec<[i32; 2]>,
    pub seed: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            num_agents: 3,
            map_size: 10.0,
            move_speed: 0.05,
            capture_radius: 0.75,
            capture_cooldown: 20,
            time_limit: 3000,
            grid_size: 15,
            spawn_points: vec![
                [3.5, 1.0, 3.5],
                [-3.5, 1.0, 3.5],
                [3.5, 1.0, -3.5],
                [-3.5, 1.0, -3.5],
            ],
            critical_points: vec![
                [0.0, 1.0, 3.5],
                [0.0, 1.0, -3.5],
                [3.5, 1.0, 0.0],
                [-3.5, 1.0, 0.0],
                [1.5, 1.0, 1.5],
                [-1.5, 1.0, -1.5],
            ],
            random_points: 0,
            wall_cells: vec![[-1, -1], [-1, 0], [0, -1], [0, 0]],
            seed: 7,
        }
    }
}

impl ArenaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_agents == 0 {
            return Err(CaptureError::invalid_parameter("num_agents", "must be at least 1"));
        }
        if self.num_agents > self.spawn_points.len() {
            return Err(CaptureError::invalid_parameter(
                "spawn_points",
                format!("{} agents but only {} spawn points", self.num_agents, self.spawn_points.len()),
            ));
        }
        if !self.map_size.is_finite() || self.map_size <= 0.0 {
            return Err(CaptureError::invalid_parameter(
                "map_size",
                format!("must be positive, got {}", self.map_size),
            ));
        }
        if !self.move_speed.is_finite() || self.move_speed <= 0.0 {
            return Err(CaptureError::invalid_parameter(
                "move_speed",
                format!("must be positive, got {}", self.move_speed),
            ));
        }
        if !self.capture_radius.is_finite() || self.capture_radius < 0.0 {
            return Err(CaptureError::invalid_parameter(
                "capture_radius",
                format!("must be non-negative, got {}", self.capture_radius),
            ));
        }
        if self.time_limit == 0 {
            return Err(CaptureError::invalid_parameter("time_limit", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct ArenaPoint {
    position: [f32; 3],
    owner: Option<u32>,
    locked_until: usize,
}

/// Deterministic in-process stand-in for the 3D game.
///
/// Agents slide on the x/z plane, bump into walls and the outer boundary, and
/// capture any available point they come within `capture_radius` of.
pub struct SimulatedArena {
    config: ArenaConfig,
    walls: HashSet<(i32, i32)>,
    positions: Vec<[f32; 3]>,
    points: Vec<ArenaPoint>,
    steps: usize,
    running: bool,
    rng: StdRng,
}

impl SimulatedArena {
    pub fn new(config: ArenaConfig) -> Result<Self> {
        config.validate()?;
        for (i, spawn) in config.spawn_points.iter().take(config.num_agents).enumerate() {
            if !walkable(&config, &wall_set(&config), spawn[0], spawn[2]) {
                return Err(CaptureError::invalid_parameter(
                    "spawn_points",
                    format!("spawn of agent {} at {:?} is inside a wall", i, spawn),
                ));
            }
        }

        Ok(SimulatedArena {
            walls: wall_set(&config),
            positions: Vec::new(),
            points: Vec::new(),
            steps: 0,
            running: false,
            rng: StdRng::seed_from_u64(config.seed),
            config,
        })
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn agent_position(&self, agent_id: usize) -> Option<[f32; 3]> {
        self.positions.get(agent_id).copied()
    }

    /// Owner of every point in registry order
    pub fn owners(&self) -> Vec<Option<u32>> {
        self.points.iter().map(|p| p.owner).collect()
    }

    pub fn is_walkable(&self, x: f32, z: f32) -> bool {
        walkable(&self.config, &self.walls, x, z)
    }

    /// Observation as seen by `agent_id`
    pub fn observe(&self, agent_id: usize) -> Result<Observation> {
        let position = self.positions.get(agent_id).copied().ok_or_else(|| {
            CaptureError::AdapterUnavailable(format!("agent {} is not in the arena", agent_id))
        })?;

        let critical_points: Vec<CriticalPoint> = self
            .points
            .iter()
            .map(|p| CriticalPoint {
                position: p.position,
                color: p.owner,
                available: self.steps >= p.locked_until,
            })
            .collect();

        let mut agent_owned_points = BTreeMap::new();
        for id in 0..self.config.num_agents {
            let owned = self.points.iter().filter(|p| p.owner == Some(id as u32)).count() as u32;
            agent_owned_points.insert(id.to_string(), owned);
        }

        let time_remaining = (1.0 - self.steps as f32 / self.config.time_limit as f32).max(0.0);

        let mut observation = Observation {
            agent_position: position,
            critical_points,
            agent_owned_points,
            time_remaining,
            navigation_grid: self.navigation_grid(&position),
            nearest_unclaimed_distance: 1.0,
            nearest_enemy_distance: 1.0,
            map_size: self.config.map_size,
        };
        observation.nearest_unclaimed_distance =
            scaled(observation.nearest_distance(&position, CriticalPoint::is_unclaimed));
        observation.nearest_enemy_distance =
            scaled(observation.nearest_distance(&position, |p| p.is_enemy_of(agent_id)));
        Ok(observation)
    }

    /// Occupancy of the unit cells around `position`, row-major by z then x.
    /// Anything beyond the map boundary counts as wall.
    fn navigation_grid(&self, position: &[f32; 3]) -> Vec<u8> {
        let size = self.config.grid_size;
        let half = (size / 2) as f32;
        let mut grid = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                let x = position[0] + col as f32 - half;
                let z = position[2] + row as f32 - half;
                grid.push(if self.is_walkable(x, z) { 0 } else { 1 });
            }
        }
        grid
    }

    fn random_point(&mut self) -> Option<[f32; 3]> {
        let half = self.config.map_size / 2.0;
        let low = -half + 0.5;
        let high = half - 0.5;
        if low >= high {
            return None;
        }
        for _ in 0..100 {
            let x = self.rng.gen_range(low..high);
            let z = self.rng.gen_range(low..high);
            if self.is_walkable(x, z) {
                return Some([x, 1.0, z]);
            }
        }
        None
    }
}

impl EnvironmentAdapter for SimulatedArena {
    fn reset(&mut self) -> Result<Observation> {
        self.steps = 0;
        self.positions = self.config.spawn_points[..self.config.num_agents].to_vec();
        self.points = self
            .config
            .critical_points
            .iter()
            .map(|&position| ArenaPoint { position, owner: None, locked_until: 0 })
            .collect();
        for _ in 0..self.config.random_points {
            if let Some(position) = self.random_point() {
                self.points.push(ArenaPoint { position, owner: None, locked_until: 0 });
            }
        }
        self.running = true;
        debug!(points = self.points.len(), agents = self.positions.len(), "arena reset");
        self.observe(0)
    }

    fn step(&mut self, action: Action, agent_id: usize) -> Result<StepOutcome> {
        if !self.running {
            return Err(CaptureError::AdapterUnavailable(
                "step called before the first reset".to_string(),
            ));
        }
        if agent_id >= self.config.num_agents {
            return Err(CaptureError::invalid_parameter(
                "agent_id",
                format!("arena hosts {} agents, got id {}", self.config.num_agents, agent_id),
            ));
        }

        self.steps += 1;

        let (dx, dz) = action.direction();
        let current = self.positions[agent_id];
        let moved = [
            current[0] + dx * self.config.move_speed,
            current[1],
            current[2] + dz * self.config.move_speed,
        ];
        // Collisions revert the move
        let action_success = self.is_walkable(moved[0], moved[2]);
        if action_success {
            self.positions[agent_id] = moved;
        }
        let position = self.positions[agent_id];

        let owner = agent_id as u32;
        let mut captured = 0;
        for point in &mut self.points {
            let available = self.steps >= point.locked_until;
            if available
                && point.owner != Some(owner)
                && distance(&position, &point.position) <= self.config.capture_radius
            {
                point.owner = Some(owner);
                point.locked_until = self.steps + self.config.capture_cooldown;
                captured += 1;
            }
        }
        if captured > 0 {
            debug!(agent_id, captured, step = self.steps, "points captured");
        }

        let observation = self.observe(agent_id)?;
        let done = observation.is_out_of_time();
        let info = StepInfo {
            step: self.steps,
            owned_points: observation.owned_points(agent_id),
            total_points: observation.critical_points.len(),
            action_success,
        };

        Ok(StepOutcome {
            observation,
            reward: captured as f32,
            done,
            info,
        })
    }

    fn num_agents(&self) -> usize {
        self.config.num_agents
    }
}

fn wall_set(config: &ArenaConfig) -> HashSet<(i32, i32)> {
    config.wall_cells.iter().map(|c| (c[0], c[1])).collect()
}

fn walkable(config: &ArenaConfig, walls: &HashSet<(i32, i32)>, x: f32, z: f32) -> bool {
    let half = config.map_size / 2.0;
    let inside = x > -half && x < half && z > -half && z < half;
    inside && !walls.contains(&(x.floor() as i32, z.floor() as i32))
}

fn scaled(distance: Option<f32>) -> f32 {
    distance.map(|d| (d / DISTANCE_SCALE).min(1.0)).unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_agent(spawn: [f32; 3], points: Vec<[f32; 3]>) -> SimulatedArena {
        SimulatedArena::new(ArenaConfig {
            num_agents: 1,
            spawn_points: vec![spawn],
            critical_points: points,
            ..ArenaConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_step_before_reset() {
        let mut arena = SimulatedArena::new(ArenaConfig::default()).unwrap();
        let err = arena.step(Action::Stay, 0).unwrap_err();
        assert!(matches!(err, CaptureError::AdapterUnavailable(_)));
    }

    #[test]
    fn test_reset_observation() {
        let mut arena = SimulatedArena::new(ArenaConfig::default()).unwrap();
        let obs = arena.reset().unwrap();
        assert_eq!(obs.agent_position, [3.5, 1.0, 3.5]);
        assert_eq!(obs.navigation_grid.len(), 225);
        assert_eq!(obs.critical_points.len(), 6);
        assert_eq!(obs.time_remaining, 1.0);
        assert_eq!(obs.owned_points(2), 0);
        assert!(obs.validate(15).is_ok());
        // Nearest point is (1.5, 1, 1.5)
        assert!((obs.nearest_unclaimed_distance - 8f32.sqrt() / 10.0).abs() < 1e-6);
        assert_eq!(obs.nearest_enemy_distance, 1.0);
    }

    #[test]
    fn test_movement_and_boundary() {
        let mut arena = single_agent([4.97, 1.0, 0.5], vec![]);
        arena.reset().unwrap();

        let outcome = arena.step(Action::StrafeRight, 0).unwrap();
        assert!(!outcome.info.action_success);
        assert_eq!(outcome.observation.agent_position, [4.97, 1.0, 0.5]);

        let outcome = arena.step(Action::MoveForward, 0).unwrap();
        assert!(outcome.info.action_success);
        assert!((outcome.observation.agent_position[2] - 0.45).abs() < 1e-6);
        assert_eq!(outcome.info.step, 2);
    }

    #[test]
    fn test_interior_wall_blocks() {
        let mut arena = single_agent([1.02, 1.0, 0.5], vec![]);
        arena.reset().unwrap();
        let outcome = arena.step(Action::StrafeLeft, 0).unwrap();
        assert!(!outcome.info.action_success);
        assert!(!arena.is_walkable(0.5, 0.5));
    }

    #[test]
    fn test_capture_and_cooldown() {
        let mut arena = SimulatedArena::new(ArenaConfig {
            num_agents: 2,
            spawn_points: vec![[3.5, 1.0, 3.5], [3.5, 1.0, 2.5]],
            critical_points: vec![[3.5, 1.0, 3.0]],
            capture_radius: 0.5,
            capture_cooldown: 5,
            ..ArenaConfig::default()
        })
        .unwrap();
        arena.reset().unwrap();

        let outcome = arena.step(Action::Stay, 0).unwrap();
        assert_eq!(outcome.reward, 1.0);
        assert_eq!(outcome.info.owned_points, 1);
        assert!(!outcome.observation.critical_points[0].available);

        // Agent 1 is in range too but the point is locked
        let outcome = arena.step(Action::Stay, 1).unwrap();
        assert_eq!(outcome.reward, 0.0);
        assert_eq!(arena.owners(), vec![Some(0)]);
        assert!(outcome.observation.nearest_enemy_distance < 1.0);

        for _ in 0..5 {
            arena.step(Action::Stay, 1).unwrap();
        }
        assert_eq!(arena.owners(), vec![Some(1)]);
    }

    #[test]
    fn test_time_runs_out() {
        let mut arena = SimulatedArena::new(ArenaConfig { time_limit: 3, ..ArenaConfig::default() }).unwrap();
        arena.reset().unwrap();
        assert!(!arena.step(Action::Stay, 0).unwrap().done);
        assert!(!arena.step(Action::Stay, 1).unwrap().done);
        let last = arena.step(Action::Stay, 2).unwrap();
        assert!(last.done);
        assert_eq!(last.observation.time_remaining, 0.0);
    }

    #[test]
    fn test_random_points_are_seeded() {
        let config = ArenaConfig { random_points: 3, ..ArenaConfig::default() };
        let mut a = SimulatedArena::new(config.clone()).unwrap();
        let mut b = SimulatedArena::new(config).unwrap();
        let obs_a = a.reset().unwrap();
        let obs_b = b.reset().unwrap();
        assert_eq!(obs_a.critical_points.len(), 9);
        assert_eq!(obs_a.critical_points, obs_b.critical_points);
    }

    #[test]
    fn test_spawn_in_wall_rejected() {
        let config = ArenaConfig {
            num_agents: 1,
            spawn_points: vec![[0.5, 1.0, 0.5]],
            ..ArenaConfig::default()
        };
        assert!(SimulatedArena::new(config).is_err());
    }
}
