//! # Reward Shaping
//!
//! Per-agent scalar reward computed from the agent's previous snapshot and
//! the latest observation. The shaping terms are potential based: they pay
//! for reducing the distance to the nearest unclaimed point and, at a higher
//! rate, to the nearest point held by another agent.

use serde::{Serialize, Deserialize};

use crate::observation::{CriticalPoint, Observation};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Reward per point gained, penalty per point lost
    pub point_scale: f32,
    pub unclaimed_scale: f32,
    pub enemy_scale: f32,
    /// Subtracted every step
    pub time_penalty: f32,
    /// Final reward is clipped to `[-clip, clip]`
    pub clip: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            point_scale: 1.0,
            unclaimed_scale: 0.1,
            enemy_scale: 0.2,
            time_penalty: 0.01,
            clip: 5.0,
        }
    }
}

/// What the shaper remembers about an agent between two of its steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub owned_points: u32,
    pub position: [f32; 3],
}

impl AgentSnapshot {
    pub fn capture(observation: &Observation, agent_id: usize) -> Self {
        AgentSnapshot {
            owned_points: observation.owned_points(agent_id),
            position: observation.agent_position,
        }
    }
}

/// Individual reward terms before clipping
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RewardBreakdown {
    pub point_delta: f32,
    pub unclaimed_shaping: f32,
    pub enemy_shaping: f32,
    pub time_penalty: f32,
}

impl RewardBreakdown {
    pub fn total(&self) -> f32 {
        self.point_delta + self.unclaimed_shaping + self.enemy_shaping + self.time_penalty
    }
}

#[derive(Debug, Clone, Default)]
pub struct RewardShaper {
    config: RewardConfig,
}

impl RewardShaper {
    pub fn new(config: RewardConfig) -> Self {
        RewardShaper { config }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Clipped reward for `agent_id`. Never NaN and always within the clip range.
    pub fn reward(&self, previous: Option<&AgentSnapshot>, observation: &Observation, agent_id: usize) -> f32 {
        let total = self.breakdown(previous, observation, agent_id).total();
        let clip = self.config.clip.abs();
        if total.is_nan() {
            return 0.0;
        }
        total.clamp(-clip, clip)
    }

    pub fn breakdown(&self, previous: Option<&AgentSnapshot>, observation: &Observation, agent_id: usize) -> RewardBreakdown {
        let owned_now = i64::from(observation.owned_points(agent_id));
        let owned_before = previous.map(|p| i64::from(p.owned_points)).unwrap_or(0);
        let point_delta = self.config.point_scale * (owned_now - owned_before) as f32;

        let (unclaimed_shaping, enemy_shaping) = match previous {
            Some(snapshot) => {
                let unclaimed = approach(
                    observation,
                    &snapshot.position,
                    CriticalPoint::is_unclaimed,
                );
                let enemy = approach(observation, &snapshot.position, |p| p.is_enemy_of(agent_id));
                (
                    self.config.unclaimed_scale * unclaimed,
                    self.config.enemy_scale * enemy,
                )
            }
            None => (0.0, 0.0),
        };

        RewardBreakdown {
            point_delta: finite_or_zero(point_delta),
            unclaimed_shaping: finite_or_zero(unclaimed_shaping),
            enemy_shaping: finite_or_zero(enemy_shaping),
            time_penalty: -self.config.time_penalty,
        }
    }
}

/// Decrease in distance to the nearest qualifying point, both measured
/// against the current point set. Zero when no point qualifies.
fn approach<F>(observation: &Observation, previous_position: &[f32; 3], filter: F) -> f32
where
    F: Fn(&CriticalPoint) -> bool,
{
    let before = observation.nearest_distance(previous_position, &filter);
    let now = observation.nearest_distance(&observation.agent_position, &filter);
    match (before, now) {
        (Some(before), Some(now)) => before - now,
        _ => 0.0,
    }
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
