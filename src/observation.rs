use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CaptureError, Result};

/// A capturable objective in the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalPoint {
    pub position: [f32; 3],

    /// Owning agent id, `None` while neutral
    #[serde(default)]
    pub color: Option<u32>,

    /// False while the point is being actively claimed
    pub available: bool,
}

impl CriticalPoint {
    pub fn neutral(position: [f32; 3]) -> Self {
        CriticalPoint {
            position,
            color: None,
            available: true,
        }
    }

    pub fn owned(position: [f32; 3], owner: u32) -> Self {
        CriticalPoint {
            position,
            color: Some(owner),
            available: true,
        }
    }

    pub fn is_unclaimed(&self) -> bool {
        self.color.is_none()
    }

    /// Owned by some agent other than `agent_id`
    pub fn is_enemy_of(&self, agent_id: usize) -> bool {
        matches!(self.color, Some(owner) if owner as usize != agent_id)
    }
}

/// Straight-line distance between two points
pub fn distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

fn default_time_remaining() -> f32 {
    1.0
}

fn default_distance() -> f32 {
    1.0
}

fn default_map_size() -> f32 {
    10.0
}

/// What one agent sees after a reset or a step.
///
/// Field names match the dictionaries the game bridge produces so that a
/// JSON record can be decoded directly with [`Observation::from_json`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub agent_position: [f32; 3],

    /// Registry order is preserved; the encoder relies on it for slot alignment
    #[serde(default)]
    pub critical_points: Vec<CriticalPoint>,

    /// Owned point count keyed by agent id as a string
    #[serde(default)]
    pub agent_owned_points: BTreeMap<String, u32>,

    #[serde(default = "default_time_remaining")]
    pub time_remaining: f32,

    /// Row-major square grid around the agent, 0 = walkable, 1 = wall
    pub navigation_grid: Vec<u8>,

    #[serde(default = "default_distance")]
    pub nearest_unclaimed_distance: f32,

    #[serde(default = "default_distance")]
    pub nearest_enemy_distance: f32,

    #[serde(default = "default_map_size")]
    pub map_size: f32,
}

impl Observation {
    /// Decode a wire record. Call [`Observation::validate`] before use.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Points currently owned by `agent_id`
    pub fn owned_points(&self, agent_id: usize) -> u32 {
        self.agent_owned_points
            .get(&agent_id.to_string())
            .copied()
            .unwrap_or(0)
    }

    pub fn is_out_of_time(&self) -> bool {
        self.time_remaining <= 0.0
    }

    /// Distance from `from` to the closest point matching `filter`, if any
    pub fn nearest_distance<F>(&self, from: &[f32; 3], filter: F) -> Option<f32>
    where
        F: Fn(&CriticalPoint) -> bool,
    {
        self.critical_points
            .iter()
            .filter(|point| filter(point))
            .map(|point| distance(from, &point.position))
            .fold(None, |best, d| match best {
                Some(b) if b <= d => Some(b),
                _ => Some(d),
            })
    }

    /// Reject records that would corrupt the encoded state
    pub fn validate(&self, grid_size: usize) -> Result<()> {
        let expected_cells = grid_size * grid_size;
        if self.navigation_grid.len() != expected_cells {
            return Err(CaptureError::shape(
                "observation navigation_grid",
                expected_cells,
                self.navigation_grid.len(),
            ));
        }

        if let Some(cell) = self.navigation_grid.iter().find(|&&c| c > 1) {
            return Err(CaptureError::invalid_parameter(
                "navigation_grid",
                format!("cells must be 0 (walkable) or 1 (wall), found {}", cell),
            ));
        }

        if !self.map_size.is_finite() || self.map_size <= 0.0 {
            return Err(CaptureError::invalid_parameter(
                "map_size",
                format!("must be positive and finite, got {}", self.map_size),
            ));
        }

        if !(0.0..=1.0).contains(&self.time_remaining) {
            return Err(CaptureError::invalid_parameter(
                "time_remaining",
                format!("must lie in [0, 1], got {}", self.time_remaining),
            ));
        }

        let positions = std::iter::once(&self.agent_position)
            .chain(self.critical_points.iter().map(|p| &p.position));
        for position in positions {
            if position.iter().any(|c| !c.is_finite()) {
                return Err(CaptureError::invalid_parameter(
                    "position",
                    format!("coordinates must be finite, got {:?}", position),
                ));
            }
        }

        if !self.nearest_unclaimed_distance.is_finite() || !self.nearest_enemy_distance.is_finite() {
            return Err(CaptureError::invalid_parameter(
                "nearest_distance",
                "objective distances must be finite",
            ));
        }

        Ok(())
    }
}
