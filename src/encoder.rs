//! # State Encoding
//!
//! Turns an [`Observation`] into the fixed-length feature vector the value
//! network consumes. The layout is:
//!
//! | block | width |
//! |---|---|
//! | agent position | 3 |
//! | critical points, `max_points` slots of horizontal position(2) + color one-hot(4) + available(1) | `7 * max_points` |
//! | navigation grid | `grid_size²` |
//! | time remaining | 1 |
//! | nearest unclaimed / nearest enemy distance | 2 |
//!
//! Critical points sit at a fixed height, so a point slot carries only its
//! normalized x and z coordinates. The agent position keeps all three axes.
//!
//! Color buckets are neutral, agent 0, agent 1, and "agent 2 or higher".
//! With more than three agents the last bucket is shared, so the encoding
//! cannot tell those owners apart.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, Result};
use crate::observation::Observation;

/// Features per critical point slot
pub const POINT_FEATURES: usize = 7;

/// Width of the color one-hot block
pub const COLOR_BUCKETS: usize = 4;

/// Divisor applied to heights
pub const VERTICAL_SCALE: f32 = 5.0;

/// Length of every encoded state for the given configuration
pub fn compute_feature_dim(max_points: usize, grid_size: usize) -> usize {
    3 + max_points * POINT_FEATURES + grid_size * grid_size + 1 + 2
}

/// One-hot slot for an owner color
pub fn color_bucket(color: Option<u32>) -> usize {
    match color {
        None => 0,
        Some(owner) => (owner as usize).saturating_add(1).min(COLOR_BUCKETS - 1),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub max_points: usize,
    pub grid_size: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            max_points: 50,
            grid_size: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateEncoder {
    config: EncoderConfig,
}

impl StateEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        StateEncoder { config }
    }

    pub fn with_dims(max_points: usize, grid_size: usize) -> Self {
        Self::new(EncoderConfig { max_points, grid_size })
    }

    pub fn config(&self) -> EncoderConfig {
        self.config
    }

    pub fn feature_dim(&self) -> usize {
        compute_feature_dim(self.config.max_points, self.config.grid_size)
    }

    /// Encode an observation.
    ///
    /// Fails with [`CaptureError::Shape`] when the result would not be
    /// exactly [`StateEncoder::feature_dim`] long, which happens when the
    /// observation's navigation grid does not match `grid_size`.
    pub fn encode(&self, observation: &Observation) -> Result<Array1<f32>> {
        let map_size = observation.map_size;
        if !map_size.is_finite() || map_size <= 0.0 {
            return Err(CaptureError::invalid_parameter(
                "map_size",
                format!("must be positive and finite, got {}", map_size),
            ));
        }

        let expected = self.feature_dim();
        let mut features = Vec::with_capacity(expected);

        features.extend_from_slice(&normalize_position(&observation.agent_position, map_size));

        for slot in 0..self.config.max_points {
            match observation.critical_points.get(slot) {
                Some(point) => {
                    let [x, _, z] = normalize_position(&point.position, map_size);
                    features.extend_from_slice(&[x, z]);
                    let mut one_hot = [0.0; COLOR_BUCKETS];
                    one_hot[color_bucket(point.color)] = 1.0;
                    features.extend_from_slice(&one_hot);
                    features.push(if point.available { 1.0 } else { 0.0 });
                }
                None => features.extend_from_slice(&[0.0; POINT_FEATURES]),
            }
        }

        features.extend(observation.navigation_grid.iter().map(|&cell| f32::from(cell)));
        features.push(observation.time_remaining);
        features.push(observation.nearest_unclaimed_distance);
        features.push(observation.nearest_enemy_distance);

        if features.len() != expected {
            return Err(CaptureError::shape("encoded state", expected, features.len()));
        }

        Ok(Array1::from(features))
    }
}

impl Default for StateEncoder {
    fn default() -> Self {
        Self::new(EncoderConfig::default())
    }
}

/// Horizontal axes shift into [0, 1] across the map; height uses a fixed scale
fn normalize_position(position: &[f32; 3], map_size: f32) -> [f32; 3] {
    let half = map_size / 2.0;
    [
        (position[0] + half) / map_size,
        position[1] / VERTICAL_SCALE,
        (position[2] + half) / map_size,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::CriticalPoint;
    use std::collections::BTreeMap;

    fn observation(points: Vec<CriticalPoint>, grid_size: usize) -> Observation {
        Observation {
            agent_position: [0.0, 1.0, 0.0],
            critical_points: points,
            agent_owned_points: BTreeMap::new(),
            time_remaining: 0.8,
            navigation_grid: vec![0; grid_size * grid_size],
            nearest_unclaimed_distance: 0.5,
            nearest_enemy_distance: 0.7,
            map_size: 10.0,
        }
    }

    #[test]
    fn test_feature_dim_formula() {
        assert_eq!(compute_feature_dim(50, 15), 581);
        assert_eq!(compute_feature_dim(0, 0), 6);
        assert_eq!(StateEncoder::default().feature_dim(), 581);
    }

    #[test]
    fn test_layout() {
        let encoder = StateEncoder::with_dims(2, 2);
        let mut obs = observation(
            vec![
                CriticalPoint::neutral([5.0, 2.5, -5.0]),
                CriticalPoint { position: [0.0, 0.0, 0.0], color: Some(0), available: false },
            ],
            2,
        );
        obs.navigation_grid = vec![0, 1, 1, 0];
        let state = encoder.encode(&obs).unwrap();

        let expected = [
            0.5, 0.2, 0.5, // agent
            1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, // neutral point
            0.5, 0.5, 0.0, 1.0, 0.0, 0.0, 0.0, // owned by agent 0, locked
            0.0, 1.0, 1.0, 0.0, // grid
            0.8, 0.5, 0.7,
        ];
        assert_eq!(expected.len(), encoder.feature_dim());
        assert_eq!(state.len(), expected.len());
        for (got, want) in state.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-6, "got {} want {}", got, want);
        }
    }

    #[test]
    fn test_padding_and_truncation() {
        let encoder = StateEncoder::with_dims(3, 2);
        let few = observation(vec![CriticalPoint::neutral([1.0, 1.0, 1.0])], 2);
        let state = encoder.encode(&few).unwrap();
        assert_eq!(state.len(), encoder.feature_dim());
        assert!(state.slice(ndarray::s![10..24]).iter().all(|&v| v == 0.0));

        let many = observation((0..10).map(|i| CriticalPoint::neutral([i as f32, 0.0, 0.0])).collect(), 2);
        assert_eq!(encoder.encode(&many).unwrap().len(), encoder.feature_dim());
    }

    #[test]
    fn test_every_slot_has_point_width() {
        let encoder = StateEncoder::with_dims(4, 3);
        for count in 0..=6 {
            let points = (0..count)
                .map(|i| CriticalPoint::owned([i as f32, 1.0, -(i as f32)], i as u32))
                .collect();
            let state = encoder.encode(&observation(points, 3)).unwrap();
            assert_eq!(state.len(), compute_feature_dim(4, 3));
        }
    }

    #[test]
    fn test_color_buckets_collapse_above_two() {
        assert_eq!(color_bucket(None), 0);
        assert_eq!(color_bucket(Some(0)), 1);
        assert_eq!(color_bucket(Some(1)), 2);
        assert_eq!(color_bucket(Some(2)), 3);
        assert_eq!(color_bucket(Some(7)), 3);
        assert_eq!(color_bucket(Some(u32::MAX)), 3);
    }

    #[test]
    fn test_grid_mismatch_is_shape_error() {
        let encoder = StateEncoder::with_dims(2, 3);
        let obs = observation(vec![], 2);
        let err = encoder.encode(&obs).unwrap_err();
        assert!(matches!(err, CaptureError::Shape { expected: 29, actual: 24, .. }));
    }
}
