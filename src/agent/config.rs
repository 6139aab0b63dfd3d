use serde::{Serialize, Deserialize};

use crate::error::{CaptureError, Result};
use crate::layers::WeightInit;
use crate::optimizer::{GradientClipper, OptimizerConfig};

/// Hyper-parameters of one learning agent and its value network
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    pub hidden_dims: Vec<usize>,
    pub dropout_rate: f32,
    pub weight_init: WeightInit,
    pub optimizer: OptimizerConfig,
    pub learning_rate: f32,
    /// Discount factor
    pub gamma: f32,
    pub epsilon_start: f32,
    /// Floor for the exploration rate
    pub epsilon_end: f32,
    /// Multiplicative decay applied after every training step
    pub epsilon_decay: f32,
    /// Training steps between hard target syncs
    pub target_update_freq: usize,
    pub batch_size: usize,
    pub buffer_capacity: usize,
    pub huber_delta: f32,
    pub gradient_clipper: GradientClipper,
    /// Seeds exploration, batch sampling, weight init and dropout
    pub seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            hidden_dims: vec![512, 256, 128],
            dropout_rate: 0.2,
            weight_init: WeightInit::XavierUniform,
            optimizer: OptimizerConfig::default(),
            learning_rate: 1e-4,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_end: 0.05,
            epsilon_decay: 0.995,
            target_update_freq: 1000,
            batch_size: 64,
            buffer_capacity: 100_000,
            huber_delta: 1.0,
            gradient_clipper: GradientClipper::default(),
            seed: 42,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(CaptureError::invalid_parameter(
                "learning_rate",
                format!("must be positive, got {}", self.learning_rate),
            ));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(CaptureError::invalid_parameter(
                "gamma",
                format!("must lie in [0, 1], got {}", self.gamma),
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon_end)
            || !(0.0..=1.0).contains(&self.epsilon_start)
            || self.epsilon_end > self.epsilon_start
        {
            return Err(CaptureError::invalid_parameter(
                "epsilon",
                format!(
                    "need 0 <= epsilon_end <= epsilon_start <= 1, got end {} start {}",
                    self.epsilon_end, self.epsilon_start
                ),
            ));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(CaptureError::invalid_parameter(
                "epsilon_decay",
                format!("must lie in (0, 1], got {}", self.epsilon_decay),
            ));
        }
        if self.target_update_freq == 0 {
            return Err(CaptureError::invalid_parameter("target_update_freq", "must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(CaptureError::invalid_parameter("batch_size", "must be at least 1"));
        }
        if self.buffer_capacity < self.batch_size {
            return Err(CaptureError::invalid_parameter(
                "buffer_capacity",
                format!(
                    "capacity {} cannot hold one batch of {}",
                    self.buffer_capacity, self.batch_size
                ),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(CaptureError::invalid_parameter(
                "dropout_rate",
                format!("must be in [0, 1), got {}", self.dropout_rate),
            ));
        }
        if !self.huber_delta.is_finite() || self.huber_delta <= 0.0 {
            return Err(CaptureError::invalid_parameter(
                "huber_delta",
                format!("must be positive, got {}", self.huber_delta),
            ));
        }
        self.optimizer.validate()
    }
}
