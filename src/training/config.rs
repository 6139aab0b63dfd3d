use serde::{Serialize, Deserialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::agent::AgentConfig;
use crate::encoder::EncoderConfig;
use crate::error::{CaptureError, Result};
use crate::reward::RewardConfig;

/// Everything a training run needs apart from the environment.
///
/// Interval fields set to 0 disable the corresponding periodic task.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    pub num_agents: usize,
    pub max_steps_per_episode: usize,
    /// An agent starts learning once its buffer holds more than this many transitions
    pub warmup_transitions: usize,
    pub eval_interval: usize,
    pub eval_episodes: usize,
    pub save_interval: usize,
    pub log_interval: usize,
    pub save_dir: PathBuf,
    /// Agent `i` is seeded with `seed + i`
    pub seed: u64,
    pub agent: AgentConfig,
    pub reward: RewardConfig,
    pub encoder: EncoderConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            num_agents: 3,
            max_steps_per_episode: 1000,
            warmup_transitions: 1000,
            eval_interval: 50,
            eval_episodes: 5,
            save_interval: 100,
            log_interval: 10,
            save_dir: PathBuf::from("dqn_models"),
            seed: 42,
            agent: AgentConfig::default(),
            reward: RewardConfig::default(),
            encoder: EncoderConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: TrainingConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Agent hyper-parameters with the per-agent seed applied
    pub fn agent_config(&self, agent_id: usize) -> AgentConfig {
        AgentConfig {
            seed: self.seed.wrapping_add(agent_id as u64),
            ..self.agent.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_agents == 0 {
            return Err(CaptureError::invalid_parameter("num_agents", "must be at least 1"));
        }
        if self.max_steps_per_episode == 0 {
            return Err(CaptureError::invalid_parameter("max_steps_per_episode", "must be at least 1"));
        }
        if self.eval_interval > 0 && self.eval_episodes == 0 {
            return Err(CaptureError::invalid_parameter(
                "eval_episodes",
                "must be at least 1 when evaluation is enabled",
            ));
        }
        if self.reward.clip.is_nan() || self.reward.clip < 0.0 {
            return Err(CaptureError::invalid_parameter(
                "reward.clip",
                format!("must be non-negative, got {}", self.reward.clip),
            ));
        }
        self.agent.validate()
    }
}
