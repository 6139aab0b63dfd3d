use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Deserialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CaptureError, Result};
use crate::loss::{HuberLoss, Loss};
use crate::network::QNetwork;
use crate::layers::WeightInit;
use crate::optimizer::{GradientClipper, OptimizerConfig, OptimizerWrapper};
use crate::replay_buffer::{ReplayBuffer, Transition};
use super::config::AgentConfig;

/// Scalar training state written next to the parameter blobs
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AgentCheckpoint {
    pub epsilon: f32,
    pub step_count: u64,
    pub loss_history: Vec<f32>,
}

/// `{prefix}{suffix}` without treating the suffix as a path component
pub fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Deep Q-Network agent with a hard-synced target network.
///
/// The agent owns its replay buffer and a single seeded generator that drives
/// exploration and batch sampling. Network weights and dropout mask seeds are
/// drawn from the same generator, so an agent is fully determined by its
/// config and dimensions. Loading a checkpoint reseeds the dropout layers
/// from it too.
///
/// # Example
///
/// ```rust
/// use capture_rl::agent::{AgentConfig, DqnAgent};
/// use capture_rl::replay_buffer::Transition;
/// use ndarray::Array1;
///
/// let config = AgentConfig {
///     hidden_dims: vec![16],
///     batch_size: 4,
///     buffer_capacity: 100,
///     ..AgentConfig::default()
/// };
/// let mut agent = DqnAgent::new(6, 5, config).unwrap();
///
/// let state = Array1::zeros(6);
/// let action = agent.select_action(state.view(), true).unwrap();
/// agent.remember(Transition {
///     state: state.clone(),
///     action,
///     reward: 0.5,
///     next_state: state,
///     done: false,
/// }).unwrap();
///
/// // Fewer transitions than one batch: nothing to learn yet
/// assert_eq!(agent.train_step().unwrap(), None);
/// ```
pub struct DqnAgent {
    /// Network trained every step and used for action selection
    pub online: QNetwork,

    /// Frozen copy used for bootstrapped targets
    pub target: QNetwork,

    optimizer: OptimizerWrapper,
    loss: HuberLoss,
    buffer: ReplayBuffer,
    config: AgentConfig,
    state_dim: usize,
    action_dim: usize,
    epsilon: f32,
    step_count: u64,
    loss_history: Vec<f32>,
    rng: StdRng,
}

impl DqnAgent {
    pub fn new(state_dim: usize, action_dim: usize, config: AgentConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let online = QNetwork::with_init(
            state_dim,
            &config.hidden_dims,
            action_dim,
            config.dropout_rate,
            config.weight_init,
            &mut rng,
        )?;
        let target = online.clone();

        Ok(DqnAgent {
            online,
            target,
            optimizer: config.optimizer.build(),
            loss: HuberLoss::new(config.huber_delta),
            buffer: ReplayBuffer::new(config.buffer_capacity),
            state_dim,
            action_dim,
            epsilon: config.epsilon_start,
            step_count: 0,
            loss_history: Vec::new(),
            rng,
            config,
        })
    }

    /// Epsilon-greedy when `training`, greedy otherwise. Ties go to the lowest index.
    pub fn select_action(&mut self, state: ArrayView1<f32>, training: bool) -> Result<usize> {
        if state.len() != self.state_dim {
            return Err(CaptureError::shape("agent state", self.state_dim, state.len()));
        }

        if training && self.rng.gen::<f32>() < self.epsilon {
            return Ok(self.rng.gen_range(0..self.action_dim));
        }

        let q_values = self.online.forward(state)?;
        Ok(argmax(q_values.view()))
    }

    /// Online-network action values in inference mode
    pub fn q_values(&mut self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        if state.len() != self.state_dim {
            return Err(CaptureError::shape("agent state", self.state_dim, state.len()));
        }
        self.online.forward(state)
    }

    /// Store a transition after checking it matches the agent's dimensions
    pub fn remember(&mut self, transition: Transition) -> Result<()> {
        if transition.state.len() != self.state_dim {
            return Err(CaptureError::shape("transition state", self.state_dim, transition.state.len()));
        }
        if transition.next_state.len() != self.state_dim {
            return Err(CaptureError::shape(
                "transition next_state",
                self.state_dim,
                transition.next_state.len(),
            ));
        }
        if transition.action >= self.action_dim {
            return Err(CaptureError::InvalidAction {
                action: transition.action,
                max_actions: self.action_dim,
            });
        }
        self.buffer.push(transition);
        Ok(())
    }

    /// Run one update on a sampled batch.
    ///
    /// Returns `Ok(None)` while the buffer holds fewer than `batch_size`
    /// transitions, otherwise the batch Huber loss.
    pub fn train_step(&mut self) -> Result<Option<f32>> {
        let batch = match self.buffer.sample(self.config.batch_size, &mut self.rng) {
            Ok(batch) => batch,
            Err(e) if e.is_recoverable() => return Ok(None),
            Err(e) => return Err(e),
        };
        let batch_size = batch.len();

        let next_q_values = self.target.forward_batch(batch.next_states.view(), false)?;
        let q_values = self.online.forward_batch(batch.states.view(), true)?;

        let mut current = Array1::zeros(batch_size);
        let mut targets = Array1::zeros(batch_size);
        for i in 0..batch_size {
            let action = batch.actions[i];
            current[i] = q_values[[i, action]];
            targets[i] = if batch.dones[i] {
                batch.rewards[i]
            } else {
                let max_next_q = next_q_values
                    .row(i)
                    .iter()
                    .fold(f32::NEG_INFINITY, |max, &val| max.max(val));
                batch.rewards[i] + self.config.gamma * max_next_q
            };
        }

        let loss = self.loss.compute(current.view(), targets.view());
        if !loss.is_finite() {
            return Err(CaptureError::Training(format!(
                "non-finite loss {} at step {}",
                loss, self.step_count
            )));
        }

        // Only the taken action's output receives an error signal
        let loss_gradient = self.loss.gradient(current.view(), targets.view());
        let mut output_errors = Array2::zeros((batch_size, self.action_dim));
        for (i, &action) in batch.actions.iter().enumerate() {
            output_errors[[i, action]] = loss_gradient[i];
        }

        let mut gradients = self.online.backward(output_errors.view())?;
        let grad_norm = self.config.gradient_clipper.clip(&mut gradients);
        self.online
            .apply_gradients(&gradients, &mut self.optimizer, self.config.learning_rate)?;

        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_end);
        self.step_count += 1;
        if self.step_count % self.config.target_update_freq as u64 == 0 {
            self.sync_target()?;
            debug!(step = self.step_count, "target network synchronized");
        }
        self.loss_history.push(loss);
        debug!(step = self.step_count, loss, grad_norm, epsilon = self.epsilon, "train step");

        Ok(Some(loss))
    }

    /// Copy the online parameters into the target network verbatim
    pub fn sync_target(&mut self) -> Result<()> {
        self.target.copy_parameters_from(&self.online)
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn loss_history(&self) -> &[f32] {
        &self.loss_history
    }

    pub fn optimizer(&self) -> &OptimizerWrapper {
        &self.optimizer
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    pub fn checkpoint(&self) -> AgentCheckpoint {
        AgentCheckpoint {
            epsilon: self.epsilon,
            step_count: self.step_count,
            loss_history: self.loss_history.clone(),
        }
    }

    /// Write `{prefix}_online.bin`, `{prefix}_target.bin` and `{prefix}_state.json`
    pub fn save<P: AsRef<Path>>(&self, prefix: P) -> Result<()> {
        let prefix = prefix.as_ref();
        if let Some(parent) = prefix.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.online.save(with_suffix(prefix, "_online.bin"))?;
        self.target.save(with_suffix(prefix, "_target.bin"))?;
        let state = serde_json::to_string_pretty(&self.checkpoint())?;
        fs::write(with_suffix(prefix, "_state.json"), state)?;
        debug!(prefix = %prefix.display(), step = self.step_count, "agent saved");
        Ok(())
    }

    /// Restore a checkpoint written by [`DqnAgent::save`].
    ///
    /// Nothing is modified unless every file decodes and matches this agent's
    /// dimensions. The replay buffer keeps its contents. Optimizer moments are
    /// not checkpointed, so the optimizer restarts from a fresh state. A saved
    /// epsilon below this agent's floor is raised to the floor.
    pub fn load<P: AsRef<Path>>(&mut self, prefix: P) -> Result<()> {
        let prefix = prefix.as_ref();

        let state_path = with_suffix(prefix, "_state.json");
        let data = fs::read(&state_path)?;
        let state: AgentCheckpoint = serde_json::from_slice(&data)
            .map_err(|e| CaptureError::corrupt_checkpoint(&state_path, e.to_string()))?;
        if !state.epsilon.is_finite() || !(0.0..=1.0).contains(&state.epsilon) {
            return Err(CaptureError::corrupt_checkpoint(
                &state_path,
                format!("epsilon {} outside [0, 1]", state.epsilon),
            ));
        }

        let mut online = self.load_network(&with_suffix(prefix, "_online.bin"))?;
        let mut target = self.load_network(&with_suffix(prefix, "_target.bin"))?;
        online.reseed_dropout(&mut self.rng);
        target.reseed_dropout(&mut self.rng);

        self.online = online;
        self.target = target;
        self.optimizer = self.config.optimizer.build();
        self.epsilon = state.epsilon.max(self.config.epsilon_end);
        self.step_count = state.step_count;
        self.loss_history = state.loss_history;
        debug!(prefix = %prefix.display(), step = self.step_count, "agent loaded");
        Ok(())
    }

    fn load_network(&self, path: &Path) -> Result<QNetwork> {
        let network = QNetwork::load(path)?;
        if network.input_dim() != self.state_dim || network.output_dim() != self.action_dim {
            return Err(CaptureError::corrupt_checkpoint(
                path,
                format!(
                    "network maps {} -> {}, agent expects {} -> {}",
                    network.input_dim(),
                    network.output_dim(),
                    self.state_dim,
                    self.action_dim
                ),
            ));
        }
        Ok(network)
    }
}

/// Index of the largest value, lowest index on ties. NaN never wins.
pub fn argmax(values: ArrayView1<f32>) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

/// Builder pattern for DqnAgent
pub struct DqnAgentBuilder {
    state_dim: Option<usize>,
    action_dim: Option<usize>,
    config: AgentConfig,
}

impl DqnAgentBuilder {
    pub fn new() -> Self {
        DqnAgentBuilder {
            state_dim: None,
            action_dim: None,
            config: AgentConfig::default(),
        }
    }

    pub fn state_dim(mut self, dim: usize) -> Self {
        self.state_dim = Some(dim);
        self
    }

    pub fn action_dim(mut self, dim: usize) -> Self {
        self.action_dim = Some(dim);
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hidden_dims(mut self, dims: &[usize]) -> Self {
        self.config.hidden_dims = dims.to_vec();
        self
    }

    pub fn dropout_rate(mut self, rate: f32) -> Self {
        self.config.dropout_rate = rate;
        self
    }

    pub fn weight_init(mut self, init: WeightInit) -> Self {
        self.config.weight_init = init;
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.config.optimizer = optimizer;
        self
    }

    pub fn learning_rate(mut self, lr: f32) -> Self {
        self.config.learning_rate = lr;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.config.gamma = gamma;
        self
    }

    pub fn epsilon(mut self, start: f32, end: f32, decay: f32) -> Self {
        self.config.epsilon_start = start;
        self.config.epsilon_end = end;
        self.config.epsilon_decay = decay;
        self
    }

    pub fn target_update_freq(mut self, freq: usize) -> Self {
        self.config.target_update_freq = freq;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity;
        self
    }

    pub fn gradient_clipper(mut self, clipper: GradientClipper) -> Self {
        self.config.gradient_clipper = clipper;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn build(self) -> Result<DqnAgent> {
        let state_dim = self.state_dim.ok_or_else(|| {
            CaptureError::invalid_parameter("state_dim", "state dimension must be specified")
        })?;
        let action_dim = self.action_dim.ok_or_else(|| {
            CaptureError::invalid_parameter("action_dim", "action dimension must be specified")
        })?;
        DqnAgent::new(state_dim, action_dim, self.config)
    }
}

impl Default for DqnAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
