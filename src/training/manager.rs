use ndarray::Array1;
use std::fs;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::agent::DqnAgent;
use crate::encoder::StateEncoder;
use crate::environment::EnvironmentAdapter;
use crate::error::{CaptureError, Result};
use crate::observation::Observation;
use crate::replay_buffer::Transition;
use crate::reward::{AgentSnapshot, RewardShaper};
use super::checkpoint::{agent_prefix, save_metrics};
use super::config::TrainingConfig;
use super::metrics::{winner, EpisodeSummary, EvaluationReport, TrainingMetrics};

/// Episodes averaged in progress logs
const LOG_WINDOW: usize = 10;

/// Drives all agents through episodes against one environment.
///
/// Within a tick every agent first picks an action from its current state,
/// then the agents step the environment one at a time in id order. Later
/// agents therefore act on a world already changed by earlier ones.
pub struct TrainingManager<E: EnvironmentAdapter> {
    env: E,
    config: TrainingConfig,
    encoder: StateEncoder,
    shaper: RewardShaper,
    agents: Vec<DqnAgent>,
    metrics: TrainingMetrics,
}

impl<E: EnvironmentAdapter> TrainingManager<E> {
    pub fn new(env: E, config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        if env.num_agents() < config.num_agents {
            return Err(CaptureError::invalid_parameter(
                "num_agents",
                format!(
                    "environment hosts {} agents, configuration asks for {}",
                    env.num_agents(),
                    config.num_agents
                ),
            ));
        }
        if env.num_agents() > config.num_agents {
            warn!(
                hosted = env.num_agents(),
                trained = config.num_agents,
                "environment hosts more agents than are trained; the rest stay idle"
            );
        }

        let encoder = StateEncoder::new(config.encoder);
        let state_dim = encoder.feature_dim();
        let agents = (0..config.num_agents)
            .map(|id| DqnAgent::new(state_dim, Action::ALL.len(), config.agent_config(id)))
            .collect::<Result<Vec<_>>>()?;

        Ok(TrainingManager {
            env,
            shaper: RewardShaper::new(config.reward),
            metrics: TrainingMetrics::new(config.num_agents),
            encoder,
            agents,
            config,
        })
    }

    /// Train for `num_episodes`, then write the `final` checkpoint
    pub fn train(&mut self, num_episodes: usize) -> Result<&TrainingMetrics> {
        info!(
            episodes = num_episodes,
            state_dim = self.encoder.feature_dim(),
            agents = self.agents.len(),
            "starting training"
        );

        for episode in 0..num_episodes {
            let summary = self.run_episode(true)?;
            debug!(episode, length = summary.length, rewards = ?summary.rewards, "episode finished");

            if self.config.log_interval > 0 && episode % self.config.log_interval == 0 {
                let averages: Vec<String> = (0..self.agents.len())
                    .map(|id| {
                        let mean = self.metrics.recent_mean_reward(id, LOG_WINDOW).unwrap_or(0.0);
                        format!("{:.2}", mean)
                    })
                    .collect();
                let epsilons: Vec<String> = self.agents.iter().map(|a| format!("{:.3}", a.epsilon())).collect();
                info!(episode, avg_rewards = ?averages, epsilons = ?epsilons, "progress");
            }

            if self.config.eval_interval > 0 && episode % self.config.eval_interval == 0 && episode > 0 {
                self.evaluate(self.config.eval_episodes)?;
            }

            if self.config.save_interval > 0 && episode % self.config.save_interval == 0 && episode > 0 {
                self.save_checkpoint(&episode.to_string())?;
            }
        }

        info!("training completed");
        self.save_checkpoint("final")?;
        Ok(&self.metrics)
    }

    /// Play one episode.
    ///
    /// With `training` set, transitions are stored and agents learn once their
    /// buffer exceeds the warm-up threshold, and the episode is added to the
    /// metrics. Otherwise the policy is purely greedy and nothing is recorded.
    pub fn run_episode(&mut self, training: bool) -> Result<EpisodeSummary> {
        let grid_size = self.encoder.config().grid_size;
        let num_agents = self.agents.len();

        let initial = self.env.reset()?;
        initial.validate(grid_size)?;
        let initial_state = self.encoder.encode(&initial)?;

        // Every agent starts from the reset observation
        let mut states: Vec<Array1<f32>> = vec![initial_state; num_agents];
        let mut snapshots: Vec<Option<AgentSnapshot>> = vec![None; num_agents];
        let mut rewards = vec![0.0f32; num_agents];
        let mut last_observation: Observation = initial;
        let mut done = false;
        let mut step = 0;

        while !done && step < self.config.max_steps_per_episode {
            let mut actions = Vec::with_capacity(num_agents);
            for (agent, state) in self.agents.iter_mut().zip(&states) {
                actions.push(agent.select_action(state.view(), training)?);
            }

            for agent_id in 0..num_agents {
                let action = Action::from_id(actions[agent_id])?;
                let outcome = self.env.step(action, agent_id)?;
                outcome.observation.validate(grid_size)?;

                let next_state = self.encoder.encode(&outcome.observation)?;
                let reward = self
                    .shaper
                    .reward(snapshots[agent_id].as_ref(), &outcome.observation, agent_id);
                snapshots[agent_id] = Some(AgentSnapshot::capture(&outcome.observation, agent_id));
                rewards[agent_id] += reward;

                let terminal = outcome.done || outcome.observation.is_out_of_time();
                if training {
                    let agent = &mut self.agents[agent_id];
                    agent.remember(Transition {
                        state: states[agent_id].clone(),
                        action: actions[agent_id],
                        reward,
                        next_state: next_state.clone(),
                        done: terminal,
                    })?;
                    if agent.buffer().len() > self.config.warmup_transitions {
                        agent.train_step()?;
                    }
                }

                states[agent_id] = next_state;
                last_observation = outcome.observation;
                done |= terminal;
            }

            step += 1;
        }

        let final_owned: Vec<u32> = (0..num_agents)
            .map(|id| last_observation.owned_points(id))
            .collect();
        let summary = EpisodeSummary {
            rewards,
            length: step,
            winner: winner(&final_owned),
            final_owned,
        };

        if training {
            self.metrics.record_episode(&summary);
        }
        Ok(summary)
    }

    /// Run `num_episodes` greedy episodes and record each agent's win rate
    pub fn evaluate(&mut self, num_episodes: usize) -> Result<EvaluationReport> {
        let summaries = (0..num_episodes)
            .map(|_| self.run_episode(false))
            .collect::<Result<Vec<_>>>()?;

        let report = EvaluationReport::from_episodes(self.agents.len(), &summaries);
        for agent in &report.agents {
            info!(
                agent_id = agent.agent_id,
                mean = agent.reward.mean,
                std = agent.reward.std,
                win_rate = agent.win_rate,
                "evaluation over {} episodes",
                report.episodes
            );
        }
        self.metrics.record_evaluation(&report);
        Ok(report)
    }

    /// Save every agent and the metrics record under `tag`
    pub fn save_checkpoint(&self, tag: &str) -> Result<()> {
        let save_dir = &self.config.save_dir;
        fs::create_dir_all(save_dir)?;
        for (id, agent) in self.agents.iter().enumerate() {
            agent.save(agent_prefix(save_dir, id, tag))?;
        }
        let metrics_file = save_metrics(&self.metrics, save_dir, tag)?;
        info!(tag, metrics = %metrics_file.display(), "models and metrics saved");
        Ok(())
    }

    /// Restore every agent from the checkpoint saved under `tag`
    pub fn load_agents(&mut self, tag: &str) -> Result<()> {
        for (id, agent) in self.agents.iter_mut().enumerate() {
            agent.load(agent_prefix(&self.config.save_dir, id, tag))?;
        }
        info!(tag, agents = self.agents.len(), "agents restored");
        Ok(())
    }

    pub fn agents(&self) -> &[DqnAgent] {
        &self.agents
    }

    pub fn agent_mut(&mut self, agent_id: usize) -> Option<&mut DqnAgent> {
        self.agents.get_mut(agent_id)
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Replace the metrics, e.g. with a record loaded alongside a checkpoint
    pub fn set_metrics(&mut self, metrics: TrainingMetrics) {
        self.metrics = metrics;
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn encoder(&self) -> &StateEncoder {
        &self.encoder
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }
}
