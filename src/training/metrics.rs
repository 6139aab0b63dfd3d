use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;

/// Summary statistics of a set of values. `std` is the population deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub mean: f32,
    pub std: f32,
    pub min: f32,
    pub max: f32,
    pub count: usize,
}

impl Statistics {
    pub fn from_slice(values: &[f32]) -> Self {
        if values.is_empty() {
            return Statistics {
                mean: 0.0,
                std: 0.0,
                min: 0.0,
                max: 0.0,
                count: 0,
            };
        }

        let count = values.len();
        let mean = values.iter().sum::<f32>() / count as f32;
        let variance = values.iter()
            .map(|&x| (x - mean).powi(2))
            .sum::<f32>() / count as f32;

        Statistics {
            mean,
            std: variance.sqrt(),
            min: values.iter().copied().fold(f32::INFINITY, f32::min),
            max: values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            count,
        }
    }
}

/// Outcome of one episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    /// Cumulative shaped reward per agent
    pub rewards: Vec<f32>,
    /// Ticks played; every agent acts once per tick
    pub length: usize,
    /// Owned points per agent in the last observation of the episode
    pub final_owned: Vec<u32>,
    pub winner: Option<usize>,
}

/// The agent holding strictly more points than every other agent, if any
pub fn winner(final_owned: &[u32]) -> Option<usize> {
    let (best, &most) = final_owned.iter().enumerate().max_by_key(|&(_, n)| *n)?;
    let ties = final_owned.iter().filter(|&&n| n == most).count();
    if most > 0 && ties == 1 {
        Some(best)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentEvaluation {
    pub agent_id: usize,
    pub reward: Statistics,
    pub win_rate: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub episodes: usize,
    pub agents: Vec<AgentEvaluation>,
}

impl EvaluationReport {
    pub fn from_episodes(num_agents: usize, summaries: &[EpisodeSummary]) -> Self {
        let agents = (0..num_agents)
            .map(|agent_id| {
                let rewards: Vec<f32> = summaries.iter().map(|s| s.rewards[agent_id]).collect();
                let wins = summaries.iter().filter(|s| s.winner == Some(agent_id)).count();
                let win_rate = if summaries.is_empty() {
                    0.0
                } else {
                    wins as f32 / summaries.len() as f32
                };
                AgentEvaluation {
                    agent_id,
                    reward: Statistics::from_slice(&rewards),
                    win_rate,
                }
            })
            .collect();
        EvaluationReport {
            episodes: summaries.len(),
            agents,
        }
    }
}

/// Aggregate history persisted with every checkpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub episode_rewards: BTreeMap<usize, Vec<f32>>,
    pub episode_lengths: Vec<usize>,
    pub win_rates: BTreeMap<usize, Vec<f32>>,
}

impl TrainingMetrics {
    pub fn new(num_agents: usize) -> Self {
        TrainingMetrics {
            episode_rewards: (0..num_agents).map(|id| (id, Vec::new())).collect(),
            episode_lengths: Vec::new(),
            win_rates: (0..num_agents).map(|id| (id, Vec::new())).collect(),
        }
    }

    pub fn record_episode(&mut self, summary: &EpisodeSummary) {
        for (id, &reward) in summary.rewards.iter().enumerate() {
            self.episode_rewards.entry(id).or_default().push(reward);
        }
        self.episode_lengths.push(summary.length);
    }

    pub fn record_evaluation(&mut self, report: &EvaluationReport) {
        for agent in &report.agents {
            self.win_rates.entry(agent.agent_id).or_default().push(agent.win_rate);
        }
    }

    /// Mean of the last `window` episode rewards, `None` until that many exist
    pub fn recent_mean_reward(&self, agent_id: usize, window: usize) -> Option<f32> {
        let rewards = self.episode_rewards.get(&agent_id)?;
        if window == 0 || rewards.len() < window {
            return None;
        }
        Some(Statistics::from_slice(&rewards[rewards.len() - window..]).mean)
    }

    pub fn episodes(&self) -> usize {
        self.episode_lengths.len()
    }
}
