//! # Environments
//!
//! The engine reaches the game only through [`EnvironmentAdapter`]. An adapter
//! is a blocking oracle: `reset` starts an episode, `step` applies one agent's
//! action and reports what that agent sees afterwards. Agents act one at a time,
//! so the adapter always knows whose turn it is from the `agent_id` argument.

pub mod arena;

use serde::{Serialize, Deserialize};

use crate::action::Action;
use crate::error::Result;
use crate::observation::Observation;

pub use arena::{ArenaConfig, SimulatedArena};

/// Bookkeeping returned alongside every step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Step calls since the last reset, across all agents
    pub step: usize,
    /// Points owned by the acting agent after the step
    pub owned_points: u32,
    pub total_points: usize,
    /// False when the move was blocked and reverted
    pub action_success: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observation: Observation,
    /// The adapter's own reward signal. Training uses the shaped reward instead.
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

/// Environment interface consumed by the training loop
pub trait EnvironmentAdapter {
    /// Start a new episode and return the opening observation
    fn reset(&mut self) -> Result<Observation>;

    /// Apply `action` for `agent_id`.
    /// Fails with [`CaptureError::AdapterUnavailable`](crate::error::CaptureError::AdapterUnavailable)
    /// when no episode is running.
    fn step(&mut self, action: Action, agent_id: usize) -> Result<StepOutcome>;

    /// Number of agents the environment hosts
    fn num_agents(&self) -> usize;
}

impl<E: EnvironmentAdapter + ?Sized> EnvironmentAdapter for Box<E> {
    fn reset(&mut self) -> Result<Observation> {
        (**self).reset()
    }

    fn step(&mut self, action: Action, agent_id: usize) -> Result<StepOutcome> {
        (**self).step(action, agent_id)
    }

    fn num_agents(&self) -> usize {
        (**self).num_agents()
    }
}
