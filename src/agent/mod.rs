//! # Agents
//!
//! [`DqnAgent`] is the learner each player in the arena runs. It pairs an
//! online and a target [`QNetwork`](crate::network::QNetwork), owns a replay
//! buffer, follows a decaying epsilon-greedy policy, and trains with a Huber
//! loss on bootstrapped one-step targets.
//!
//! ## Training step
//!
//! 1. Sample a batch uniformly from the replay buffer (skipped while warming up)
//! 2. `target = r + gamma * max_a Q_target(s', a)` for non-terminal transitions
//! 3. Huber loss against `Q_online(s, a)`, backpropagated through the online network only
//! 4. Clip each gradient tensor, apply an Adam update
//! 5. Decay epsilon towards its floor, and hard-copy the target every `target_update_freq` steps

mod config;
mod dqn;

pub use config::AgentConfig;
pub use dqn::{argmax, with_suffix, AgentCheckpoint, DqnAgent, DqnAgentBuilder};
