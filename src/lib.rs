//! # capture_rl - Multi-Agent DQN for Critical-Point Capture
//!
//! capture_rl trains several independent Deep Q-Network agents that compete
//! to capture "critical points" in a 3D arena. It covers the learning engine:
//! state encoding, experience replay, online/target value networks with a
//! Huber-loss update, potential-based reward shaping, and the multi-agent
//! episode loop with evaluation and checkpointing.
//!
//! The game itself is reached through the
//! [`EnvironmentAdapter`](environment::EnvironmentAdapter) trait. A
//! deterministic [`SimulatedArena`](environment::SimulatedArena) is included
//! so the whole pipeline runs in-process.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use capture_rl::environment::{ArenaConfig, SimulatedArena};
//! use capture_rl::training::{TrainingConfig, TrainingManager};
//!
//! let arena = SimulatedArena::new(ArenaConfig::default()).unwrap();
//! let mut manager = TrainingManager::new(arena, TrainingConfig::default()).unwrap();
//! let metrics = manager.train(2000).unwrap();
//! println!("episodes played: {}", metrics.episodes());
//! ```
//!
//! ## Module Organization
//!
//! - [`action`] - The fixed five-action vocabulary
//! - [`activations`] - Activation functions (ReLU, linear)
//! - [`agent`] - DQN agent, its configuration and builder
//! - [`encoder`] - Observation to feature-vector encoding
//! - [`environment`] - Adapter trait and the simulated arena
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense and dropout layers
//! - [`loss`] - Huber loss
//! - [`network`] - The Q-network
//! - [`observation`] - Typed observation records
//! - [`optimizer`] - Adam, SGD and gradient clipping
//! - [`replay_buffer`] - Experience replay
//! - [`reward`] - Reward shaping
//! - [`training`] - Episode orchestration, metrics and checkpoints

pub mod action;
pub mod activations;
pub mod agent;
pub mod encoder;
pub mod environment;
pub mod error;
pub mod layers;
pub mod loss;
pub mod network;
pub mod observation;
pub mod optimizer;
pub mod replay_buffer;
pub mod reward;
pub mod training;

#[cfg(test)]
mod tests;
