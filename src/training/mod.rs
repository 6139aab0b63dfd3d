//! # Training
//!
//! Multi-agent episode orchestration: [`TrainingManager`] runs episodes,
//! evaluates greedy policies on a schedule, and writes checkpoints.

pub mod checkpoint;
pub mod config;
pub mod manager;
pub mod metrics;

pub use checkpoint::{agent_prefix, load_metrics, metrics_path, save_metrics};
pub use config::TrainingConfig;
pub use manager::TrainingManager;
pub use metrics::{AgentEvaluation, EpisodeSummary, EvaluationReport, Statistics, TrainingMetrics};
