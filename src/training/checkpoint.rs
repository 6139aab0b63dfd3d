//! On-disk layout of a training checkpoint.
//!
//! ```text
//! {save_dir}/agent_{id}_episode_{tag}_online.bin
//! {save_dir}/agent_{id}_episode_{tag}_target.bin
//! {save_dir}/agent_{id}_episode_{tag}_state.json
//! {save_dir}/metrics_{tag}.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CaptureError, Result};
use super::metrics::TrainingMetrics;

/// File prefix shared by the three files of one agent
pub fn agent_prefix(save_dir: &Path, agent_id: usize, tag: &str) -> PathBuf {
    save_dir.join(format!("agent_{}_episode_{}", agent_id, tag))
}

pub fn metrics_path(save_dir: &Path, tag: &str) -> PathBuf {
    save_dir.join(format!("metrics_{}.json", tag))
}

pub fn save_metrics(metrics: &TrainingMetrics, save_dir: &Path, tag: &str) -> Result<PathBuf> {
    fs::create_dir_all(save_dir)?;
    let path = metrics_path(save_dir, tag);
    fs::write(&path, serde_json::to_string_pretty(metrics)?)?;
    Ok(path)
}

pub fn load_metrics(save_dir: &Path, tag: &str) -> Result<TrainingMetrics> {
    let path = metrics_path(save_dir, tag);
    let data = fs::read(&path)?;
    serde_json::from_slice(&data).map_err(|e| CaptureError::corrupt_checkpoint(&path, e.to_string()))
}
