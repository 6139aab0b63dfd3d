//! # Optimizers
//!
//! Parameter update rules. Every parameter tensor of a network is addressed by
//! a stable `slot` index so stateful optimizers can keep per-tensor moments.

pub mod gradient_clipper;

use ndarray::{Array, Array1, Array2, Dimension, Zip};
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;

use crate::error::{CaptureError, Result};

pub use gradient_clipper::GradientClipper;

pub trait Optimizer {
    /// Called once before the updates of one training step
    fn begin_step(&mut self) {}

    fn update_weights(&mut self, slot: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32);

    fn update_biases(&mut self, slot: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32);
}

/// Serializable choice of update rule, turned into a fresh optimizer by [`OptimizerConfig::build`]
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum OptimizerConfig {
    SGD,
    Adam { beta1: f32, beta2: f32, epsilon: f32 },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Adam { beta1: 0.9, beta2: 0.999, epsilon: 1e-7 }
    }
}

impl OptimizerConfig {
    /// An optimizer with no accumulated state
    pub fn build(&self) -> OptimizerWrapper {
        match *self {
            OptimizerConfig::SGD => OptimizerWrapper::SGD(SGD::new()),
            OptimizerConfig::Adam { beta1, beta2, epsilon } => OptimizerWrapper::Adam(Adam::new(beta1, beta2, epsilon)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let OptimizerConfig::Adam { beta1, beta2, epsilon } = *self {
            if !(0.0..1.0).contains(&beta1) || !(0.0..1.0).contains(&beta2) {
                return Err(CaptureError::invalid_parameter(
                    "optimizer",
                    format!("Adam betas must lie in [0, 1), got {} and {}", beta1, beta2),
                ));
            }
            if !epsilon.is_finite() || epsilon <= 0.0 {
                return Err(CaptureError::invalid_parameter(
                    "optimizer",
                    format!("Adam epsilon must be positive, got {}", epsilon),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
}

impl Optimizer for OptimizerWrapper {
    fn begin_step(&mut self) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.begin_step(),
            OptimizerWrapper::Adam(optimizer) => optimizer.begin_step(),
        }
    }

    fn update_weights(&mut self, slot: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_weights(slot, weights, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_weights(slot, weights, gradients, learning_rate),
        }
    }

    fn update_biases(&mut self, slot: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_biases(slot, biases, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_biases(slot, biases, gradients, learning_rate),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Optimizer for SGD {
    fn update_weights(&mut self, _slot: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        weights.zip_mut_with(gradients, |w, &g| *w -= learning_rate * g);
    }

    fn update_biases(&mut self, _slot: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        biases.zip_mut_with(gradients, |b, &g| *b -= learning_rate * g);
    }
}

/// Adam with bias-corrected first and second moments kept per slot
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    /// Number of steps taken so far
    pub t: i32,
    weight_moments: BTreeMap<usize, (Array2<f32>, Array2<f32>)>,
    bias_moments: BTreeMap<usize, (Array1<f32>, Array1<f32>)>,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            t: 0,
            weight_moments: BTreeMap::new(),
            bias_moments: BTreeMap::new(),
        }
    }

    fn corrections(&self) -> (f32, f32) {
        let t = self.t.max(1);
        (1.0 - self.beta1.powi(t), 1.0 - self.beta2.powi(t))
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.9, 0.999, 1e-7)
    }
}

fn adam_update<D: Dimension>(
    params: &mut Array<f32, D>,
    gradients: &Array<f32, D>,
    m: &mut Array<f32, D>,
    v: &mut Array<f32, D>,
    hyper: (f32, f32, f32),
    corrections: (f32, f32),
    learning_rate: f32,
) {
    let (beta1, beta2, epsilon) = hyper;
    let (c1, c2) = corrections;
    Zip::from(params)
        .and(gradients)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            let m_hat = *m / c1;
            let v_hat = *v / c2;
            *p -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
        });
}

impl Optimizer for Adam {
    fn begin_step(&mut self) {
        self.t = self.t.saturating_add(1);
    }

    fn update_weights(&mut self, slot: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        let hyper = (self.beta1, self.beta2, self.epsilon);
        let corrections = self.corrections();
        let (m, v) = self
            .weight_moments
            .entry(slot)
            .or_insert_with(|| (Array2::zeros(weights.raw_dim()), Array2::zeros(weights.raw_dim())));
        adam_update(weights, gradients, m, v, hyper, corrections, learning_rate);
    }

    fn update_biases(&mut self, slot: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        let hyper = (self.beta1, self.beta2, self.epsilon);
        let corrections = self.corrections();
        let (m, v) = self
            .bias_moments
            .entry(slot)
            .or_insert_with(|| (Array1::zeros(biases.raw_dim()), Array1::zeros(biases.raw_dim())));
        adam_update(biases, gradients, m, v, hyper, corrections, learning_rate);
    }
}
