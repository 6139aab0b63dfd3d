use serde::{Serialize, Deserialize};

use crate::layers::ParamGradients;

/// Gradient clipping methods
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum GradientClipper {
    /// Clip gradients element-wise to a range
    ClipByValue { min: f32, max: f32 },

    /// Rescale each gradient tensor whose own L2 norm exceeds `max_norm`
    ClipByNorm { max_norm: f32 },

    /// Rescale all tensors together when their joint L2 norm exceeds `max_norm`
    ClipByGlobalNorm { max_norm: f32 },

    /// No clipping
    None,
}

impl Default for GradientClipper {
    fn default() -> Self {
        GradientClipper::ClipByNorm { max_norm: 1.0 }
    }
}

fn squared_sum<'a, I: Iterator<Item = &'a f32>>(values: I) -> f32 {
    values.map(|&g| g * g).sum()
}

impl GradientClipper {
    /// Clip `gradients` in place and return their global norm before clipping
    pub fn clip(&self, gradients: &mut [ParamGradients]) -> f32 {
        let global_norm = Self::compute_global_norm(gradients);

        match *self {
            GradientClipper::ClipByValue { min, max } => {
                for grad in gradients.iter_mut() {
                    grad.weights.mapv_inplace(|g| g.max(min).min(max));
                    grad.biases.mapv_inplace(|g| g.max(min).min(max));
                }
            }

            GradientClipper::ClipByNorm { max_norm } => {
                for grad in gradients.iter_mut() {
                    let weight_norm = squared_sum(grad.weights.iter()).sqrt();
                    if weight_norm > max_norm {
                        let scale = max_norm / weight_norm;
                        grad.weights.mapv_inplace(|g| g * scale);
                    }
                    let bias_norm = squared_sum(grad.biases.iter()).sqrt();
                    if bias_norm > max_norm {
                        let scale = max_norm / bias_norm;
                        grad.biases.mapv_inplace(|g| g * scale);
                    }
                }
            }

            GradientClipper::ClipByGlobalNorm { max_norm } => {
                if global_norm > max_norm {
                    let scale = max_norm / global_norm;
                    for grad in gradients.iter_mut() {
                        grad.weights.mapv_inplace(|g| g * scale);
                        grad.biases.mapv_inplace(|g| g * scale);
                    }
                }
            }

            GradientClipper::None => {}
        }

        global_norm
    }

    /// Compute global norm of all gradients
    pub fn compute_global_norm(gradients: &[ParamGradients]) -> f32 {
        gradients
            .iter()
            .map(|g| squared_sum(g.weights.iter()) + squared_sum(g.biases.iter()))
            .sum::<f32>()
            .sqrt()
    }
}
