use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{CaptureError, Result};
use super::initialization::WeightInit;
use super::traits::{Layer as LayerTrait, ParamGradients};

/// Values remembered from the last forward pass for backpropagation
#[derive(Clone, Debug)]
struct ForwardCache {
    inputs: Array2<f32>,
    pre_activation: Array2<f32>,
}

/// A fully connected (dense) layer in a neural network
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    #[serde(skip)]
    cache: Option<ForwardCache>,
}

impl DenseLayer {
    /// Create a new dense layer with weights drawn by `init` from `rng` and zero biases.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: WeightInit,
        rng: &mut R,
    ) -> Result<Self> {
        let weights = init.initialize_weights((input_size, output_size), rng)?;
        let biases = init.initialize_biases(output_size);
        Ok(DenseLayer {
            weights,
            biases,
            activation,
            cache: None,
        })
    }

    /// Overwrite parameters with another layer's, keeping this layer's cache
    pub fn copy_parameters_from(&mut self, other: &DenseLayer) -> Result<()> {
        if self.weights.dim() != other.weights.dim() {
            return Err(CaptureError::shape(
                "dense parameter copy",
                self.weights.len(),
                other.weights.len(),
            ));
        }
        self.weights.assign(&other.weights);
        self.biases.assign(&other.biases);
        Ok(())
    }
}

impl LayerTrait for DenseLayer {
    fn forward_batch(&mut self, inputs: ArrayView2<f32>, _training: bool) -> Result<Array2<f32>> {
        if inputs.ncols() != self.input_size() {
            return Err(CaptureError::shape("dense layer input", self.input_size(), inputs.ncols()));
        }
        let mut outputs = inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0));
        self.cache = Some(ForwardCache {
            inputs: inputs.to_owned(),
            pre_activation: outputs.clone(),
        });
        self.activation.apply_batch(&mut outputs);
        Ok(outputs)
    }

    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<(Array2<f32>, Option<ParamGradients>)> {
        let cache = self.cache.as_ref().ok_or_else(|| {
            CaptureError::Training("backward pass requested before forward pass".to_string())
        })?;

        let activation_deriv = self.activation.derivative_batch(cache.pre_activation.view());
        let adjusted_error = &output_errors * &activation_deriv;
        let weight_gradients = cache.inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));
        let input_error = adjusted_error.dot(&self.weights.t());

        Ok((
            input_error,
            Some(ParamGradients {
                weights: weight_gradients,
                biases: bias_gradients,
            }),
        ))
    }

    fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }
}
