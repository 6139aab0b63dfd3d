use ndarray::{Array1, Array2, ArrayView2};

use crate::error::Result;

/// Gradients of one parameterised layer
#[derive(Clone, Debug)]
pub struct ParamGradients {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// Trait defining the interface for neural network layers
pub trait Layer {
    /// Perform forward propagation for a batch of inputs.
    /// `training` enables stochastic behaviour such as dropout.
    fn forward_batch(&mut self, inputs: ArrayView2<f32>, training: bool) -> Result<Array2<f32>>;

    /// Propagate output errors back through the layer.
    ///
    /// Returns the error with respect to the layer input and, for layers with
    /// parameters, the parameter gradients. Uses the values cached by the most
    /// recent [`Layer::forward_batch`].
    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<(Array2<f32>, Option<ParamGradients>)>;

    /// Get the input size of the layer
    fn input_size(&self) -> usize;

    /// Get the output size of the layer
    fn output_size(&self) -> usize;
}
