//! # Value Network
//!
//! [`QNetwork`] maps an encoded state to one value per discrete action. Each
//! agent owns two of them: the online network, updated every training step,
//! and the target network, refreshed by a verbatim copy on a fixed cadence.

use bincode::{deserialize, serialize};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;

use crate::activations::Activation;
use crate::error::{CaptureError, Result};
use crate::layers::{DenseLayer, DropoutLayer, LayerTrait, NetworkLayer, ParamGradients, WeightInit};
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// Stack of `Dense(ReLU) -> Dropout` blocks followed by a linear output layer
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct QNetwork {
    pub layers: Vec<NetworkLayer>,
}

impl QNetwork {
    /// Build a network with Glorot-uniform weights and zero biases.
    ///
    /// Weight draws and the dropout mask seeds all come from `rng`, so two
    /// networks built from equally seeded generators are identical.
    pub fn new<R: Rng + ?Sized>(
        input_dim: usize,
        hidden_dims: &[usize],
        output_dim: usize,
        dropout_rate: f32,
        rng: &mut R,
    ) -> Result<Self> {
        Self::with_init(input_dim, hidden_dims, output_dim, dropout_rate, WeightInit::XavierUniform, rng)
    }

    /// Same as [`QNetwork::new`] with every dense layer drawn by `init`
    pub fn with_init<R: Rng + ?Sized>(
        input_dim: usize,
        hidden_dims: &[usize],
        output_dim: usize,
        dropout_rate: f32,
        init: WeightInit,
        rng: &mut R,
    ) -> Result<Self> {
        if input_dim == 0 || output_dim == 0 || hidden_dims.contains(&0) {
            return Err(CaptureError::invalid_parameter(
                "layer_sizes",
                format!(
                    "all widths must be positive, got input {} hidden {:?} output {}",
                    input_dim, hidden_dims, output_dim
                ),
            ));
        }

        let mut layers = Vec::with_capacity(hidden_dims.len() * 2 + 1);
        let mut width = input_dim;
        for &hidden in hidden_dims {
            let dense = DenseLayer::new(width, hidden, Activation::Relu, init, rng)?;
            layers.push(NetworkLayer::Dense(dense));
            let dropout = DropoutLayer::new(hidden, dropout_rate, rng.gen())?;
            layers.push(NetworkLayer::Dropout(dropout));
            width = hidden;
        }
        let output = DenseLayer::new(width, output_dim, Activation::Linear, init, rng)?;
        layers.push(NetworkLayer::Dense(output));

        Ok(QNetwork { layers })
    }

    pub fn input_dim(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map(|l| l.output_size()).unwrap_or(0)
    }

    /// Action values for a single state, computed in inference mode
    pub fn forward(&mut self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        let output = self.forward_batch(state.insert_axis(Axis(0)), false)?;
        Ok(output.index_axis_move(Axis(0), 0))
    }

    /// Action values for a batch of states, one row per state.
    /// `training` enables dropout and is required before [`QNetwork::backward`].
    pub fn forward_batch(&mut self, states: ArrayView2<f32>, training: bool) -> Result<Array2<f32>> {
        if states.ncols() != self.input_dim() {
            return Err(CaptureError::shape("network input", self.input_dim(), states.ncols()));
        }
        let mut current = states.to_owned();
        for layer in &mut self.layers {
            current = layer.forward_batch(current.view(), training)?;
        }
        Ok(current)
    }

    /// Backpropagate errors on the outputs of the last forward pass.
    /// Returns one gradient entry per dense layer, input side first.
    pub fn backward(&self, output_errors: ArrayView2<f32>) -> Result<Vec<ParamGradients>> {
        if output_errors.ncols() != self.output_dim() {
            return Err(CaptureError::shape("output errors", self.output_dim(), output_errors.ncols()));
        }
        let mut gradients = Vec::new();
        let mut current = output_errors.to_owned();
        for layer in self.layers.iter().rev() {
            let (input_error, grads) = layer.backward_batch(current.view())?;
            if let Some(grads) = grads {
                gradients.push(grads);
            }
            current = input_error;
        }
        gradients.reverse();
        Ok(gradients)
    }

    /// Apply one optimizer step. Dense layer `i` uses optimizer slot `i`.
    pub fn apply_gradients(
        &mut self,
        gradients: &[ParamGradients],
        optimizer: &mut OptimizerWrapper,
        learning_rate: f32,
    ) -> Result<()> {
        let dense_count = self.dense_layers().count();
        if gradients.len() != dense_count {
            return Err(CaptureError::shape("gradient list", dense_count, gradients.len()));
        }

        optimizer.begin_step();
        let dense = self.layers.iter_mut().filter_map(NetworkLayer::as_dense_mut);
        for (slot, (layer, grads)) in dense.zip(gradients).enumerate() {
            optimizer.update_weights(slot, &mut layer.weights, &grads.weights, learning_rate);
            optimizer.update_biases(slot, &mut layer.biases, &grads.biases, learning_rate);
        }
        Ok(())
    }

    /// Overwrite every parameter with the corresponding one from `other`
    pub fn copy_parameters_from(&mut self, other: &QNetwork) -> Result<()> {
        if self.layers.len() != other.layers.len() {
            return Err(CaptureError::shape("network layer count", self.layers.len(), other.layers.len()));
        }
        for (mine, theirs) in self.layers.iter_mut().zip(&other.layers) {
            match (mine, theirs) {
                (NetworkLayer::Dense(a), NetworkLayer::Dense(b)) => a.copy_parameters_from(b)?,
                (NetworkLayer::Dropout(a), NetworkLayer::Dropout(b)) => a.dropout_rate = b.dropout_rate,
                _ => {
                    return Err(CaptureError::Training(
                        "cannot copy parameters between networks with different layer kinds".to_string(),
                    ))
                }
            }
        }
        Ok(())
    }

    /// Exact equality of all weights and biases
    pub fn parameters_equal(&self, other: &QNetwork) -> bool {
        let mine: Vec<&DenseLayer> = self.dense_layers().collect();
        let theirs: Vec<&DenseLayer> = other.dense_layers().collect();
        mine.len() == theirs.len()
            && mine
                .iter()
                .zip(&theirs)
                .all(|(a, b)| a.weights == b.weights && a.biases == b.biases)
    }

    /// Give every dropout layer a fresh mask seed drawn from `rng`
    pub fn reseed_dropout<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for layer in &mut self.layers {
            if let NetworkLayer::Dropout(dropout) = layer {
                dropout.reseed(rng.gen());
            }
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.dense_layers().map(|l| l.weights.len() + l.biases.len()).sum()
    }

    pub fn dense_layers(&self) -> impl Iterator<Item = &DenseLayer> {
        self.layers.iter().filter_map(NetworkLayer::as_dense)
    }

    /// Write the network as a bincode blob
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serialize(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Read a network written by [`QNetwork::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let network: Self = deserialize(&data)
            .map_err(|e| CaptureError::corrupt_checkpoint(path, e.to_string()))?;
        if network.layers.is_empty() {
            return Err(CaptureError::corrupt_checkpoint(path, "network has no layers"));
        }
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_topology() {
        let mut rng = StdRng::seed_from_u64(1);
        let net = QNetwork::new(10, &[8, 4], 5, 0.2, &mut rng).unwrap();
        assert_eq!(net.layers.len(), 5);
        assert_eq!(net.input_dim(), 10);
        assert_eq!(net.output_dim(), 5);
        assert_eq!(net.parameter_count(), 10 * 8 + 8 + 8 * 4 + 4 + 4 * 5 + 5);
    }

    #[test]
    fn test_same_seed_same_network() {
        let a = QNetwork::new(6, &[4], 3, 0.2, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = QNetwork::new(6, &[4], 3, 0.2, &mut StdRng::seed_from_u64(9)).unwrap();
        assert!(a.parameters_equal(&b));
    }

    #[test]
    fn test_inference_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut net = QNetwork::new(4, &[16], 2, 0.5, &mut rng).unwrap();
        let state = ndarray::array![0.1, 0.2, 0.3, 0.4];
        let first = net.forward(state.view()).unwrap();
        let second = net.forward(state.view()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_weight_init_is_applied() {
        let mut rng = StdRng::seed_from_u64(3);
        let net = QNetwork::with_init(4, &[8], 2, 0.0, WeightInit::Zeros, &mut rng).unwrap();
        assert!(net.dense_layers().all(|l| l.weights.iter().all(|&w| w == 0.0)));

        let bad = WeightInit::Uniform { min: 1.0, max: -1.0 };
        assert!(QNetwork::with_init(4, &[8], 2, 0.0, bad, &mut rng).is_err());
    }

    fn dropout_mask(layer: &mut NetworkLayer) -> Array2<f32> {
        let ones = Array2::ones((4, layer.input_size()));
        layer.forward_batch(ones.view(), true).unwrap()
    }

    #[test]
    fn test_reseeded_dropout_layers_draw_distinct_masks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.bin");
        QNetwork::new(4, &[8, 8], 2, 0.5, &mut StdRng::seed_from_u64(1))
            .unwrap()
            .save(&path)
            .unwrap();

        // Freshly loaded layers share one fixed mask stream
        let mut restored = QNetwork::load(&path).unwrap();
        assert_eq!(dropout_mask(&mut restored.layers[1]), dropout_mask(&mut restored.layers[3]));

        let mut a = QNetwork::load(&path).unwrap();
        let mut b = QNetwork::load(&path).unwrap();
        a.reseed_dropout(&mut StdRng::seed_from_u64(10));
        b.reseed_dropout(&mut StdRng::seed_from_u64(11));
        let a_first = dropout_mask(&mut a.layers[1]);
        assert_ne!(a_first, dropout_mask(&mut a.layers[3]));
        assert_ne!(a_first, dropout_mask(&mut b.layers[1]));
    }

    #[test]
    fn test_wrong_input_width() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut net = QNetwork::new(4, &[8], 2, 0.0, &mut rng).unwrap();
        let err = net.forward(ndarray::array![1.0, 2.0].view()).unwrap_err();
        assert!(matches!(err, CaptureError::Shape { expected: 4, actual: 2, .. }));
    }
}
