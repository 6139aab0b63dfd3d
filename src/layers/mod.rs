//! # Layers
//!
//! Building blocks of the value network. [`NetworkLayer`] wraps the concrete
//! layer types so a network can hold them in one serializable `Vec`.

pub mod traits;
pub mod dense;
pub mod dropout;
pub mod initialization;

use ndarray::{Array2, ArrayView2};
use serde::{Serialize, Deserialize};

use crate::error::Result;

pub use traits::{Layer as LayerTrait, ParamGradients};
pub use dense::DenseLayer;
pub use dropout::DropoutLayer;
pub use initialization::WeightInit;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum NetworkLayer {
    Dense(DenseLayer),
    Dropout(DropoutLayer),
}

impl NetworkLayer {
    pub fn as_dense(&self) -> Option<&DenseLayer> {
        match self {
            NetworkLayer::Dense(layer) => Some(layer),
            NetworkLayer::Dropout(_) => None,
        }
    }

    pub fn as_dense_mut(&mut self) -> Option<&mut DenseLayer> {
        match self {
            NetworkLayer::Dense(layer) => Some(layer),
            NetworkLayer::Dropout(_) => None,
        }
    }
}

impl LayerTrait for NetworkLayer {
    fn forward_batch(&mut self, inputs: ArrayView2<f32>, training: bool) -> Result<Array2<f32>> {
        match self {
            NetworkLayer::Dense(layer) => layer.forward_batch(inputs, training),
            NetworkLayer::Dropout(layer) => layer.forward_batch(inputs, training),
        }
    }

    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<(Array2<f32>, Option<ParamGradients>)> {
        match self {
            NetworkLayer::Dense(layer) => layer.backward_batch(output_errors),
            NetworkLayer::Dropout(layer) => layer.backward_batch(output_errors),
        }
    }

    fn input_size(&self) -> usize {
        match self {
            NetworkLayer::Dense(layer) => layer.input_size(),
            NetworkLayer::Dropout(layer) => layer.input_size(),
        }
    }

    fn output_size(&self) -> usize {
        match self {
            NetworkLayer::Dense(layer) => layer.output_size(),
            NetworkLayer::Dropout(layer) => layer.output_size(),
        }
    }
}
