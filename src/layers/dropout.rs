use ndarray::{Array2, ArrayView2};
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Uniform;
use serde::{Serialize, Deserialize};

use crate::error::{CaptureError, Result};
use super::traits::{Layer as LayerTrait, ParamGradients};

fn restored_rng() -> StdRng {
    StdRng::seed_from_u64(0)
}

/// Dropout Layer
///
/// Randomly zeroes input units with probability `dropout_rate` during
/// training-mode passes and rescales the survivors by `1 / (1 - rate)`.
/// Inference passes are the identity.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DropoutLayer {
    /// Dropout probability (probability of dropping a unit)
    pub dropout_rate: f32,

    /// Size of the layer
    size: usize,

    /// Mask from the last training pass, `None` after an inference pass
    #[serde(skip)]
    cached_mask: Option<Array2<f32>>,

    #[serde(skip, default = "restored_rng")]
    rng: StdRng,
}

impl DropoutLayer {
    /// Create a new dropout layer whose masks are drawn from a generator seeded with `seed`
    pub fn new(size: usize, dropout_rate: f32, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&dropout_rate) {
            return Err(CaptureError::invalid_parameter(
                "dropout_rate",
                format!("must be in [0, 1), got {}", dropout_rate),
            ));
        }

        Ok(DropoutLayer {
            dropout_rate,
            size,
            cached_mask: None,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Restart the mask stream. Deserialized layers all start from the same
    /// fixed seed and must be reseeded before training-mode passes.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.cached_mask = None;
    }
}

impl LayerTrait for DropoutLayer {
    fn forward_batch(&mut self, inputs: ArrayView2<f32>, training: bool) -> Result<Array2<f32>> {
        if inputs.ncols() != self.size {
            return Err(CaptureError::shape("dropout layer input", self.size, inputs.ncols()));
        }

        if !training || self.dropout_rate == 0.0 {
            self.cached_mask = None;
            return Ok(inputs.to_owned());
        }

        let rate = self.dropout_rate;
        let scale = 1.0 / (1.0 - rate);
        let mask = Array2::random_using(inputs.raw_dim(), Uniform::new(0.0f32, 1.0), &mut self.rng)
            .mapv(|u| if u >= rate { scale } else { 0.0 });

        let outputs = &inputs * &mask;
        self.cached_mask = Some(mask);
        Ok(outputs)
    }

    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<(Array2<f32>, Option<ParamGradients>)> {
        // Dropout has no learnable parameters
        let input_error = match &self.cached_mask {
            Some(mask) => &output_errors * mask,
            None => output_errors.to_owned(),
        };
        Ok((input_error, None))
    }

    fn input_size(&self) -> usize {
        self.size
    }

    fn output_size(&self) -> usize {
        self.size
    }
}
