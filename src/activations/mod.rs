//! # Activation Functions Module
//!
//! The value network only needs two nonlinearities:
//!
//! - **ReLU**: `max(0, x)` on every hidden layer
//! - **Linear**: identity on the output layer, so Q-values are unbounded
//!
//! ```rust
//! use capture_rl::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.0, -0.5, 0.0, 2.0]];
//! Activation::Relu.apply_batch(&mut data);
//! assert_eq!(data, array![[1.0, 0.0, 0.0, 2.0]]);
//! ```

pub mod functions;

pub use functions::Activation;
