use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::activations::Activation;
use crate::layers::{DenseLayer, DropoutLayer, LayerTrait, NetworkLayer, WeightInit};

#[test]
fn test_dense_layer_forward() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut layer = DenseLayer::new(3, 2, Activation::Relu, WeightInit::XavierUniform, &mut rng).unwrap();
    let output = layer.forward_batch(array![[1.0, 2.0, 3.0]].view(), false).unwrap();
    assert_eq!(output.shape(), [1, 2]);
    assert!(output.iter().all(|&v| v >= 0.0));
}

#[test]
fn test_dense_layer_known_weights() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut layer = DenseLayer::new(2, 2, Activation::Linear, WeightInit::Zeros, &mut rng).unwrap();
    layer.weights = array![[1.0, -1.0], [2.0, 0.5]];
    layer.biases = array![0.5, 0.0];
    let output = layer.forward_batch(array![[1.0, 1.0]].view(), true).unwrap();
    assert_eq!(output, array![[3.5, -0.5]]);

    let (input_error, grads) = layer.backward_batch(array![[1.0, 0.0]].view()).unwrap();
    assert_eq!(input_error, array![[1.0, 2.0]]);
    let grads = grads.unwrap();
    assert_eq!(grads.weights, array![[1.0, 0.0], [1.0, 0.0]]);
    assert_eq!(grads.biases, array![1.0, 0.0]);
}

#[test]
fn test_dense_rejects_wrong_shapes() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut layer = DenseLayer::new(2, 2, Activation::Linear, WeightInit::Zeros, &mut rng).unwrap();
    assert!(layer.forward_batch(array![[1.0, 2.0, 3.0]].view(), false).is_err());

    let wider = DenseLayer::new(3, 2, Activation::Linear, WeightInit::Zeros, &mut rng).unwrap();
    assert!(layer.copy_parameters_from(&wider).is_err());
    assert_eq!(layer.weights, Array2::<f32>::zeros((2, 2)));
}

#[test]
fn test_dropout_inference_is_identity() {
    let mut layer = DropoutLayer::new(4, 0.5, 1).unwrap();
    let input = array![[1.0, 2.0, 3.0, 4.0]];
    let output = layer.forward_batch(input.view(), false).unwrap();
    assert_eq!(output, input);
}

#[test]
fn test_dropout_training_scales_survivors() {
    let mut layer = DropoutLayer::new(1000, 0.2, 5).unwrap();
    let input = Array2::ones((1, 1000));
    let output = layer.forward_batch(input.view(), true).unwrap();

    let scale = 1.0 / 0.8;
    assert!(output.iter().all(|&v| v == 0.0 || (v - scale).abs() < 1e-6));
    let dropped = output.iter().filter(|&&v| v == 0.0).count();
    assert!(dropped > 100 && dropped < 300, "dropped {}", dropped);

    // Gradients flow only through kept units
    let (grad, params) = layer.backward_batch(input.view()).unwrap();
    assert!(params.is_none());
    assert_eq!(grad, output);
}

#[test]
fn test_dropout_masks_are_seeded() {
    let input = Array2::ones((2, 16));
    let a = DropoutLayer::new(16, 0.5, 9).unwrap().forward_batch(input.view(), true).unwrap();
    let b = DropoutLayer::new(16, 0.5, 9).unwrap().forward_batch(input.view(), true).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_dropout_rate_validation() {
    assert!(DropoutLayer::new(4, 1.0, 0).is_err());
    assert!(DropoutLayer::new(4, -0.1, 0).is_err());
    assert!(DropoutLayer::new(4, 0.0, 0).is_ok());
}

#[test]
fn test_network_layer_dispatch() {
    let mut rng = StdRng::seed_from_u64(0);
    let dense = DenseLayer::new(3, 5, Activation::Relu, WeightInit::HeNormal, &mut rng).unwrap();
    let layer = NetworkLayer::Dense(dense);
    assert_eq!(layer.input_size(), 3);
    assert_eq!(layer.output_size(), 5);
    assert!(layer.as_dense().is_some());

    let dropout = NetworkLayer::Dropout(DropoutLayer::new(5, 0.1, 0).unwrap());
    assert_eq!(dropout.input_size(), 5);
    assert!(dropout.as_dense().is_none());
}

#[test]
fn test_serialized_layer_round_trip() {
    let mut rng = StdRng::seed_from_u64(3);
    let layer = NetworkLayer::Dense(
        DenseLayer::new(3, 2, Activation::Linear, WeightInit::XavierUniform, &mut rng).unwrap(),
    );
    let bytes = bincode::serialize(&layer).unwrap();
    let restored: NetworkLayer = bincode::deserialize(&bytes).unwrap();
    assert_eq!(restored.as_dense().unwrap().weights, layer.as_dense().unwrap().weights);
}
