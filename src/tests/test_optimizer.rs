use ndarray::array;
use crate::layers::ParamGradients;
use crate::optimizer::{Adam, GradientClipper, Optimizer, OptimizerWrapper, SGD};

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_sgd_update_weights() {
    let mut sgd = SGD::new();
    let mut weights = array![[1.0, 1.0], [1.0, 1.0]];
    let gradients = array![[0.1, 0.2], [0.3, 0.4]];

    sgd.update_weights(0, &mut weights, &gradients, 0.01);

    let expected = array![[0.999, 0.998], [0.997, 0.996]];
    assert!(weights.iter().zip(expected.iter()).all(|(&w, &e)| close(w, e)));
}

#[test]
fn test_adam_first_step_moves_by_learning_rate() {
    // With bias correction the first Adam step is lr * sign(g)
    let mut adam = Adam::default();
    let mut biases = array![1.0, 1.0, 1.0];
    let gradients = array![0.5, -2.0, 0.0];

    adam.begin_step();
    adam.update_biases(0, &mut biases, &gradients, 0.1);

    assert!(close(biases[0], 0.9));
    assert!(close(biases[1], 1.1));
    assert!(close(biases[2], 1.0));
    assert_eq!(adam.t, 1);
}

#[test]
fn test_adam_slots_are_independent() {
    let mut adam = OptimizerWrapper::Adam(Adam::default());
    let mut a = array![[0.0]];
    let mut b = array![[0.0]];

    adam.begin_step();
    adam.update_weights(0, &mut a, &array![[1.0]], 0.01);
    adam.update_weights(1, &mut b, &array![[-1.0]], 0.01);
    adam.begin_step();
    adam.update_weights(0, &mut a, &array![[1.0]], 0.01);
    adam.update_weights(1, &mut b, &array![[-1.0]], 0.01);

    assert!(close(a[[0, 0]], -0.02));
    assert!(close(b[[0, 0]], 0.02));
}

fn gradients() -> Vec<ParamGradients> {
    vec![
        ParamGradients { weights: array![[3.0, 4.0]], biases: array![0.5] },
        ParamGradients { weights: array![[0.1, 0.1]], biases: array![0.0] },
    ]
}

#[test]
fn test_clip_by_norm_is_per_tensor() {
    let mut grads = gradients();
    let norm_before = GradientClipper::ClipByNorm { max_norm: 1.0 }.clip(&mut grads);
    assert!(close(norm_before, (25.0f32 + 0.25 + 0.02).sqrt()));

    // 3-4-5 triangle rescaled to unit length
    assert!(close(grads[0].weights[[0, 0]], 0.6));
    assert!(close(grads[0].weights[[0, 1]], 0.8));
    // Small tensors are untouched
    assert_eq!(grads[0].biases, array![0.5]);
    assert_eq!(grads[1].weights, array![[0.1, 0.1]]);
}

#[test]
fn test_clip_by_global_norm() {
    let mut grads = gradients();
    let norm = GradientClipper::ClipByGlobalNorm { max_norm: 1.0 }.clip(&mut grads);
    assert!(close(GradientClipper::compute_global_norm(&grads), 1.0));
    assert!(close(grads[1].weights[[0, 0]], 0.1 / norm));
}

#[test]
fn test_clip_by_value_and_none() {
    let mut grads = gradients();
    GradientClipper::ClipByValue { min: -1.0, max: 1.0 }.clip(&mut grads);
    assert_eq!(grads[0].weights, array![[1.0, 1.0]]);

    let mut grads = gradients();
    GradientClipper::None.clip(&mut grads);
    assert_eq!(grads[0].weights, array![[3.0, 4.0]]);
}
