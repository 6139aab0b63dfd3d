//! Throughput of the pieces that run every environment tick:
//! state encoding, action selection and one DQN training step
//! at the default 581-feature state size.

use capture_rl::agent::{AgentConfig, DqnAgent};
use capture_rl::encoder::StateEncoder;
use capture_rl::environment::{ArenaConfig, EnvironmentAdapter, SimulatedArena};
use capture_rl::replay_buffer::Transition;
use ndarray::Array1;
use std::time::Instant;

fn time<F: FnMut()>(name: &str, iterations: usize, mut f: F) {
    let start = Instant::now();
    for _ in 0..iterations {
        f();
    }
    let elapsed = start.elapsed();
    println!(
        "{:<20} {:>8} iters  {:>10.3} ms total  {:>10.1} us/iter",
        name,
        iterations,
        elapsed.as_secs_f64() * 1e3,
        elapsed.as_secs_f64() * 1e6 / iterations as f64
    );
}

fn main() {
    println!("capture_rl benchmark\n");

    let encoder = StateEncoder::default();
    let mut arena = SimulatedArena::new(ArenaConfig::default()).expect("arena");
    let observation = arena.reset().expect("reset");

    time("encode", 10_000, || {
        let _ = encoder.encode(&observation).expect("encode");
    });

    let state_dim = encoder.feature_dim();
    let mut agent = DqnAgent::new(state_dim, 5, AgentConfig::default()).expect("agent");
    let state = encoder.encode(&observation).expect("encode");

    time("select_action", 1_000, || {
        let _ = agent.select_action(state.view(), false).expect("select");
    });

    for i in 0..2_000 {
        let reward = if i % 50 == 0 { 1.0 } else { -0.01 };
        agent
            .remember(Transition {
                state: state.clone(),
                action: i % 5,
                reward,
                next_state: Array1::from_elem(state_dim, 0.1),
                done: i % 1000 == 999,
            })
            .expect("remember");
    }

    time("train_step", 100, || {
        let _ = agent.train_step().expect("train");
    });

    time("arena_step", 10_000, || {
        let _ = arena
            .step(capture_rl::action::Action::MoveForward, 0)
            .expect("step");
    });
}
