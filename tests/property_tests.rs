#[cfg(test)]
mod property_tests {
    use capture_rl::agent::DqnAgentBuilder;
    use capture_rl::encoder::{compute_feature_dim, StateEncoder};
    use capture_rl::observation::{CriticalPoint, Observation};
    use capture_rl::replay_buffer::{ReplayBuffer, Transition};
    use capture_rl::reward::{AgentSnapshot, RewardShaper, RewardConfig};
    use ndarray::Array1;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{BTreeMap, HashSet};

    fn coordinate() -> impl Strategy<Value = f32> {
        -50.0f32..50.0
    }

    fn position() -> impl Strategy<Value = [f32; 3]> {
        (coordinate(), coordinate(), coordinate()).prop_map(|(x, y, z)| [x, y, z])
    }

    fn point() -> impl Strategy<Value = CriticalPoint> {
        (position(), prop::option::of(0u32..6), any::<bool>())
            .prop_map(|(position, color, available)| CriticalPoint { position, color, available })
    }

    fn observation(grid_size: usize) -> impl Strategy<Value = Observation> {
        (
            position(),
            prop::collection::vec(point(), 0..30),
            prop::collection::vec(0u32..20, 3),
            0.0f32..=1.0,
            prop::collection::vec(0u8..=1, grid_size * grid_size),
        )
            .prop_map(|(agent_position, critical_points, owned, time_remaining, navigation_grid)| {
                let agent_owned_points: BTreeMap<String, u32> =
                    owned.iter().enumerate().map(|(id, &n)| (id.to_string(), n)).collect();
                Observation {
                    agent_position,
                    critical_points,
                    agent_owned_points,
                    time_remaining,
                    navigation_grid,
                    nearest_unclaimed_distance: 1.0,
                    nearest_enemy_distance: 1.0,
                    map_size: 10.0,
                }
            })
    }

    proptest! {
        #[test]
        fn test_encoded_length_is_fixed(
            max_points in 0usize..20,
            (grid_size, obs) in (0usize..8).prop_flat_map(|g| (Just(g), observation(g))),
        ) {
            let encoder = StateEncoder::with_dims(max_points, grid_size);
            let state = encoder.encode(&obs).unwrap();
            prop_assert_eq!(state.len(), compute_feature_dim(max_points, grid_size));
            prop_assert!(state.iter().all(|v| v.is_finite()));
        }

        #[test]
        fn test_reward_stays_clipped(
            obs in observation(2),
            previous_owned in 0u32..1000,
            previous_position in position(),
            agent_id in 0usize..3,
            first_step in any::<bool>(),
        ) {
            let shaper = RewardShaper::new(RewardConfig::default());
            let snapshot = AgentSnapshot { owned_points: previous_owned, position: previous_position };
            let previous = if first_step { None } else { Some(&snapshot) };
            let reward = shaper.reward(previous, &obs, agent_id);
            prop_assert!(reward.is_finite());
            prop_assert!((-5.0..=5.0).contains(&reward));
        }

        #[test]
        fn test_sampled_indices_are_distinct(len in 1usize..200, k in 0usize..64, seed in any::<u64>()) {
            let mut buffer = ReplayBuffer::new(500);
            for i in 0..len {
                buffer.push(Transition {
                    state: Array1::from_elem(2, i as f32),
                    action: i % 4,
                    reward: 0.0,
                    next_state: Array1::zeros(2),
                    done: false,
                });
            }
            let mut rng = StdRng::seed_from_u64(seed);
            match buffer.sample_indices(k, &mut rng) {
                Ok(indices) => {
                    prop_assert!(k <= len);
                    prop_assert_eq!(indices.len(), k);
                    let unique: HashSet<usize> = indices.iter().copied().collect();
                    prop_assert_eq!(unique.len(), k);
                    prop_assert!(indices.iter().all(|&i| i < len));
                }
                Err(_) => prop_assert!(k > len),
            }
        }

        #[test]
        fn test_epsilon_never_drops_below_floor(steps in 1usize..40, decay in 0.1f32..0.999) {
            let mut agent = DqnAgentBuilder::new()
                .state_dim(3)
                .action_dim(4)
                .hidden_dims(&[4])
                .batch_size(2)
                .epsilon(1.0, 0.3, decay)
                .seed(11)
                .build()
                .unwrap();
            for i in 0..4 {
                agent.remember(Transition {
                    state: Array1::from_elem(3, i as f32 * 0.1),
                    action: i % 4,
                    reward: 1.0,
                    next_state: Array1::zeros(3),
                    done: i == 3,
                }).unwrap();
            }
            for _ in 0..steps {
                agent.train_step().unwrap();
                prop_assert!(agent.epsilon() >= 0.3);
                prop_assert!(agent.epsilon() <= 1.0);
            }
        }
    }
}
