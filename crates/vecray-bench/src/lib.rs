//! Benchmark profiles and utilities for the vecray framework.
//!
//! - [`rollout_config`]: dispatcher layout used by the benchmarks and demos
//! - [`random_dispatcher`]: a dispatcher over seeded [`RandomEnv`]s
//! - [`sample_actions`]: one sampled action per environment
//! - [`run_cycles`]: drive lockstep steps and total the rewards

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::Rng;

use vecray_core::{Action, ActionSpace, Env};
use vecray_engine::{ConfigError, DispatchError, DispatcherConfig, VectorDispatcher};
use vecray_test_utils::RandomEnv;

/// Probability that a [`RandomEnv`] episode ends on any given step.
pub const DONE_PROB: f64 = 0.05;

/// Dispatcher config for `num_workers` workers of `env_per_worker` envs.
pub fn rollout_config(num_workers: usize, env_per_worker: usize) -> DispatcherConfig {
    DispatcherConfig::new(num_workers, env_per_worker)
}

/// A dispatcher over [`RandomEnv`]s seeded by their env id.
pub fn random_dispatcher(
    num_workers: usize,
    env_per_worker: usize,
) -> Result<VectorDispatcher<RandomEnv>, DispatchError> {
    VectorDispatcher::new(
        |id| Ok(RandomEnv::new(id, DONE_PROB)),
        rollout_config(num_workers, env_per_worker),
    )
}

/// `n` actions sampled uniformly from `space`. `None` if the space has no
/// members.
pub fn sample_actions<R: Rng + ?Sized>(
    space: &ActionSpace,
    n: usize,
    rng: &mut R,
) -> Option<Vec<Action>> {
    (0..n).map(|_| space.sample(rng)).collect()
}

/// Run `cycles` lockstep steps with sampled actions. Returns the summed
/// reward over every environment and step.
///
/// The dispatcher must have been reset first.
pub fn run_cycles<E: Env + 'static, R: Rng + ?Sized>(
    vec: &mut VectorDispatcher<E>,
    cycles: usize,
    rng: &mut R,
) -> Result<f32, DispatchError> {
    let mut total = 0.0;
    for _ in 0..cycles {
        let actions = sample_actions(vec.action_space(), vec.num_envs(), rng)
            .ok_or(DispatchError::Config(ConfigError::InvalidActionSpace))?;
        let batch = vec.step(&actions)?;
        total += batch.rewards.iter().sum::<f32>();
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn cycles_drain_every_worker() {
        let mut vec = random_dispatcher(2, 2).unwrap();
        vec.reset().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let reward = run_cycles(&mut vec, 3, &mut rng).unwrap();
        assert!((0.0..12.0).contains(&reward));
        assert_eq!(vec.totals().steps_issued, 6);
        assert_eq!(vec.pending_count(), 0);
    }
}
