//! Integration test: reset / send_actions / poll cycles over real worker
//! threads.
//!
//! Covers the reset batch returned by the first poll, stable mapping of
//! batch index to environment across cycles, and random actions sampled
//! from the declared action space.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use vecray_core::{Action, EnvId, FieldBuffer};
use vecray_engine::{Batch, DispatcherConfig, VectorDispatcher};
use vecray_test_utils::{counter_factory, ramp_actions, CounterEnv, RandomEnv};

fn counters(nw: usize, epw: usize) -> VectorDispatcher<CounterEnv> {
    VectorDispatcher::new(counter_factory(1000), DispatcherConfig::new(nw, epw)).unwrap()
}

fn obs_row(batch: &Batch, row: usize) -> Vec<f32> {
    match batch.observation("obs").unwrap().row(row) {
        FieldBuffer::F32(v) => v,
        other => panic!("unexpected dtype {other:?}"),
    }
}

// ── Reset batch ──────────────────────────────────────────────────

#[test]
fn first_poll_returns_full_reset_batch() {
    let mut d = counters(4, 2);
    let batch = d.poll().unwrap();
    assert_eq!(batch.len(), 8);
    assert_eq!(batch.rewards, vec![0.0; 8]);
    assert_eq!(batch.dones, vec![false; 8]);
    assert_eq!(batch.infos.len(), 8);
    assert!(batch.infos.iter().all(|i| i.is_empty()));
    assert_eq!(batch.observation("obs").unwrap().shape(), &[8, 2]);
    assert!(!d.last_poll_metrics().resolved.is_empty());
}

#[test]
fn step_updates_only_responding_workers() {
    let mut d = counters(4, 2);
    d.reset().unwrap();
    let actions = ramp_actions(d.layout(), 1);
    d.send_actions(&actions).unwrap();

    let mut batch = d.poll().unwrap();
    let resolved = d.last_poll_metrics().resolved.clone();
    assert!(!resolved.is_empty());
    for w in d.layout().workers() {
        for i in d.layout().slot_range(w) {
            let expected = if resolved.contains(&w) {
                (i + 1) as f32
            } else {
                0.0
            };
            assert_eq!(batch.rewards[i], expected, "slot {i} of worker {w}");
        }
    }

    while d.pending_count() > 0 {
        batch = d.poll().unwrap();
    }
    let expected: Vec<f32> = (1..=8).map(|a| a as f32).collect();
    assert_eq!(batch.rewards, expected);
    assert_eq!(d.totals().steps_issued, 4);
}

// ── Addressing ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn batch_index_always_maps_to_same_env(
        nw in 1usize..5,
        epw in 1usize..4,
        cycles in 1usize..4,
    ) {
        let mut d = counters(nw, epw);
        let mut batch = d.reset().unwrap();
        for cycle in 0..cycles {
            for row in 0..d.num_envs() {
                let (w, slot) = d.layout().locate(EnvId(row)).unwrap();
                prop_assert_eq!(d.layout().env_id(w, slot), Some(EnvId(row)));
                prop_assert_eq!(obs_row(&batch, row)[0], row as f32);
            }
            batch = d.step(&ramp_actions(d.layout(), cycle as i64)).unwrap();
            for row in 0..d.num_envs() {
                prop_assert_eq!(obs_row(&batch, row)[1], (cycle + 1) as f32);
            }
        }
    }
}

// ── Sampled actions ──────────────────────────────────────────────

#[test]
fn sampled_actions_drive_random_envs() {
    let mut d = VectorDispatcher::new(
        |id| Ok(RandomEnv::new(id, 0.2)),
        DispatcherConfig::new(4, 2),
    )
    .unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    d.reset().unwrap();
    for _ in 0..10 {
        let actions: Vec<Action> = (0..d.num_envs())
            .map(|_| d.action_space().sample(&mut rng).unwrap())
            .collect();
        assert!(actions.iter().all(|a| d.action_space().contains(a)));
        let batch = d.step(&actions).unwrap();
        assert!(batch.rewards.iter().all(|r| (0.0..1.0).contains(r)));
    }
    assert_eq!(d.totals().steps_issued, 40);
    let report = d.stop();
    assert_eq!(report.workers_signalled, 4);
}
