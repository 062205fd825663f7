//! Random-action rollout over a 4x2 worker pool.
//!
//! Demonstrates: build dispatcher → reset → lockstep steps with sampled
//! actions → one asynchronous send_actions/poll round → stop.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use vecray_bench::{random_dispatcher, sample_actions};

fn main() {
    println!("=== vecray random rollout ===\n");

    let mut vec = random_dispatcher(4, 2).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    println!("observation space: {:?}", vec.observation_space());
    println!("action space:      {:?}", vec.action_space());

    let batch = vec.reset().unwrap();
    println!("reset: {} envs\n", batch.len());

    let mut episodes = 0usize;
    let mut total_reward = 0.0f32;
    for step in 0..50 {
        let actions = sample_actions(vec.action_space(), vec.num_envs(), &mut rng).unwrap();
        let batch = vec.step(&actions).unwrap();
        total_reward += batch.rewards.iter().sum::<f32>();
        episodes += batch.dones.iter().filter(|d| **d).count();
        if step % 10 == 0 {
            println!("step {step:>3}: rewards {:?}", batch.rewards);
        }
    }

    // Asynchronous round: act on whichever workers reply first.
    let actions = sample_actions(vec.action_space(), vec.num_envs(), &mut rng).unwrap();
    vec.send_actions(&actions).unwrap();
    vec.poll().unwrap();
    println!(
        "\nasync poll: workers {:?} replied first, {} still in flight",
        vec.last_poll_metrics().resolved,
        vec.pending_count()
    );

    let report = vec.stop();
    let totals = vec.totals();
    println!("\nresolutions:      {}", totals.resolutions);
    println!("episodes ended:   {episodes}");
    println!("reward collected: {total_reward:.2}");
    println!(
        "shutdown: {} joined, {} detached in {}ms",
        report.workers_joined, report.workers_detached, report.total_ms
    );
}
