//! Test utilities and mock environments for vecray development.
//!
//! Provides deterministic [`Env`](vecray_core::Env) implementations in
//! [`fixtures`] and factory helpers for building dispatchers over them.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    counter_factory, failing_factory, gated_factory, CounterEnv, FailMode, FailingEnv, Gate,
    GatedEnv, RandomEnv, TwoAgentEnv,
};

use vecray_core::{Action, Layout};

/// Discrete actions `[base, base+1, ...]`, one per environment in `layout`.
pub fn ramp_actions(layout: Layout, base: i64) -> Vec<Action> {
    (0..layout.total_envs())
        .map(|i| Action::Discrete(base + i as i64))
        .collect()
}
