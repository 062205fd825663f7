//! Environment and local-executor contracts.
//!
//! Both are external collaborators from the dispatcher's point of view:
//! the dispatcher never looks inside an environment, and a worker treats
//! its executor as an opaque `reset`/`step` pair over a fixed number of
//! environments.

use crate::error::EnvError;
use crate::space::{ActionSpace, ObsSpace};
use crate::value::{Action, BatchResult, Observation, Transition};

/// A single simulation instance.
///
/// Environments are constructed inside the worker thread that owns
/// them, so they do not need to be `Send`.
pub trait Env {
    /// Observation space. Must be identical across every instance a
    /// factory produces.
    fn observation_space(&self) -> ObsSpace;

    /// Action space.
    fn action_space(&self) -> ActionSpace;

    /// Start a fresh episode and return its first observation.
    fn reset(&mut self) -> Result<Observation, EnvError>;

    /// Advance one step.
    fn step(&mut self, action: &Action) -> Result<Transition, EnvError>;
}

/// Runs a fixed set of environments inside one worker.
///
/// `reset` and `step` return one entry per environment in local-slot
/// order. An executor is expected to auto-reset any environment whose
/// step reports `done`.
pub trait LocalExecutor {
    /// Number of environments owned.
    fn num_envs(&self) -> usize;

    /// Reset every environment.
    fn reset(&mut self) -> Result<BatchResult, EnvError>;

    /// Step every environment with the action at the same local slot.
    fn step(&mut self, actions: &[Action]) -> Result<BatchResult, EnvError>;
}
