//! vecray: asynchronous vectorized environment execution.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the vecray sub-crates. For most users, adding `vecray` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use vecray::prelude::*;
//!
//! // Reward equals the action; episodes never end.
//! struct Echo(EnvId);
//! impl Env for Echo {
//!     fn observation_space(&self) -> ObsSpace { ObsSpace::single(&[1], Dtype::I64) }
//!     fn action_space(&self) -> ActionSpace { ActionSpace::Discrete { n: 16 } }
//!     fn reset(&mut self) -> Result<Observation, EnvError> {
//!         Ok(Observation::single(FieldBuffer::I64(vec![self.0 .0 as i64])))
//!     }
//!     fn step(&mut self, action: &Action) -> Result<Transition, EnvError> {
//!         let Action::Discrete(a) = action else {
//!             return Err(EnvError::failed("discrete only"));
//!         };
//!         Ok(Transition {
//!             obs: self.reset()?,
//!             reward: *a as f32,
//!             done: false,
//!             info: Info::new(),
//!         })
//!     }
//! }
//!
//! // 4 workers x 2 environments, each worker on its own thread.
//! let mut vec = VectorDispatcher::new(|id| Ok(Echo(id)), DispatcherConfig::new(4, 2)).unwrap();
//! let batch = vec.reset().unwrap();
//! assert_eq!(batch.len(), 8);
//! assert!(batch.dones.iter().all(|d| !d));
//!
//! // Lockstep: every worker has replied.
//! let actions: Vec<Action> = (0..8).map(Action::Discrete).collect();
//! let batch = vec.step(&actions).unwrap();
//! assert_eq!(batch.rewards[7], 7.0);
//!
//! // Asynchronous: only the workers that replied first are fresh.
//! vec.send_actions(&actions).unwrap();
//! let batch = vec.poll().unwrap();
//! for w in &vec.last_poll_metrics().resolved {
//!     let range = vec.layout().slot_range(*w);
//!     assert_eq!(batch.rewards[range.start], range.start as f32);
//! }
//! vec.stop();
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `vecray-core` | IDs, layout, spaces, values, `Env` and `LocalExecutor` traits |
//! | [`engine`] | `vecray-engine` | Worker actors, result buffer, the vector dispatcher |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`vecray-core`).
///
/// Contains the batch [`types::Layout`], observation and action spaces,
/// per-environment values, and the [`types::Env`] trait implemented by
/// user environments.
pub use vecray_core as types;

/// Worker actors and the vector dispatcher (`vecray-engine`).
///
/// [`engine::VectorDispatcher`] is the entry point;
/// [`engine::DispatcherConfig`] configures it.
pub use vecray_engine as engine;

/// Common imports for typical vecray usage.
///
/// ```rust
/// use vecray::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use vecray_core::{
        Action, ActionSpace, Dtype, Env, EnvId, FieldBuffer, FieldSpec, Info, InfoValue, Layout,
        ObsSpace, Observation, Transition, WorkerIndex,
    };

    // Errors
    pub use vecray_core::EnvError;
    pub use vecray_engine::{ConfigError, DispatchError};

    // Engine
    pub use vecray_engine::{
        Batch, DispatcherConfig, PendingReset, PollMetrics, ResultShaping, ShutdownReport,
        VectorDispatcher, WorkerState,
    };
}
