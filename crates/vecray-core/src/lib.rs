//! Core types and traits for the vecray vectorized-execution framework.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! vocabulary shared by the dispatcher and by environment authors:
//! identifiers, batch addressing, space descriptors, per-environment
//! values, the [`Env`] and [`LocalExecutor`] traits, and [`EnvError`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod layout;
pub mod space;
pub mod traits;
pub mod value;

pub use error::EnvError;
pub use id::{CallId, EnvId, WorkerIndex};
pub use layout::Layout;
pub use space::{ActionSpace, Dtype, FieldSpec, ObsSpace, Shape, DEFAULT_OBS_KEY};
pub use traits::{Env, LocalExecutor};
pub use value::{Action, BatchResult, FieldBuffer, Info, InfoValue, Observation, Transition};
