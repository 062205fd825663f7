//! Worker actors and the asynchronous vector dispatcher.
//!
//! Provides the [`VectorDispatcher`] that owns a pool of worker threads,
//! each stepping a fixed group of environments, and merges whichever
//! workers have replied into one full-width [`Batch`] per poll.
//!
//! The worker actors, call handles and pending-call table are internal to
//! the dispatcher:
//!
//! ```compile_fail
//! use vecray_engine::PendingCallTable;
//! ```
//!
//! ```compile_fail
//! use vecray_engine::worker::WorkerActor;
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod metrics;
mod pending;
mod runtime;
mod worker;

pub use buffer::{Batch, ObsArray, ResultBuffer};
pub use config::{ConfigError, DispatcherConfig, ResultShaping};
pub use dispatcher::{PendingReset, ShutdownReport, VectorDispatcher, WorkerState};
pub use error::{DispatchError, FailedCalls};
pub use executor::SequentialExecutor;
pub use metrics::{DispatchTotals, PollMetrics};
