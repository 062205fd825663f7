//! Error type for dispatcher operations.

use std::error::Error;
use std::fmt;

use smallvec::SmallVec;

use vecray_core::{EnvError, WorkerIndex};

use crate::config::ConfigError;

/// Failed calls from one wait pass, in resolution order.
pub type FailedCalls = SmallVec<[(WorkerIndex, EnvError); 4]>;

/// Error from a dispatcher operation, annotated with the worker index
/// where one applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchError {
    /// Configuration was rejected.
    Config(ConfigError),
    /// The factory failed while building a worker's environments.
    /// Aborts dispatcher construction or lazy worker start-up.
    ConstructionFailure {
        /// Worker whose environments failed to build. `None` for the
        /// probe environment built at dispatcher construction.
        worker: Option<WorkerIndex>,
        /// The underlying failure.
        error: EnvError,
    },
    /// A remote `reset`/`step` call failed. The worker's buffer slice
    /// was left untouched.
    WorkerFailure {
        /// Worker whose call failed.
        worker: WorkerIndex,
        /// The underlying failure.
        error: EnvError,
    },
    /// Several remote calls failed in the same wait pass. Each failed
    /// worker's buffer slice was left untouched.
    WorkerFailures {
        /// Every failed call, in resolution order. Always two or more.
        failures: FailedCalls,
    },
    /// A call would break the single-outstanding-call invariant, or its
    /// arguments do not fit the batch. Nothing was dispatched.
    InvariantViolation {
        /// Human-readable description of what's wrong.
        reason: String,
    },
    /// Worker index out of bounds.
    InvalidWorker {
        /// The requested index.
        worker: WorkerIndex,
        /// Total number of workers.
        num_workers: usize,
    },
    /// Workers are started by the first `poll()`; this operation needs them.
    NotStarted,
    /// `stop()` has been called; no further operations are valid.
    Stopped,
    /// A worker thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config error: {e}"),
            Self::ConstructionFailure {
                worker: Some(w),
                error,
            } => write!(f, "worker {w}: construction failed: {error}"),
            Self::ConstructionFailure {
                worker: None,
                error,
            } => write!(f, "probe environment construction failed: {error}"),
            Self::WorkerFailure { worker, error } => {
                write!(f, "worker {worker}: call failed: {error}")
            }
            Self::WorkerFailures { failures } => {
                write!(f, "{} workers failed:", failures.len())?;
                for (worker, error) in failures {
                    write!(f, " [worker {worker}: {error}]")?;
                }
                Ok(())
            }
            Self::InvariantViolation { reason } => write!(f, "invariant violation: {reason}"),
            Self::InvalidWorker {
                worker,
                num_workers,
            } => write!(
                f,
                "worker index {worker} out of range (num_workers={num_workers})"
            ),
            Self::NotStarted => write!(f, "workers not started; call poll() first"),
            Self::Stopped => write!(f, "dispatcher has been stopped"),
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::ConstructionFailure { error, .. } | Self::WorkerFailure { error, .. } => {
                Some(error)
            }
            Self::WorkerFailures { failures } => {
                failures.first().map(|(_, e)| e as &(dyn Error + 'static))
            }
            _ => None,
        }
    }
}

impl DispatchError {
    /// Fold the failed calls of one pass into a single error. `None` if
    /// nothing failed.
    pub fn from_failures(mut failures: FailedCalls) -> Option<Self> {
        match failures.len() {
            0 => None,
            1 => failures
                .pop()
                .map(|(worker, error)| Self::WorkerFailure { worker, error }),
            _ => Some(Self::WorkerFailures { failures }),
        }
    }

    /// Workers whose remote calls this error reports, in resolution
    /// order. Empty for every other kind of error.
    pub fn failed_workers(&self) -> SmallVec<[WorkerIndex; 4]> {
        match self {
            Self::WorkerFailure { worker, .. } => SmallVec::from_slice(&[*worker]),
            Self::WorkerFailures { failures } => failures.iter().map(|(w, _)| *w).collect(),
            _ => SmallVec::new(),
        }
    }
}

impl From<ConfigError> for DispatchError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
