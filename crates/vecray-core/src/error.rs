//! Error types shared by environments, executors, and workers.

use std::error::Error;
use std::fmt;

/// Failure of an environment, a local executor, or the worker running it.
///
/// A worker call fails as a whole: one failing environment fails the
/// entire `reset`/`step` for that worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvError {
    /// The environment raised during construction, reset, or step.
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// An action was not a member of the action space.
    InvalidAction {
        /// Description of the rejected action.
        reason: String,
    },
    /// A result did not match the declared observation space or batch width.
    ShapeMismatch {
        /// Description of the mismatch.
        reason: String,
    },
    /// The worker thread exited before replying (panic or early shutdown).
    WorkerLost,
    /// The worker thread could not be spawned.
    Spawn {
        /// Description from the OS.
        reason: String,
    },
}

impl EnvError {
    /// Shorthand for [`EnvError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { reason } => write!(f, "environment failed: {reason}"),
            Self::InvalidAction { reason } => write!(f, "invalid action: {reason}"),
            Self::ShapeMismatch { reason } => write!(f, "shape mismatch: {reason}"),
            Self::WorkerLost => write!(f, "worker exited before replying"),
            Self::Spawn { reason } => write!(f, "worker spawn failed: {reason}"),
        }
    }
}

impl Error for EnvError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_reason() {
        let e = EnvError::failed("boom");
        assert_eq!(e.to_string(), "environment failed: boom");
        assert_eq!(
            EnvError::WorkerLost.to_string(),
            "worker exited before replying"
        );
    }
}
