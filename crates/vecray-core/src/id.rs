//! Strongly-typed identifiers for workers, environments, and calls.

use std::fmt;

/// Identifies one worker actor in a dispatcher's pool.
///
/// Fixed at construction: `WorkerIndex(w)` owns the contiguous batch
/// range `[w * env_per_worker, (w + 1) * env_per_worker)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerIndex(pub usize);

impl fmt::Display for WorkerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for WorkerIndex {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// Globally unique environment id, equal to the flat batch index.
///
/// Passed to the environment factory so each instance can derive its
/// own seed. `EnvId(worker * env_per_worker + local_slot)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnvId(pub usize);

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for EnvId {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// Identifies one issued asynchronous `reset`/`step` call.
///
/// Allocated from a per-dispatcher monotonic counter; never reused
/// within a dispatcher's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(pub u64);

impl CallId {
    /// The id following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
