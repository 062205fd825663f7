//! Poll-cycle metrics for the vector dispatcher.
//!
//! [`PollMetrics`] describes the most recent `poll()`; [`DispatchTotals`]
//! accumulates over the dispatcher's lifetime.

use smallvec::SmallVec;

use vecray_core::WorkerIndex;

/// Timing and resolution data for a single `poll()`.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PollMetrics {
    /// Wait attempts made before at least one call resolved.
    pub wait_attempts: u32,
    /// Attempts that timed out or woke spuriously with nothing resolved.
    pub empty_attempts: u32,
    /// Wall-clock time spent waiting, in microseconds.
    pub wait_us: u64,
    /// Workers whose calls resolved successfully and were written to
    /// the buffer, in resolution order.
    pub resolved: SmallVec<[WorkerIndex; 8]>,
    /// Workers whose calls resolved with an error during this poll.
    pub failed: SmallVec<[WorkerIndex; 4]>,
}

/// Lifetime counters for one dispatcher.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchTotals {
    /// Wait passes that resolved calls with no failure, whether from
    /// `poll()`/`try_poll()` or inside `reset()`/`step()`.
    pub polls: u64,
    /// Reset calls issued (initial, empty-table, and explicit).
    pub resets_issued: u64,
    /// Step calls issued.
    pub steps_issued: u64,
    /// Calls whose result was written into the buffer.
    pub resolutions: u64,
    /// Calls that resolved with an error.
    pub worker_failures: u64,
    /// Cumulative empty wait attempts.
    pub empty_wait_attempts: u64,
}
