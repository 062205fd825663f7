//! Pending-call table: in-flight call handles keyed to their worker.
//!
//! The table is the only record of which worker issued which call. It
//! keeps a reverse slot per worker so the single-outstanding-call
//! invariant is checked in O(1) and resolving a handle never needs to
//! scan the worker pool.

use indexmap::IndexMap;

use vecray_core::{CallId, WorkerIndex};

use crate::runtime::{CallHandle, Reply};

/// Which operation a pending call performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// `reset()` of every environment on the worker.
    Reset,
    /// `step(actions)` of every environment on the worker.
    Step,
}

struct PendingCall {
    worker: WorkerIndex,
    kind: CallKind,
    handle: CallHandle,
}

/// A call whose reply has been taken out of the table.
#[derive(Debug)]
pub struct Resolution {
    /// The call that resolved.
    pub call: CallId,
    /// The worker that issued it.
    pub worker: WorkerIndex,
    /// Operation performed.
    pub kind: CallKind,
    /// The worker's reply.
    pub reply: Reply,
}

/// Mapping from in-flight call to owning worker.
pub struct PendingCallTable {
    calls: IndexMap<CallId, PendingCall>,
    by_worker: Vec<Option<CallId>>,
}

impl PendingCallTable {
    /// An empty table for `num_workers` workers.
    pub fn new(num_workers: usize) -> Self {
        Self {
            calls: IndexMap::new(),
            by_worker: vec![None; num_workers],
        }
    }

    /// Number of in-flight calls.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// True if no call is in flight.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The in-flight call of `worker`, if any.
    pub fn pending_for(&self, worker: WorkerIndex) -> Option<(CallId, CallKind)> {
        let id = (*self.by_worker.get(worker.0)?)?;
        self.calls.get(&id).map(|c| (id, c.kind))
    }

    /// Whether `worker` has an in-flight call.
    pub fn is_busy(&self, worker: WorkerIndex) -> bool {
        matches!(self.by_worker.get(worker.0), Some(Some(_)))
    }

    /// Register a freshly issued call.
    ///
    /// # Panics
    ///
    /// Panics if `worker` already has an in-flight call. Callers check
    /// [`is_busy`](Self::is_busy) before dispatching; reaching this is a
    /// bug in the dispatcher, not a runtime condition.
    pub fn insert(&mut self, worker: WorkerIndex, kind: CallKind, handle: CallHandle) {
        let slot = &mut self.by_worker[worker.0];
        assert!(
            slot.is_none(),
            "worker {worker} already has call {:?} in flight",
            slot
        );
        let id = handle.id();
        *slot = Some(id);
        self.calls.insert(
            id,
            PendingCall {
                worker,
                kind,
                handle,
            },
        );
    }

    /// Iterate the handles of every in-flight call.
    pub fn handles(&self) -> impl Iterator<Item = &CallHandle> {
        self.calls.values().map(|c| &c.handle)
    }

    /// Remove and return every call whose reply has arrived, in
    /// issue order.
    pub fn drain_resolved(&mut self) -> Vec<Resolution> {
        let mut out = Vec::new();
        self.calls.retain(|id, call| match call.handle.try_resolve() {
            Some(reply) => {
                out.push(Resolution {
                    call: *id,
                    worker: call.worker,
                    kind: call.kind,
                    reply,
                });
                false
            }
            None => true,
        });
        for r in &out {
            self.by_worker[r.worker.0] = None;
        }
        out
    }

    /// Drop every in-flight call without waiting for replies.
    pub fn clear(&mut self) {
        self.calls.clear();
        self.by_worker.iter_mut().for_each(|slot| *slot = None);
    }
}
