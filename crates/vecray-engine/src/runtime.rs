//! Call handles and the wait-for-any primitive.
//!
//! Every call issued to a worker carries its own bounded(1) reply
//! channel. The receiving half is the [`CallHandle`]. Waiting on a set of
//! handles is a `crossbeam_channel::Select` over their receivers, which
//! also wakes when a worker thread dies and drops its reply sender.

use std::time::Duration;

use crossbeam_channel::{Receiver, Select, Sender, TryRecvError};

use vecray_core::{BatchResult, CallId, EnvError};

/// What a worker sends back for one call.
pub type Reply = Result<BatchResult, EnvError>;

/// Receiving end of one in-flight call.
#[derive(Debug)]
pub struct CallHandle {
    id: CallId,
    rx: Receiver<Reply>,
}

impl CallHandle {
    /// Create a handle and the sender the worker replies on.
    pub(crate) fn channel(id: CallId) -> (Sender<Reply>, Self) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        (tx, Self { id, rx })
    }

    /// A handle that is already resolved with `reply`.
    pub(crate) fn resolved(id: CallId, reply: Reply) -> Self {
        let (tx, handle) = Self::channel(id);
        // Capacity 1 and nothing else holds the receiver: cannot fail.
        let _ = tx.send(reply);
        handle
    }

    /// The call this handle belongs to.
    pub fn id(&self) -> CallId {
        self.id
    }

    /// Take the reply if it has arrived.
    ///
    /// A disconnected channel means the worker exited without replying
    /// and resolves as [`EnvError::WorkerLost`].
    pub(crate) fn try_resolve(&self) -> Option<Reply> {
        match self.rx.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(EnvError::WorkerLost)),
        }
    }
}

/// Outcome of one wait attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Wake {
    /// At least one handle signalled readiness. May be spurious.
    Signalled,
    /// The timeout elapsed first, or there was nothing to wait on.
    TimedOut,
}

/// Block until any of `handles` is ready, or `timeout` elapses.
///
/// `Select` may report readiness spuriously; callers re-check each
/// handle with [`CallHandle::try_resolve`].
pub(crate) fn wait_any<'a>(
    handles: impl IntoIterator<Item = &'a CallHandle>,
    timeout: Option<Duration>,
) -> Wake {
    let mut sel = Select::new();
    let mut count = 0usize;
    for handle in handles {
        sel.recv(&handle.rx);
        count += 1;
    }
    if count == 0 {
        return Wake::TimedOut;
    }
    match timeout {
        None => {
            sel.ready();
            Wake::Signalled
        }
        Some(t) => match sel.ready_timeout(t) {
            Ok(_) => Wake::Signalled,
            Err(_) => Wake::TimedOut,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn pre_resolved_handle_is_ready() {
        let h = CallHandle::resolved(CallId(1), Err(EnvError::failed("x")));
        assert_eq!(wait_any([&h], Some(Duration::from_millis(10))), Wake::Signalled);
        assert_eq!(h.try_resolve(), Some(Err(EnvError::failed("x"))));
    }

    #[test]
    fn unresolved_handle_times_out() {
        let (_tx, h) = CallHandle::channel(CallId(1));
        assert_eq!(wait_any([&h], Some(Duration::from_millis(5))), Wake::TimedOut);
        assert_eq!(h.try_resolve(), None);
    }

    #[test]
    fn dropped_sender_resolves_as_worker_lost() {
        let (tx, h) = CallHandle::channel(CallId(7));
        drop(tx);
        assert_eq!(wait_any([&h], None), Wake::Signalled);
        assert_eq!(h.try_resolve(), Some(Err(EnvError::WorkerLost)));
    }

    #[test]
    fn wakes_on_reply_from_another_thread() {
        let (tx, h) = CallHandle::channel(CallId(2));
        let (_idle_tx, idle) = CallHandle::channel(CallId(3));
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            tx.send(Ok(BatchResult::default())).unwrap();
        });
        assert_eq!(wait_any([&idle, &h], None), Wake::Signalled);
        t.join().unwrap();
        assert!(h.try_resolve().is_some());
        assert!(idle.try_resolve().is_none());
    }

    #[test]
    fn empty_set_does_not_block() {
        assert_eq!(wait_any(std::iter::empty(), None), Wake::TimedOut);
    }
}
