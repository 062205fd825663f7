//! Worker actors: one thread per worker, owning one local executor.
//!
//! A worker receives [`WorkerCall`]s on its mailbox, runs them against
//! its executor, and sends the result back on the call's private reply
//! channel. The executor is built on the worker thread itself, so
//! environments never cross threads.
//!
//! ```text
//! Dispatcher (caller thread)          Worker w (vecray-worker-w)
//!     |                                   | build executor
//!     |<--ready: Ok / Err(EnvError)-------|
//!     |--Reset{reply} / Step{..}--------->| mailbox.recv()
//!     |                                   | executor.reset()/step()
//!     |<--reply.send(Result)--------------|
//!     |--Terminate----------------------->| exit loop, drop executor
//! ```

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, trace};

use vecray_core::{Action, BatchResult, CallId, EnvError, LocalExecutor, ObsSpace, WorkerIndex};

use crate::config::ResultShaping;
use crate::runtime::{CallHandle, Reply};

/// Message delivered to a worker's mailbox.
pub(crate) enum WorkerCall {
    /// Reset every owned environment.
    Reset { reply: Sender<Reply> },
    /// Step every owned environment with the matching action.
    Step {
        actions: Vec<Action>,
        reply: Sender<Reply>,
    },
    /// Exit the worker loop.
    Terminate,
}

/// Dispatcher-side handle to one worker thread.
pub struct WorkerActor {
    index: WorkerIndex,
    mailbox: Option<Sender<WorkerCall>>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerActor {
    /// Spawn a worker thread that builds its executor with `build`.
    ///
    /// Returns immediately. The returned receiver yields exactly once:
    /// `Ok(())` when the executor is built, or the build error (after
    /// which the thread has already exited).
    pub(crate) fn spawn<X, B>(
        index: WorkerIndex,
        shaping: ResultShaping,
        space: ObsSpace,
        build: B,
    ) -> Result<(Self, Receiver<Result<(), EnvError>>), EnvError>
    where
        X: LocalExecutor + 'static,
        B: FnOnce() -> Result<X, EnvError> + Send + 'static,
    {
        // Room for one call plus Terminate.
        let (mailbox_tx, mailbox_rx) = crossbeam_channel::bounded(2);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let thread = thread::Builder::new()
            .name(format!("vecray-worker-{index}"))
            .spawn(move || {
                let executor = match build() {
                    Ok(x) => {
                        let _ = ready_tx.send(Ok(()));
                        x
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                WorkerLoop {
                    index,
                    executor,
                    shaping,
                    space,
                }
                .run(mailbox_rx);
            })
            .map_err(|e| EnvError::Spawn {
                reason: format!("worker {index}: {e}"),
            })?;

        Ok((
            Self {
                index,
                mailbox: Some(mailbox_tx),
                thread: Some(thread),
            },
            ready_rx,
        ))
    }

    /// This worker's index.
    pub fn index(&self) -> WorkerIndex {
        self.index
    }

    /// Issue an asynchronous reset.
    pub(crate) fn call_reset(&self, id: CallId) -> CallHandle {
        let (reply, handle) = CallHandle::channel(id);
        self.deliver(id, WorkerCall::Reset { reply }, handle)
    }

    /// Issue an asynchronous step.
    pub(crate) fn call_step(&self, id: CallId, actions: Vec<Action>) -> CallHandle {
        let (reply, handle) = CallHandle::channel(id);
        self.deliver(id, WorkerCall::Step { actions, reply }, handle)
    }

    /// Send `call`; if the mailbox is closed, hand back a handle that is
    /// already resolved as lost so the failure surfaces through `poll`.
    fn deliver(&self, id: CallId, call: WorkerCall, handle: CallHandle) -> CallHandle {
        let sent = match &self.mailbox {
            Some(mailbox) => mailbox.send(call).is_ok(),
            None => false,
        };
        if sent {
            trace!("worker {}: call {id} delivered", self.index);
            handle
        } else {
            debug!("worker {}: mailbox closed, call {id} lost", self.index);
            CallHandle::resolved(id, Err(EnvError::WorkerLost))
        }
    }

    /// Ask the worker to exit after any call it is running, and close
    /// the mailbox. Returns false if it was already signalled.
    pub(crate) fn terminate(&mut self) -> bool {
        match self.mailbox.take() {
            Some(mailbox) => {
                let _ = mailbox.send(WorkerCall::Terminate);
                true
            }
            None => false,
        }
    }

    /// Whether the worker thread has exited (or was never running).
    pub(crate) fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Join the thread. Returns false if it panicked.
    pub(crate) fn join(&mut self) -> bool {
        match self.thread.take() {
            Some(t) => t.join().is_ok(),
            None => true,
        }
    }

    /// Give up on joining; the thread keeps running until its current
    /// call returns and then exits on the closed mailbox.
    pub(crate) fn detach(&mut self) {
        self.thread.take();
    }
}

/// State owned by the worker thread.
struct WorkerLoop<X: LocalExecutor> {
    index: WorkerIndex,
    executor: X,
    shaping: ResultShaping,
    space: ObsSpace,
}

impl<X: LocalExecutor> WorkerLoop<X> {
    /// Serve calls until Terminate or until the mailbox closes.
    fn run(mut self, mailbox: Receiver<WorkerCall>) {
        while let Ok(call) = mailbox.recv() {
            match call {
                WorkerCall::Reset { reply } => {
                    let _ = reply.send(self.reset());
                }
                WorkerCall::Step { actions, reply } => {
                    let _ = reply.send(self.step(&actions));
                }
                WorkerCall::Terminate => break,
            }
        }
        debug!("worker {}: exiting", self.index);
    }

    /// Reset every environment; rewards zero, dones false, infos shaped.
    fn reset(&mut self) -> Result<BatchResult, EnvError> {
        let mut batch = self.executor.reset()?;
        let n = batch.observations.len();
        batch.rewards = vec![0.0; n];
        batch.dones = vec![false; n];
        batch.infos = (0..n).map(|_| self.shaping.reset_info(&self.space)).collect();
        Ok(batch)
    }

    fn step(&mut self, actions: &[Action]) -> Result<BatchResult, EnvError> {
        if actions.len() != self.executor.num_envs() {
            return Err(EnvError::InvalidAction {
                reason: format!(
                    "worker {} got {} actions for {} environments",
                    self.index,
                    actions.len(),
                    self.executor.num_envs()
                ),
            });
        }
        self.executor.step(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{wait_any, Wake};
    use vecray_core::{Dtype, FieldBuffer, Info, InfoValue, Observation, Transition};

    /// Executor over `n` fake envs whose observation is the step count.
    struct CountingExecutor {
        n: usize,
        steps: i64,
        fail_on_step: Option<i64>,
    }

    impl LocalExecutor for CountingExecutor {
        fn num_envs(&self) -> usize {
            self.n
        }
        fn reset(&mut self) -> Result<BatchResult, EnvError> {
            self.steps = 0;
            let mut b = BatchResult::with_capacity(self.n);
            for _ in 0..self.n {
                b.push(Transition {
                    obs: Observation::single(FieldBuffer::I64(vec![0])),
                    // Deliberately non-zero: the worker must overwrite it.
                    reward: 9.0,
                    done: true,
                    info: Info::new(),
                });
            }
            Ok(b)
        }
        fn step(&mut self, actions: &[Action]) -> Result<BatchResult, EnvError> {
            self.steps += 1;
            if Some(self.steps) == self.fail_on_step {
                return Err(EnvError::failed("scheduled failure"));
            }
            let mut b = BatchResult::with_capacity(self.n);
            for _ in actions {
                b.push(Transition {
                    obs: Observation::single(FieldBuffer::I64(vec![self.steps])),
                    reward: 1.0,
                    done: false,
                    info: Info::new(),
                });
            }
            Ok(b)
        }
    }

    fn spawn(
        n: usize,
        fail_on_step: Option<i64>,
        shaping: ResultShaping,
    ) -> WorkerActor {
        let (actor, ready) = WorkerActor::spawn(
            WorkerIndex(0),
            shaping,
            ObsSpace::single(&[1], Dtype::I64),
            move || {
                Ok(CountingExecutor {
                    n,
                    steps: 0,
                    fail_on_step,
                })
            },
        )
        .unwrap();
        ready.recv().unwrap().unwrap();
        actor
    }

    fn resolve(handle: &CallHandle) -> Reply {
        assert_eq!(wait_any([handle], None), Wake::Signalled);
        loop {
            if let Some(reply) = handle.try_resolve() {
                return reply;
            }
        }
    }

    #[test]
    fn reset_overwrites_rewards_and_dones() {
        let mut w = spawn(3, None, ResultShaping::SingleAgent);
        let batch = resolve(&w.call_reset(CallId(0))).unwrap();
        assert_eq!(batch.rewards, vec![0.0; 3]);
        assert_eq!(batch.dones, vec![false; 3]);
        assert!(batch.infos.iter().all(|i| i.is_empty()));
        w.terminate();
        assert!(w.join());
    }

    #[test]
    fn multi_agent_reset_shapes_infos() {
        let mut w = spawn(2, None, ResultShaping::MultiAgent);
        let batch = resolve(&w.call_reset(CallId(0))).unwrap();
        assert_eq!(
            batch.infos[0].get("obs"),
            Some(&InfoValue::Map(Info::new()))
        );
        w.terminate();
        w.join();
    }

    #[test]
    fn step_failure_fails_whole_call() {
        let mut w = spawn(2, Some(2), ResultShaping::SingleAgent);
        resolve(&w.call_reset(CallId(0))).unwrap();
        let a = vec![Action::Discrete(0); 2];
        assert!(resolve(&w.call_step(CallId(1), a.clone())).is_ok());
        assert_eq!(
            resolve(&w.call_step(CallId(2), a)),
            Err(EnvError::failed("scheduled failure"))
        );
        w.terminate();
        w.join();
    }

    #[test]
    fn wrong_action_count_is_rejected_on_worker() {
        let mut w = spawn(2, None, ResultShaping::SingleAgent);
        let reply = resolve(&w.call_step(CallId(0), vec![Action::Discrete(0)]));
        assert!(matches!(reply, Err(EnvError::InvalidAction { .. })));
        w.terminate();
        w.join();
    }

    #[test]
    fn call_after_terminate_resolves_lost() {
        let mut w = spawn(1, None, ResultShaping::SingleAgent);
        assert!(w.terminate());
        assert!(!w.terminate());
        let reply = resolve(&w.call_reset(CallId(0)));
        assert_eq!(reply, Err(EnvError::WorkerLost));
        assert!(w.join());
        assert!(w.is_finished());
    }

    #[test]
    fn build_failure_is_reported_on_ready_channel() {
        let (mut w, ready) = WorkerActor::spawn(
            WorkerIndex(4),
            ResultShaping::SingleAgent,
            ObsSpace::single(&[1], Dtype::I64),
            || -> Result<CountingExecutor, EnvError> { Err(EnvError::failed("no env")) },
        )
        .unwrap();
        assert_eq!(ready.recv().unwrap(), Err(EnvError::failed("no env")));
        assert!(w.join());
    }
}
