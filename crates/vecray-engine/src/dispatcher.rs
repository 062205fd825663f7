//! The vector dispatcher: owns the worker pool, the pending-call table and
//! the result buffer, and exposes the poll / send_actions contract.
//!
//! Workers are started lazily by the first [`poll`](VectorDispatcher::poll).
//! Every `poll` waits for at least one in-flight call, copies each resolved
//! result into its worker's slot range, and returns a full-width
//! [`Batch`]. Workers that have not replied keep their previous slots.
//!
//! [`reset`](VectorDispatcher::reset) and [`step`](VectorDispatcher::step)
//! wrap the same machinery for lockstep use: they return only once every
//! worker has replied.
//!
//! # Example
//!
//! ```ignore
//! let mut vec = VectorDispatcher::new(make_env, DispatcherConfig::new(4, 2))?;
//! let batch = vec.poll()?;              // reset results, 8 slots
//! vec.send_actions(&actions)?;          // one step call per worker
//! let batch = vec.poll()?;              // whichever workers replied first
//!
//! let batch = vec.step(&actions)?;      // lockstep: every worker replied
//! vec.stop();
//! ```

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};

use vecray_core::{
    Action, ActionSpace, CallId, Env, EnvError, EnvId, Layout, ObsSpace, WorkerIndex,
};

use crate::buffer::{Batch, ResultBuffer};
use crate::config::{ConfigError, DispatcherConfig};
use crate::error::{DispatchError, FailedCalls};
use crate::executor::SequentialExecutor;
use crate::metrics::{DispatchTotals, PollMetrics};
use crate::pending::{CallKind, PendingCallTable, Resolution};
use crate::runtime::{wait_any, Wake};
use crate::worker::WorkerActor;

type Factory<E> = dyn Fn(EnvId) -> Result<E, EnvError> + Send + Sync;

// ── WorkerState ──────────────────────────────────────────────────

/// Lifecycle state of one worker, as seen by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// Workers have not been started yet.
    Uncreated,
    /// Running with no call in flight.
    Idle,
    /// A reset call is in flight.
    AwaitingReset,
    /// A step call is in flight.
    AwaitingStep,
    /// `stop()` has been called.
    Terminated,
}

// ── PendingReset ─────────────────────────────────────────────────

/// Returned by [`VectorDispatcher::try_reset`]: the reset was issued and
/// its result will arrive through a later `poll()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingReset {
    /// Worker the reset was issued to.
    pub worker: WorkerIndex,
    /// Call carrying the reset.
    pub call: CallId,
}

// ── ShutdownReport ───────────────────────────────────────────────

/// Report from [`VectorDispatcher::stop`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Total time spent in the shutdown sequence.
    pub total_ms: u64,
    /// Workers that were sent a terminate signal.
    pub workers_signalled: usize,
    /// Worker threads joined cleanly.
    pub workers_joined: usize,
    /// Worker threads still running after the grace period, left to exit
    /// on their own.
    pub workers_detached: usize,
}

// ── VectorDispatcher ─────────────────────────────────────────────

/// Asynchronous vectorized dispatcher over `num_workers` worker threads,
/// each owning `env_per_worker` environments.
pub struct VectorDispatcher<E: Env + 'static> {
    factory: Arc<Factory<E>>,
    config: DispatcherConfig,
    layout: Layout,
    observation_space: ObsSpace,
    action_space: ActionSpace,
    workers: Vec<WorkerActor>,
    pending: PendingCallTable,
    buffer: ResultBuffer,
    next_call: CallId,
    last_metrics: PollMetrics,
    totals: DispatchTotals,
    stopped: bool,
}

impl<E: Env + 'static> VectorDispatcher<E> {
    /// Validate `config`, probe the spaces with `factory(EnvId(0))` on the
    /// calling thread, and allocate the result buffer.
    ///
    /// No worker is started until the first [`poll`](Self::poll).
    ///
    /// # Errors
    ///
    /// [`DispatchError::Config`] for an invalid config, an environment
    /// with no observation fields, or an action space with no members; [`DispatchError::ConstructionFailure`]
    /// (with `worker: None`) if the probe environment cannot be built.
    pub fn new<F>(factory: F, config: DispatcherConfig) -> Result<Self, DispatchError>
    where
        F: Fn(EnvId) -> Result<E, EnvError> + Send + Sync + 'static,
    {
        let layout = config.validate()?;
        let probe = factory(EnvId(0))
            .map_err(|error| DispatchError::ConstructionFailure {
                worker: None,
                error,
            })?;
        let observation_space = probe.observation_space();
        let action_space = probe.action_space();
        drop(probe);
        if observation_space.is_empty() {
            return Err(ConfigError::EmptyObservationSpace.into());
        }
        if !action_space.is_valid() {
            return Err(ConfigError::InvalidActionSpace.into());
        }

        Ok(Self {
            factory: Arc::new(factory),
            buffer: ResultBuffer::new(layout, observation_space.clone()),
            pending: PendingCallTable::new(layout.num_workers()),
            config,
            layout,
            observation_space,
            action_space,
            workers: Vec::new(),
            next_call: CallId(0),
            last_metrics: PollMetrics::default(),
            totals: DispatchTotals::default(),
            stopped: false,
        })
    }

    // ── Introspection ────────────────────────────────────────────

    /// Observation space of every environment.
    pub fn observation_space(&self) -> &ObsSpace {
        &self.observation_space
    }

    /// Action space of every environment.
    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    /// Worker/slot layout of the batch.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Total environments, `num_workers * env_per_worker`.
    pub fn num_envs(&self) -> usize {
        self.layout.total_envs()
    }

    /// Number of calls currently in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Lifecycle state of `worker`.
    pub fn worker_state(&self, worker: WorkerIndex) -> Result<WorkerState, DispatchError> {
        self.check_worker(worker)?;
        if self.stopped {
            return Ok(WorkerState::Terminated);
        }
        if self.workers.is_empty() {
            return Ok(WorkerState::Uncreated);
        }
        Ok(match self.pending.pending_for(worker) {
            None => WorkerState::Idle,
            Some((_, CallKind::Reset)) => WorkerState::AwaitingReset,
            Some((_, CallKind::Step)) => WorkerState::AwaitingStep,
        })
    }

    /// Metrics from the most recent `poll()` or `try_poll()`.
    pub fn last_poll_metrics(&self) -> &PollMetrics {
        &self.last_metrics
    }

    /// Lifetime counters.
    pub fn totals(&self) -> &DispatchTotals {
        &self.totals
    }

    /// Copy of the result buffer as it stands, without waiting on any
    /// worker.
    pub fn snapshot(&self) -> Result<Batch, DispatchError> {
        self.check_running()?;
        Ok(self.buffer.snapshot())
    }

    // ── Poll ─────────────────────────────────────────────────────

    /// Wait until at least one in-flight call resolves, write every
    /// resolved result into the buffer, and return a copy of the whole
    /// buffer.
    ///
    /// Starts the workers on first use. If nothing is in flight, issues a
    /// reset to every worker first. With no `poll_timeout` configured this
    /// blocks until some worker replies; with one, each wait attempt is
    /// bounded and empty attempts are retried.
    ///
    /// # Errors
    ///
    /// [`DispatchError::WorkerFailure`] if one resolved call failed, or
    /// [`DispatchError::WorkerFailures`] naming every call that failed in
    /// the same pass. The successful results of that pass are still
    /// written, and no failed call is carried into a later poll.
    pub fn poll(&mut self) -> Result<Batch, DispatchError> {
        self.begin_poll()?;
        let (resolved, metrics) = self.wait_resolved();
        self.finish_poll(resolved, metrics)
    }

    /// Like [`poll`](Self::poll), but makes exactly one wait attempt of at
    /// most `timeout`. Returns `Ok(None)` if nothing resolved.
    pub fn try_poll(&mut self, timeout: Duration) -> Result<Option<Batch>, DispatchError> {
        self.begin_poll()?;

        let mut metrics = PollMetrics {
            wait_attempts: 1,
            ..PollMetrics::default()
        };
        let start = Instant::now();
        wait_any(self.pending.handles(), Some(timeout));
        let resolved = self.pending.drain_resolved();
        metrics.wait_us = start.elapsed().as_micros() as u64;
        if resolved.is_empty() {
            metrics.empty_attempts = 1;
            self.totals.empty_wait_attempts += 1;
            self.last_metrics = metrics;
            return Ok(None);
        }
        self.finish_poll(resolved, metrics).map(Some)
    }

    /// Shared prologue of `poll` and `try_poll`.
    fn begin_poll(&mut self) -> Result<(), DispatchError> {
        self.check_running()?;
        if self.workers.is_empty() {
            self.start_workers()?;
        }
        if self.pending.is_empty() {
            for w in self.layout.workers() {
                self.issue_reset(w);
            }
        }
        Ok(())
    }

    /// Retry wait attempts until at least one pending call resolves.
    fn wait_resolved(&mut self) -> (Vec<Resolution>, PollMetrics) {
        let mut metrics = PollMetrics::default();
        let start = Instant::now();
        let resolved = loop {
            metrics.wait_attempts += 1;
            let wake = wait_any(self.pending.handles(), self.config.poll_timeout);
            let resolved = self.pending.drain_resolved();
            if !resolved.is_empty() {
                break resolved;
            }
            metrics.empty_attempts += 1;
            self.totals.empty_wait_attempts += 1;
            match wake {
                Wake::TimedOut => trace!("poll: wait attempt timed out, retrying"),
                Wake::Signalled => trace!("poll: spurious wake, retrying"),
            }
        };
        metrics.wait_us = start.elapsed().as_micros() as u64;
        (resolved, metrics)
    }

    /// Write resolved results into the buffer and build the poll outcome.
    fn finish_poll(
        &mut self,
        resolved: Vec<Resolution>,
        metrics: PollMetrics,
    ) -> Result<Batch, DispatchError> {
        let failures = self.apply_resolved(resolved, metrics);
        match DispatchError::from_failures(failures) {
            Some(e) => Err(e),
            None => {
                self.totals.polls += 1;
                Ok(self.buffer.snapshot())
            }
        }
    }

    /// Write every successful result and collect the failed calls.
    fn apply_resolved(
        &mut self,
        resolved: Vec<Resolution>,
        mut metrics: PollMetrics,
    ) -> FailedCalls {
        let mut failures = FailedCalls::new();
        for r in resolved {
            let written = r
                .reply
                .and_then(|result| self.buffer.write_worker(r.worker, &result));
            match written {
                Ok(()) => {
                    debug!("worker {}: {:?} call {} resolved", r.worker, r.kind, r.call);
                    metrics.resolved.push(r.worker);
                    self.totals.resolutions += 1;
                }
                Err(error) => {
                    warn!("worker {}: {:?} call {} failed: {error}", r.worker, r.kind, r.call);
                    metrics.failed.push(r.worker);
                    self.totals.worker_failures += 1;
                    failures.push((r.worker, error));
                }
            }
        }
        self.last_metrics = metrics;
        failures
    }

    // ── Lockstep ─────────────────────────────────────────────────

    /// Reset every environment and wait for all workers to reply.
    ///
    /// Starts the workers on first use.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvariantViolation`] if any call is still in
    /// flight. A worker failure is reported once every other worker has
    /// replied, so nothing is left in flight either way.
    pub fn reset(&mut self) -> Result<Batch, DispatchError> {
        self.check_running()?;
        if !self.pending.is_empty() {
            return Err(DispatchError::InvariantViolation {
                reason: format!("{} calls still in flight", self.pending.len()),
            });
        }
        if self.workers.is_empty() {
            self.start_workers()?;
        }
        for w in self.layout.workers() {
            self.issue_reset(w);
        }
        self.settle()
    }

    /// Send `actions` and wait for every worker to reply.
    ///
    /// # Errors
    ///
    /// Everything [`send_actions`](Self::send_actions) rejects. Worker
    /// failures as for [`reset`](Self::reset).
    pub fn step(&mut self, actions: &[Action]) -> Result<Batch, DispatchError> {
        self.send_actions(actions)?;
        self.settle()
    }

    /// Wait passes until nothing is in flight. Failures from every pass
    /// are reported together at the end.
    fn settle(&mut self) -> Result<Batch, DispatchError> {
        let mut failures = FailedCalls::new();
        while !self.pending.is_empty() {
            let (resolved, metrics) = self.wait_resolved();
            let failed = self.apply_resolved(resolved, metrics);
            if failed.is_empty() {
                self.totals.polls += 1;
            }
            failures.extend(failed);
        }
        match DispatchError::from_failures(failures) {
            Some(e) => Err(e),
            None => Ok(self.buffer.snapshot()),
        }
    }

    // ── Dispatch ─────────────────────────────────────────────────

    /// Issue one step call per worker with its slice of `actions`.
    ///
    /// All checks run before anything is dispatched, so on error no
    /// worker has been sent a call.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotStarted`] before the first `poll()`;
    /// [`DispatchError::InvariantViolation`] if `actions` is not exactly
    /// `num_envs()` long or any worker still has a call in flight.
    pub fn send_actions(&mut self, actions: &[Action]) -> Result<(), DispatchError> {
        self.check_running()?;
        self.check_started()?;
        if actions.len() != self.layout.total_envs() {
            return Err(DispatchError::InvariantViolation {
                reason: format!(
                    "action batch has {} entries, expected {}",
                    actions.len(),
                    self.layout.total_envs()
                ),
            });
        }
        let busy: Vec<WorkerIndex> = self
            .layout
            .workers()
            .filter(|w| self.pending.is_busy(*w))
            .collect();
        if !busy.is_empty() {
            return Err(DispatchError::InvariantViolation {
                reason: format!("workers {busy:?} still have a call in flight"),
            });
        }

        for w in self.layout.workers() {
            let id = self.issue_id();
            let slice = actions[self.layout.slot_range(w)].to_vec();
            let handle = self.workers[w.0].call_step(id, slice);
            self.pending.insert(w, CallKind::Step, handle);
            self.totals.steps_issued += 1;
            debug!("worker {w}: step call {id} issued");
        }
        Ok(())
    }

    /// Issue a reset to a single worker. The result arrives through a
    /// later `poll()`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidWorker`] for an out-of-range index,
    /// [`DispatchError::NotStarted`] before the first `poll()`, and
    /// [`DispatchError::InvariantViolation`] if the worker is busy.
    pub fn try_reset(&mut self, worker: WorkerIndex) -> Result<PendingReset, DispatchError> {
        self.check_running()?;
        self.check_worker(worker)?;
        self.check_started()?;
        if let Some((call, kind)) = self.pending.pending_for(worker) {
            return Err(DispatchError::InvariantViolation {
                reason: format!("worker {worker} already has {kind:?} call {call} in flight"),
            });
        }
        let call = self.issue_reset(worker);
        Ok(PendingReset { worker, call })
    }

    fn issue_reset(&mut self, worker: WorkerIndex) -> CallId {
        let id = self.issue_id();
        let handle = self.workers[worker.0].call_reset(id);
        self.pending.insert(worker, CallKind::Reset, handle);
        self.totals.resets_issued += 1;
        debug!("worker {worker}: reset call {id} issued");
        id
    }

    fn issue_id(&mut self) -> CallId {
        let id = self.next_call;
        self.next_call = id.next();
        id
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn every worker and wait for their executors to build.
    ///
    /// On any failure the workers spawned so far are terminated and the
    /// pool is left uncreated, so a later `poll()` starts over.
    fn start_workers(&mut self) -> Result<(), DispatchError> {
        let mut spawned = Vec::with_capacity(self.layout.num_workers());
        let mut readies = Vec::with_capacity(self.layout.num_workers());
        let mut failure = None;

        for w in self.layout.workers() {
            let range = self.layout.slot_range(w);
            info!("launching worker {w} with envs {range:?}");
            let factory = Arc::clone(&self.factory);
            let build = move || SequentialExecutor::build(|id| factory(id), range.map(EnvId));
            match WorkerActor::spawn(
                w,
                self.config.shaping,
                self.observation_space.clone(),
                build,
            ) {
                Ok((actor, ready)) => {
                    spawned.push(actor);
                    readies.push(ready);
                }
                Err(e) => {
                    failure = Some(DispatchError::ThreadSpawnFailed {
                        reason: e.to_string(),
                    });
                    break;
                }
            }
        }

        if failure.is_none() {
            for (actor, ready) in spawned.iter().zip(&readies) {
                let outcome = ready.recv().unwrap_or(Err(EnvError::WorkerLost));
                if let Err(error) = outcome {
                    failure = Some(DispatchError::ConstructionFailure {
                        worker: Some(actor.index()),
                        error,
                    });
                    break;
                }
            }
        }

        match failure {
            None => {
                self.workers = spawned;
                Ok(())
            }
            Some(e) => {
                warn!("worker start-up failed: {e}");
                for actor in &mut spawned {
                    actor.terminate();
                }
                for actor in &mut spawned {
                    actor.join();
                }
                Err(e)
            }
        }
    }

    /// Terminate every worker and release the pool.
    ///
    /// Threads that exit within `shutdown_grace` are joined; any still
    /// running a call are detached and exit once it returns. Idempotent:
    /// later calls return an all-zero report. Every other operation fails
    /// with [`DispatchError::Stopped`] afterwards.
    pub fn stop(&mut self) -> ShutdownReport {
        if self.stopped {
            return ShutdownReport::default();
        }
        self.stopped = true;
        let start = Instant::now();

        self.pending.clear();

        let mut workers_signalled = 0;
        for actor in &mut self.workers {
            if actor.terminate() {
                workers_signalled += 1;
            }
        }

        let deadline = start + self.config.shutdown_grace;
        while !self.workers.iter().all(|a| a.is_finished()) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }

        let mut workers_joined = 0;
        let mut workers_detached = 0;
        for actor in &mut self.workers {
            if actor.is_finished() {
                if actor.join() {
                    workers_joined += 1;
                } else {
                    warn!("worker {}: thread panicked", actor.index());
                }
            } else {
                warn!(
                    "worker {}: still busy after {:?}, detaching",
                    actor.index(),
                    self.config.shutdown_grace
                );
                actor.detach();
                workers_detached += 1;
            }
        }
        self.workers.clear();

        let total_ms = start.elapsed().as_millis() as u64;
        info!(
            "stopped {workers_signalled} workers in {total_ms}ms \
             ({workers_joined} joined, {workers_detached} detached)"
        );
        ShutdownReport {
            total_ms,
            workers_signalled,
            workers_joined,
            workers_detached,
        }
    }

    // ── Guards ───────────────────────────────────────────────────

    fn check_running(&self) -> Result<(), DispatchError> {
        if self.stopped {
            Err(DispatchError::Stopped)
        } else {
            Ok(())
        }
    }

    fn check_started(&self) -> Result<(), DispatchError> {
        if self.workers.is_empty() {
            Err(DispatchError::NotStarted)
        } else {
            Ok(())
        }
    }

    fn check_worker(&self, worker: WorkerIndex) -> Result<(), DispatchError> {
        if self.layout.contains_worker(worker) {
            Ok(())
        } else {
            Err(DispatchError::InvalidWorker {
                worker,
                num_workers: self.layout.num_workers(),
            })
        }
    }
}

impl<E: Env + 'static> Drop for VectorDispatcher<E> {
    fn drop(&mut self) {
        if !self.stopped {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecray_core::{Dtype, FieldBuffer, Info, Observation, Transition};

    /// Reward equals the action; observation is the env id.
    struct Echo {
        id: i64,
    }

    impl Env for Echo {
        fn observation_space(&self) -> ObsSpace {
            ObsSpace::single(&[1], Dtype::I64)
        }
        fn action_space(&self) -> ActionSpace {
            ActionSpace::Discrete { n: 100 }
        }
        fn reset(&mut self) -> Result<Observation, EnvError> {
            Ok(Observation::single(FieldBuffer::I64(vec![self.id])))
        }
        fn step(&mut self, action: &Action) -> Result<Transition, EnvError> {
            let Action::Discrete(a) = action else {
                return Err(EnvError::failed("discrete only"));
            };
            Ok(Transition {
                obs: Observation::single(FieldBuffer::I64(vec![self.id])),
                reward: *a as f32,
                done: false,
                info: Info::new(),
            })
        }
    }

    fn dispatcher(nw: usize, epw: usize) -> VectorDispatcher<Echo> {
        VectorDispatcher::new(
            |id: EnvId| Ok(Echo { id: id.0 as i64 }),
            DispatcherConfig::new(nw, epw),
        )
        .unwrap()
    }

    #[test]
    fn workers_start_on_first_poll() {
        let mut d = dispatcher(2, 2);
        assert_eq!(d.worker_state(WorkerIndex(0)), Ok(WorkerState::Uncreated));
        assert_eq!(d.send_actions(&[]), Err(DispatchError::NotStarted));
        let batch = d.poll().unwrap();
        assert_eq!(batch.len(), 4);
        assert_eq!(d.totals().resets_issued, 2);
    }

    #[test]
    fn reset_then_step_fills_every_slot() {
        let mut d = dispatcher(2, 3);
        let batch = d.reset().unwrap();
        assert_eq!(
            batch.observation("obs").unwrap().data(),
            &FieldBuffer::I64(vec![0, 1, 2, 3, 4, 5])
        );
        let actions: Vec<_> = (0..6).map(|i| Action::Discrete(10 + i)).collect();
        let batch = d.step(&actions).unwrap();
        assert_eq!(batch.rewards, vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        assert_eq!(d.totals().steps_issued, 2);
        assert_eq!(d.pending_count(), 0);
    }

    #[test]
    fn lockstep_calls_need_an_idle_pool() {
        let mut d = dispatcher(2, 1);
        assert_eq!(
            d.step(&[Action::Discrete(0), Action::Discrete(1)]),
            Err(DispatchError::NotStarted)
        );
        d.reset().unwrap();
        d.try_reset(WorkerIndex(0)).unwrap();
        assert!(matches!(
            d.reset(),
            Err(DispatchError::InvariantViolation { .. })
        ));
        assert!(matches!(
            d.step(&[Action::Discrete(0), Action::Discrete(1)]),
            Err(DispatchError::InvariantViolation { .. })
        ));
        d.poll().unwrap();
        let batch = d.reset().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(d.totals().resets_issued, 5);
    }

    #[test]
    fn worker_state_tracks_calls() {
        let mut d = dispatcher(1, 1);
        d.poll().unwrap();
        assert_eq!(d.worker_state(WorkerIndex(0)), Ok(WorkerState::Idle));
        d.try_reset(WorkerIndex(0)).unwrap();
        assert_eq!(d.worker_state(WorkerIndex(0)), Ok(WorkerState::AwaitingReset));
        d.poll().unwrap();
        d.send_actions(&[Action::Discrete(1)]).unwrap();
        assert_eq!(d.worker_state(WorkerIndex(0)), Ok(WorkerState::AwaitingStep));
        assert!(matches!(
            d.worker_state(WorkerIndex(3)),
            Err(DispatchError::InvalidWorker { .. })
        ));
        d.stop();
        assert_eq!(d.worker_state(WorkerIndex(0)), Ok(WorkerState::Terminated));
    }

    #[test]
    fn rejected_send_dispatches_nothing() {
        let mut d = dispatcher(2, 1);
        d.reset().unwrap();
        assert!(matches!(
            d.send_actions(&[Action::Discrete(0)]),
            Err(DispatchError::InvariantViolation { .. })
        ));
        assert_eq!(d.pending_count(), 0);
        assert_eq!(d.totals().steps_issued, 0);
    }

    #[test]
    fn stop_twice_reports_nothing_the_second_time() {
        let mut d = dispatcher(3, 1);
        d.poll().unwrap();
        let first = d.stop();
        assert_eq!(first.workers_signalled, 3);
        assert_eq!(first.workers_joined + first.workers_detached, 3);
        assert_eq!(d.stop(), ShutdownReport::default());
    }

    #[test]
    fn stop_before_start_is_a_no_op() {
        let mut d = dispatcher(2, 2);
        let report = d.stop();
        assert_eq!(report.workers_signalled, 0);
        assert_eq!(d.poll(), Err(DispatchError::Stopped));
    }

    #[test]
    fn empty_observation_space_is_rejected() {
        struct Blank;
        impl Env for Blank {
            fn observation_space(&self) -> ObsSpace {
                ObsSpace::dict(Vec::<(String, vecray_core::FieldSpec)>::new())
            }
            fn action_space(&self) -> ActionSpace {
                ActionSpace::Discrete { n: 1 }
            }
            fn reset(&mut self) -> Result<Observation, EnvError> {
                Ok(Observation::new())
            }
            fn step(&mut self, _: &Action) -> Result<Transition, EnvError> {
                Err(EnvError::failed("blank"))
            }
        }
        let result = VectorDispatcher::new(|_| Ok(Blank), DispatcherConfig::new(1, 1));
        assert!(matches!(
            result,
            Err(DispatchError::Config(ConfigError::EmptyObservationSpace))
        ));
    }

    #[test]
    fn memberless_action_space_is_rejected() {
        struct NoChoice;
        impl Env for NoChoice {
            fn observation_space(&self) -> ObsSpace {
                ObsSpace::single(&[1], Dtype::I64)
            }
            fn action_space(&self) -> ActionSpace {
                ActionSpace::Discrete { n: 0 }
            }
            fn reset(&mut self) -> Result<Observation, EnvError> {
                Ok(Observation::single(FieldBuffer::I64(vec![0])))
            }
            fn step(&mut self, _: &Action) -> Result<Transition, EnvError> {
                Err(EnvError::failed("no choice"))
            }
        }
        let result = VectorDispatcher::new(|_| Ok(NoChoice), DispatcherConfig::new(1, 1));
        assert!(matches!(
            result,
            Err(DispatchError::Config(ConfigError::InvalidActionSpace))
        ));
    }
}
