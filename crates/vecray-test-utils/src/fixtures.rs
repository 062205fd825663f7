//! Reusable environment fixtures.
//!
//! - [`CounterEnv`]: reward equals the action, episode ends every N steps.
//! - [`FailingEnv`]: a counter that errors or panics on a chosen step.
//! - [`GatedEnv`]: a counter whose steps block until a [`Gate`] lets them.
//! - [`RandomEnv`]: ChaCha-seeded observations and rewards.
//! - [`TwoAgentEnv`]: dict observation keyed by agent id.

use crossbeam_channel::{Receiver, Sender};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use vecray_core::{
    Action, ActionSpace, Dtype, Env, EnvError, EnvId, FieldBuffer, FieldSpec, Info, InfoValue,
    ObsSpace, Observation, Shape, Transition,
};

/// Discrete choices accepted by the counter fixtures.
pub const COUNTER_ACTIONS: u64 = 1024;

fn discrete_reward(action: &Action) -> Result<f32, EnvError> {
    match action {
        Action::Discrete(a) => Ok(*a as f32),
        other => Err(EnvError::InvalidAction {
            reason: format!("expected discrete action, got {other:?}"),
        }),
    }
}

// ── CounterEnv ───────────────────────────────────────────────────

/// Observation `[env_id, steps_this_episode]`; reward equals the action;
/// `done` every `episode_len` steps.
pub struct CounterEnv {
    pub id: EnvId,
    pub episode_len: u64,
    steps: u64,
}

impl CounterEnv {
    pub fn new(id: EnvId, episode_len: u64) -> Self {
        Self {
            id,
            episode_len: episode_len.max(1),
            steps: 0,
        }
    }

    fn obs(&self) -> Observation {
        Observation::single(FieldBuffer::F32(vec![self.id.0 as f32, self.steps as f32]))
    }
}

impl Env for CounterEnv {
    fn observation_space(&self) -> ObsSpace {
        ObsSpace::single(&[2], Dtype::F32)
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete {
            n: COUNTER_ACTIONS,
        }
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        self.steps = 0;
        Ok(self.obs())
    }

    fn step(&mut self, action: &Action) -> Result<Transition, EnvError> {
        let reward = discrete_reward(action)?;
        self.steps += 1;
        let done = self.steps % self.episode_len == 0;
        let mut info = Info::new();
        info.insert("steps".into(), InfoValue::Int(self.steps as i64));
        Ok(Transition {
            obs: self.obs(),
            reward,
            done,
            info,
        })
    }
}

// ── FailingEnv ───────────────────────────────────────────────────

/// How a [`FailingEnv`] fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailMode {
    /// Return `EnvError::Failed`.
    Error,
    /// Panic, killing the worker thread.
    Panic,
}

/// A [`CounterEnv`] that fails on its `fail_on_step`-th step (1-based,
/// counted across episodes).
pub struct FailingEnv {
    inner: CounterEnv,
    fail_on_step: Option<u64>,
    mode: FailMode,
    total_steps: u64,
}

impl FailingEnv {
    pub fn new(id: EnvId, fail_on_step: Option<u64>, mode: FailMode) -> Self {
        Self {
            inner: CounterEnv::new(id, u64::MAX),
            fail_on_step,
            mode,
            total_steps: 0,
        }
    }
}

impl Env for FailingEnv {
    fn observation_space(&self) -> ObsSpace {
        self.inner.observation_space()
    }

    fn action_space(&self) -> ActionSpace {
        self.inner.action_space()
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        self.inner.reset()
    }

    fn step(&mut self, action: &Action) -> Result<Transition, EnvError> {
        self.total_steps += 1;
        if Some(self.total_steps) == self.fail_on_step {
            let reason = format!("env {} failed on step {}", self.inner.id, self.total_steps);
            match self.mode {
                FailMode::Error => return Err(EnvError::failed(reason)),
                FailMode::Panic => panic!("{reason}"),
            }
        }
        self.inner.step(action)
    }
}

// ── GatedEnv ─────────────────────────────────────────────────────

/// Step permits for the [`GatedEnv`]s of one worker.
///
/// Each step consumes one permit. Dropping the gate opens it for good.
pub struct Gate {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Gate {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    /// Allow `n` more steps through.
    pub fn pass(&self, n: usize) {
        for _ in 0..n {
            let _ = self.tx.send(());
        }
    }

    pub fn receiver(&self) -> Receiver<()> {
        self.rx.clone()
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`CounterEnv`] that blocks in `step` until its gate yields a permit.
pub struct GatedEnv {
    inner: CounterEnv,
    gate: Receiver<()>,
}

impl GatedEnv {
    pub fn new(id: EnvId, episode_len: u64, gate: Receiver<()>) -> Self {
        Self {
            inner: CounterEnv::new(id, episode_len),
            gate,
        }
    }
}

impl Env for GatedEnv {
    fn observation_space(&self) -> ObsSpace {
        self.inner.observation_space()
    }

    fn action_space(&self) -> ActionSpace {
        self.inner.action_space()
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        self.inner.reset()
    }

    fn step(&mut self, action: &Action) -> Result<Transition, EnvError> {
        // Err means every sender is gone: the gate is open.
        let _ = self.gate.recv();
        self.inner.step(action)
    }
}

// ── RandomEnv ────────────────────────────────────────────────────

/// Observation of 3 floats, reward in `[0, 1)`, episode ends with
/// probability `done_prob` per step. Seeded from the env id.
pub struct RandomEnv {
    rng: ChaCha8Rng,
    done_prob: f64,
}

impl RandomEnv {
    pub fn new(id: EnvId, done_prob: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(id.0 as u64),
            done_prob: done_prob.clamp(0.0, 1.0),
        }
    }

    fn obs(&mut self) -> Observation {
        let v = (0..3).map(|_| self.rng.random::<f32>()).collect();
        Observation::single(FieldBuffer::F32(v))
    }
}

impl Env for RandomEnv {
    fn observation_space(&self) -> ObsSpace {
        ObsSpace::single(&[3], Dtype::F32)
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Box {
            shape: Shape::from_slice(&[2]),
            low: -1.0,
            high: 1.0,
        }
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        Ok(self.obs())
    }

    fn step(&mut self, _action: &Action) -> Result<Transition, EnvError> {
        let reward = self.rng.random::<f32>();
        let done = self.rng.random_bool(self.done_prob);
        Ok(Transition {
            obs: self.obs(),
            reward,
            done,
            info: Info::new(),
        })
    }
}

// ── TwoAgentEnv ──────────────────────────────────────────────────

/// Two agents, `agent_0` and `agent_1`, each observing `[env_id, step]`.
/// Reward equals the action; `done` (all agents) every `episode_len` steps.
pub struct TwoAgentEnv {
    inner: CounterEnv,
}

impl TwoAgentEnv {
    pub const AGENTS: [&'static str; 2] = ["agent_0", "agent_1"];

    pub fn new(id: EnvId, episode_len: u64) -> Self {
        Self {
            inner: CounterEnv::new(id, episode_len),
        }
    }

    fn split(single: Observation) -> Observation {
        let mut obs = Observation::new();
        if let Some(buf) = single.get(vecray_core::DEFAULT_OBS_KEY) {
            for agent in Self::AGENTS {
                obs.insert(agent, buf.clone());
            }
        }
        obs
    }
}

impl Env for TwoAgentEnv {
    fn observation_space(&self) -> ObsSpace {
        ObsSpace::dict(
            Self::AGENTS.map(|agent| (agent, FieldSpec::new(&[2], Dtype::F32))),
        )
    }

    fn action_space(&self) -> ActionSpace {
        self.inner.action_space()
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        self.inner.reset().map(Self::split)
    }

    fn step(&mut self, action: &Action) -> Result<Transition, EnvError> {
        let t = self.inner.step(action)?;
        Ok(Transition {
            obs: Self::split(t.obs),
            ..t
        })
    }
}

// ── Factories ────────────────────────────────────────────────────

/// Factory of [`CounterEnv`]s.
pub fn counter_factory(
    episode_len: u64,
) -> impl Fn(EnvId) -> Result<CounterEnv, EnvError> + Send + Sync + 'static {
    move |id| Ok(CounterEnv::new(id, episode_len))
}

/// Factory where only `failing` fails, on its `on_step`-th step.
pub fn failing_factory(
    failing: EnvId,
    on_step: u64,
    mode: FailMode,
) -> impl Fn(EnvId) -> Result<FailingEnv, EnvError> + Send + Sync + 'static {
    move |id| {
        let fail = (id == failing).then_some(on_step);
        Ok(FailingEnv::new(id, fail, mode))
    }
}

/// Factory of [`GatedEnv`]s, one gate per worker. Environment `id` is
/// gated by `gates[id / env_per_worker]`; ids past the last gate use the
/// last one.
pub fn gated_factory(
    gates: &[Gate],
    env_per_worker: usize,
    episode_len: u64,
) -> impl Fn(EnvId) -> Result<GatedEnv, EnvError> + Send + Sync + 'static {
    let receivers: Vec<Receiver<()>> = gates.iter().map(Gate::receiver).collect();
    let per = env_per_worker.max(1);
    move |id| {
        let gate = receivers
            .get(id.0 / per)
            .or_else(|| receivers.last())
            .cloned()
            .ok_or_else(|| EnvError::failed("gated_factory needs at least one gate"))?;
        Ok(GatedEnv::new(id, episode_len, gate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_episode_wraps() {
        let mut env = CounterEnv::new(EnvId(3), 2);
        env.reset().unwrap();
        assert!(!env.step(&Action::Discrete(5)).unwrap().done);
        let t = env.step(&Action::Discrete(7)).unwrap();
        assert!(t.done);
        assert_eq!(t.reward, 7.0);
        assert_eq!(t.obs.get("obs"), Some(&FieldBuffer::F32(vec![3.0, 2.0])));
    }

    #[test]
    fn failing_env_fails_once_on_schedule() {
        let mut env = FailingEnv::new(EnvId(0), Some(2), FailMode::Error);
        assert!(env.step(&Action::Discrete(0)).is_ok());
        assert!(env.step(&Action::Discrete(0)).is_err());
        assert!(env.step(&Action::Discrete(0)).is_ok());
    }

    #[test]
    fn random_env_is_seeded_by_id() {
        let mut a = RandomEnv::new(EnvId(4), 0.5);
        let mut b = RandomEnv::new(EnvId(4), 0.5);
        assert_eq!(a.reset().unwrap(), b.reset().unwrap());
        let action = Action::Continuous(vec![0.0, 0.0]);
        assert_eq!(a.step(&action).unwrap(), b.step(&action).unwrap());
    }

    #[test]
    fn two_agent_obs_matches_space() {
        let mut env = TwoAgentEnv::new(EnvId(1), 3);
        let obs = env.reset().unwrap();
        assert!(env.observation_space().check(&obs).is_ok());
    }

    #[test]
    fn gate_permits_steps() {
        let gate = Gate::new();
        let mut env = GatedEnv::new(EnvId(0), 10, gate.receiver());
        gate.pass(1);
        assert!(env.step(&Action::Discrete(1)).is_ok());
        assert!(gate.receiver().is_empty());
    }
}
