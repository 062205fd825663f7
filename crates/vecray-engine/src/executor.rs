//! Default local executor: steps a worker's environments one after
//! another on the worker thread.

use vecray_core::{
    Action, ActionSpace, BatchResult, Env, EnvError, EnvId, Info, LocalExecutor, Transition,
};

/// Runs `N` environments sequentially, auto-resetting any that finish.
pub struct SequentialExecutor<E: Env> {
    envs: Vec<E>,
    action_space: ActionSpace,
}

impl<E: Env> SequentialExecutor<E> {
    /// Build one environment per id via `make_env`.
    ///
    /// # Errors
    ///
    /// Returns the first factory failure, or [`EnvError::Failed`] if
    /// `ids` is empty.
    pub fn build<F>(make_env: F, ids: impl IntoIterator<Item = EnvId>) -> Result<Self, EnvError>
    where
        F: Fn(EnvId) -> Result<E, EnvError>,
    {
        let envs = ids
            .into_iter()
            .map(&make_env)
            .collect::<Result<Vec<_>, _>>()?;
        let action_space = envs
            .first()
            .map(|e| e.action_space())
            .ok_or_else(|| EnvError::failed("executor needs at least one environment"))?;
        Ok(Self { envs, action_space })
    }
}

impl<E: Env> LocalExecutor for SequentialExecutor<E> {
    fn num_envs(&self) -> usize {
        self.envs.len()
    }

    fn reset(&mut self) -> Result<BatchResult, EnvError> {
        let mut batch = BatchResult::with_capacity(self.envs.len());
        for env in &mut self.envs {
            batch.push(Transition {
                obs: env.reset()?,
                reward: 0.0,
                done: false,
                info: Info::new(),
            });
        }
        Ok(batch)
    }

    fn step(&mut self, actions: &[Action]) -> Result<BatchResult, EnvError> {
        if actions.len() != self.envs.len() {
            return Err(EnvError::InvalidAction {
                reason: format!(
                    "{} actions for {} environments",
                    actions.len(),
                    self.envs.len()
                ),
            });
        }
        let mut batch = BatchResult::with_capacity(self.envs.len());
        for (slot, (env, action)) in self.envs.iter_mut().zip(actions).enumerate() {
            if !self.action_space.contains(action) {
                return Err(EnvError::InvalidAction {
                    reason: format!("slot {slot}: {action:?} not in {:?}", self.action_space),
                });
            }
            let mut t = env.step(action)?;
            if t.done {
                t.obs = env.reset()?;
            }
            batch.push(t);
        }
        Ok(batch)
    }
}
