//! Fixed-layout result buffer and the caller-facing [`Batch`] snapshot.
//!
//! The buffer is allocated once from the observation space and reused in
//! place for the dispatcher's lifetime. A worker's result overwrites
//! exactly its own slot range; every other slot keeps whatever it held
//! before (stale, never zeroed). Callers only ever see deep copies.

use std::ops::Range;

use indexmap::IndexMap;

use vecray_core::{
    BatchResult, EnvError, FieldBuffer, FieldSpec, Info, Layout, ObsSpace, Shape, WorkerIndex,
};

/// One observation field across the whole batch, shape `[total, *field]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ObsArray {
    shape: Shape,
    data: FieldBuffer,
}

impl ObsArray {
    fn zeros(rows: usize, spec: &FieldSpec) -> Self {
        let mut shape = Shape::with_capacity(spec.shape.len() + 1);
        shape.push(rows);
        shape.extend_from_slice(&spec.shape);
        Self {
            data: FieldBuffer::zeros(spec.dtype, rows * spec.num_elements()),
            shape,
        }
    }

    /// Full shape including the leading batch dimension.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flattened row-major data.
    pub fn data(&self) -> &FieldBuffer {
        &self.data
    }

    /// Elements per row.
    pub fn row_len(&self) -> usize {
        self.shape[1..].iter().product()
    }

    /// Owned copy of row `i`. Panics if out of range.
    pub fn row(&self, i: usize) -> FieldBuffer {
        let n = self.row_len();
        self.data.slice(i * n, n)
    }

    fn rows(&self, range: Range<usize>) -> Self {
        let n = self.row_len();
        let mut shape = self.shape.clone();
        shape[0] = range.len();
        Self {
            data: self.data.slice(range.start * n, range.len() * n),
            shape,
        }
    }
}

/// A full-width copy of the result buffer, as returned by `poll()`.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    /// Observation fields in space declaration order.
    pub observations: IndexMap<String, ObsArray>,
    /// Per-environment rewards.
    pub rewards: Vec<f32>,
    /// Per-environment episode-end flags.
    pub dones: Vec<bool>,
    /// Per-environment metadata.
    pub infos: Vec<Info>,
}

impl Batch {
    /// Number of environments.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// True if the batch holds no environments.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// One observation field.
    pub fn observation(&self, key: &str) -> Option<&ObsArray> {
        self.observations.get(key)
    }

    /// Copy of the rows in `range`, across every column.
    ///
    /// # Panics
    ///
    /// Panics if `range` extends past [`len`](Self::len).
    pub fn rows(&self, range: Range<usize>) -> Batch {
        Batch {
            observations: self
                .observations
                .iter()
                .map(|(k, v)| (k.clone(), v.rows(range.clone())))
                .collect(),
            rewards: self.rewards[range.clone()].to_vec(),
            dones: self.dones[range.clone()].to_vec(),
            infos: self.infos[range].to_vec(),
        }
    }
}

/// Dispatcher-owned result storage, addressed by flat batch index.
pub struct ResultBuffer {
    layout: Layout,
    space: ObsSpace,
    observations: IndexMap<String, ObsArray>,
    rewards: Vec<f32>,
    dones: Vec<bool>,
    infos: Vec<Info>,
}

impl ResultBuffer {
    /// Allocate a zeroed buffer for `layout` with fields from `space`.
    pub fn new(layout: Layout, space: ObsSpace) -> Self {
        let total = layout.total_envs();
        let observations = space
            .iter()
            .map(|(key, spec)| (key.to_string(), ObsArray::zeros(total, spec)))
            .collect();
        Self {
            layout,
            space,
            observations,
            rewards: vec![0.0; total],
            dones: vec![false; total],
            infos: vec![Info::new(); total],
        }
    }

    /// Overwrite `worker`'s slot range with `result`.
    ///
    /// The whole result is validated against the batch width and the
    /// observation space first; on error nothing is written.
    pub fn write_worker(
        &mut self,
        worker: WorkerIndex,
        result: &BatchResult,
    ) -> Result<(), EnvError> {
        let expected = self.layout.env_per_worker();
        let n = result.checked_len()?;
        if n != expected {
            return Err(EnvError::ShapeMismatch {
                reason: format!("worker returned {n} results, expected {expected}"),
            });
        }
        for (slot, obs) in result.observations.iter().enumerate() {
            self.space.check(obs).map_err(|e| match e {
                EnvError::ShapeMismatch { reason } => EnvError::ShapeMismatch {
                    reason: format!("slot {slot}: {reason}"),
                },
                other => other,
            })?;
        }

        let range = self.layout.slot_range(worker);
        for (slot, obs) in result.observations.iter().enumerate() {
            let row = range.start + slot;
            for (key, column) in self.observations.iter_mut() {
                let src = obs.get(key).ok_or_else(|| EnvError::ShapeMismatch {
                    reason: format!("slot {slot}: missing field '{key}'"),
                })?;
                let offset = row * column.row_len();
                column.data.write_at(offset, src)?;
            }
        }
        self.rewards[range.clone()].copy_from_slice(&result.rewards);
        self.dones[range.clone()].copy_from_slice(&result.dones);
        self.infos[range].clone_from_slice(&result.infos);
        Ok(())
    }

    /// Deep copy of the whole buffer.
    pub fn snapshot(&self) -> Batch {
        Batch {
            observations: self.observations.clone(),
            rewards: self.rewards.clone(),
            dones: self.dones.clone(),
            infos: self.infos.clone(),
        }
    }

    /// Batch layout this buffer was sized for.
    pub fn layout(&self) -> Layout {
        self.layout
    }
}
