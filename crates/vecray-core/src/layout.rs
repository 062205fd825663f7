//! Mapping between flat batch indices and `(worker, local slot)` addresses.

use std::ops::Range;

use crate::id::{EnvId, WorkerIndex};

/// Shape of a worker pool: `num_workers` workers, each owning
/// `env_per_worker` environments.
///
/// All addressing goes through this type so that the invariant
/// `batch_index = worker * env_per_worker + local_slot` lives in one place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    num_workers: usize,
    env_per_worker: usize,
}

impl Layout {
    /// Create a layout. Returns `None` if either dimension is zero or
    /// the total overflows `usize`.
    pub fn new(num_workers: usize, env_per_worker: usize) -> Option<Self> {
        if num_workers == 0 || env_per_worker == 0 {
            return None;
        }
        num_workers.checked_mul(env_per_worker)?;
        Some(Self {
            num_workers,
            env_per_worker,
        })
    }

    /// Number of workers.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Environments owned by each worker.
    pub fn env_per_worker(&self) -> usize {
        self.env_per_worker
    }

    /// Total environments across the pool.
    pub fn total_envs(&self) -> usize {
        self.num_workers * self.env_per_worker
    }

    /// Iterate over every worker index in order.
    pub fn workers(&self) -> impl Iterator<Item = WorkerIndex> {
        (0..self.num_workers).map(WorkerIndex)
    }

    /// Whether `worker` addresses a worker in this layout.
    pub fn contains_worker(&self, worker: WorkerIndex) -> bool {
        worker.0 < self.num_workers
    }

    /// Flat batch range owned by `worker`.
    pub fn slot_range(&self, worker: WorkerIndex) -> Range<usize> {
        let start = worker.0 * self.env_per_worker;
        start..start + self.env_per_worker
    }

    /// Global id of `local_slot` on `worker`. `None` if either is out of
    /// range.
    pub fn env_id(&self, worker: WorkerIndex, local_slot: usize) -> Option<EnvId> {
        if !self.contains_worker(worker) || local_slot >= self.env_per_worker {
            return None;
        }
        Some(EnvId(worker.0 * self.env_per_worker + local_slot))
    }

    /// Inverse of [`env_id`](Self::env_id). `None` if out of range.
    pub fn locate(&self, env: EnvId) -> Option<(WorkerIndex, usize)> {
        if env.0 >= self.total_envs() {
            return None;
        }
        Some((
            WorkerIndex(env.0 / self.env_per_worker),
            env.0 % self.env_per_worker,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_zero_dimensions() {
        assert!(Layout::new(0, 4).is_none());
        assert!(Layout::new(4, 0).is_none());
        assert!(Layout::new(usize::MAX, 2).is_none());
    }

    #[test]
    fn four_by_two_ranges() {
        let layout = Layout::new(4, 2).unwrap();
        assert_eq!(layout.total_envs(), 8);
        assert_eq!(layout.slot_range(WorkerIndex(0)), 0..2);
        assert_eq!(layout.slot_range(WorkerIndex(3)), 6..8);
        assert_eq!(layout.locate(EnvId(5)), Some((WorkerIndex(2), 1)));
        assert_eq!(layout.locate(EnvId(8)), None);
    }

    #[test]
    fn env_id_rejects_out_of_range_addresses() {
        let layout = Layout::new(4, 2).unwrap();
        assert_eq!(layout.env_id(WorkerIndex(1), 1), Some(EnvId(3)));
        assert_eq!(layout.env_id(WorkerIndex(1), 2), None);
        assert_eq!(layout.env_id(WorkerIndex(4), 0), None);
    }

    #[test]
    fn ranges_tile_the_batch() {
        let layout = Layout::new(5, 3).unwrap();
        let mut next = 0;
        for w in layout.workers() {
            let r = layout.slot_range(w);
            assert_eq!(r.start, next);
            next = r.end;
        }
        assert_eq!(next, layout.total_envs());
    }

    proptest! {
        #[test]
        fn env_id_and_locate_agree(
            workers in 1usize..64,
            per in 1usize..64,
            w_seed in any::<usize>(),
            s_seed in any::<usize>(),
        ) {
            let layout = Layout::new(workers, per).unwrap();
            let w = WorkerIndex(w_seed % workers);
            let s = s_seed % per;
            let id = layout.env_id(w, s).unwrap();
            prop_assert_eq!(layout.locate(id), Some((w, s)));
            prop_assert!(layout.slot_range(w).contains(&id.0));
        }
    }
}
