//! Per-environment values exchanged with environments and workers.

use indexmap::IndexMap;

use crate::error::EnvError;
use crate::space::{Dtype, DEFAULT_OBS_KEY};

/// A flat, typed run of observation elements.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldBuffer {
    /// 32-bit floats.
    F32(Vec<f32>),
    /// 64-bit signed integers.
    I64(Vec<i64>),
    /// Unsigned bytes.
    U8(Vec<u8>),
    /// Booleans.
    Bool(Vec<bool>),
}

impl FieldBuffer {
    /// A zero-filled (false-filled) buffer of `len` elements.
    pub fn zeros(dtype: Dtype, len: usize) -> Self {
        match dtype {
            Dtype::F32 => Self::F32(vec![0.0; len]),
            Dtype::I64 => Self::I64(vec![0; len]),
            Dtype::U8 => Self::U8(vec![0; len]),
            Dtype::Bool => Self::Bool(vec![false; len]),
        }
    }

    /// Element type of this buffer.
    pub fn dtype(&self) -> Dtype {
        match self {
            Self::F32(_) => Dtype::F32,
            Self::I64(_) => Dtype::I64,
            Self::U8(_) => Dtype::U8,
            Self::Bool(_) => Dtype::Bool,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::F32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::U8(v) => v.len(),
            Self::Bool(v) => v.len(),
        }
    }

    /// True if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite `self[offset..offset + src.len()]` with `src`.
    ///
    /// Fails without writing if the element types differ or the
    /// destination range is out of bounds.
    pub fn write_at(&mut self, offset: usize, src: &FieldBuffer) -> Result<(), EnvError> {
        let end = offset
            .checked_add(src.len())
            .filter(|end| *end <= self.len())
            .ok_or_else(|| EnvError::ShapeMismatch {
                reason: format!(
                    "write of {} elements at offset {offset} exceeds buffer of {}",
                    src.len(),
                    self.len()
                ),
            })?;
        match (self, src) {
            (Self::F32(dst), Self::F32(s)) => dst[offset..end].copy_from_slice(s),
            (Self::I64(dst), Self::I64(s)) => dst[offset..end].copy_from_slice(s),
            (Self::U8(dst), Self::U8(s)) => dst[offset..end].copy_from_slice(s),
            (Self::Bool(dst), Self::Bool(s)) => dst[offset..end].copy_from_slice(s),
            (dst, s) => {
                return Err(EnvError::ShapeMismatch {
                    reason: format!("cannot write {:?} into {:?}", s.dtype(), dst.dtype()),
                })
            }
        }
        Ok(())
    }

    /// Owned copy of `self[start..start + len]`. Panics if out of bounds.
    pub fn slice(&self, start: usize, len: usize) -> FieldBuffer {
        let r = start..start + len;
        match self {
            Self::F32(v) => Self::F32(v[r].to_vec()),
            Self::I64(v) => Self::I64(v[r].to_vec()),
            Self::U8(v) => Self::U8(v[r].to_vec()),
            Self::Bool(v) => Self::Bool(v[r].to_vec()),
        }
    }

    /// Borrow as `f32` elements, if that is the element type.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            Self::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as `i64` elements, if that is the element type.
    pub fn as_i64(&self) -> Option<&[i64]> {
        match self {
            Self::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as bytes, if that is the element type.
    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            Self::U8(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as booleans, if that is the element type.
    pub fn as_bool(&self) -> Option<&[bool]> {
        match self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }
}

/// One environment's observation, keyed by field name.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Observation {
    fields: IndexMap<String, FieldBuffer>,
}

impl Observation {
    /// An empty observation.
    pub fn new() -> Self {
        Self::default()
    }

    /// A non-dictionary observation under [`DEFAULT_OBS_KEY`].
    pub fn single(buf: FieldBuffer) -> Self {
        let mut obs = Self::new();
        obs.insert(DEFAULT_OBS_KEY, buf);
        obs
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, key: impl Into<String>, buf: FieldBuffer) {
        self.fields.insert(key.into(), buf);
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&FieldBuffer> {
        self.fields.get(key)
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldBuffer)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the observation has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// An action for one environment.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Index into a discrete action space.
    Discrete(i64),
    /// Continuous action vector.
    Continuous(Vec<f32>),
}

/// Opaque per-environment metadata returned alongside a transition.
pub type Info = IndexMap<String, InfoValue>;

/// A single metadata value.
#[derive(Clone, Debug, PartialEq)]
pub enum InfoValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// Free text.
    Text(String),
    /// Nested metadata (per-agent entries in multi-agent results).
    Map(Info),
}

/// Result of stepping one environment once.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// Observation after the step (after auto-reset if `done`).
    pub obs: Observation,
    /// Reward for the step.
    pub reward: f32,
    /// Whether the episode ended on this step.
    pub done: bool,
    /// Environment-defined metadata.
    pub info: Info,
}

/// Results for every environment owned by one worker, in local-slot order.
///
/// All four vectors have length `env_per_worker`.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct BatchResult {
    /// Observations.
    pub observations: Vec<Observation>,
    /// Rewards.
    pub rewards: Vec<f32>,
    /// Episode-end flags.
    pub dones: Vec<bool>,
    /// Metadata.
    pub infos: Vec<Info>,
}

impl BatchResult {
    /// Pre-allocate for `n` environments.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            observations: Vec::with_capacity(n),
            rewards: Vec::with_capacity(n),
            dones: Vec::with_capacity(n),
            infos: Vec::with_capacity(n),
        }
    }

    /// Append one transition.
    pub fn push(&mut self, t: Transition) {
        self.observations.push(t.obs);
        self.rewards.push(t.reward);
        self.dones.push(t.done);
        self.infos.push(t.info);
    }

    /// Number of environments, or an error if the four columns disagree.
    pub fn checked_len(&self) -> Result<usize, EnvError> {
        let n = self.observations.len();
        if self.rewards.len() != n || self.dones.len() != n || self.infos.len() != n {
            return Err(EnvError::ShapeMismatch {
                reason: format!(
                    "ragged batch: {} observations, {} rewards, {} dones, {} infos",
                    n,
                    self.rewards.len(),
                    self.dones.len(),
                    self.infos.len()
                ),
            });
        }
        Ok(n)
    }
}
