//! Static observation and action space descriptors.
//!
//! An [`ObsSpace`] is derived once from a probe environment and never
//! changes for a dispatcher's lifetime. It fixes the set of observation
//! keys, each key's per-environment shape, and its element type, which
//! in turn fixes the layout of the result buffer.

use indexmap::IndexMap;
use rand::Rng;
use smallvec::SmallVec;

use crate::error::EnvError;
use crate::value::{Action, Observation};

/// Key used for observation spaces that are not dictionaries.
pub const DEFAULT_OBS_KEY: &str = "obs";

/// Per-field shape. Most observation fields have rank 4 or less.
pub type Shape = SmallVec<[usize; 4]>;

/// Element type of an observation field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dtype {
    /// 32-bit float.
    F32,
    /// 64-bit signed integer.
    I64,
    /// Unsigned byte (images, bitmaps).
    U8,
    /// Boolean flag.
    Bool,
}

/// Shape and element type of one observation field, per environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// Per-environment shape (excludes the batch dimension).
    pub shape: Shape,
    /// Element type.
    pub dtype: Dtype,
}

impl FieldSpec {
    /// Create a field spec.
    pub fn new(shape: &[usize], dtype: Dtype) -> Self {
        Self {
            shape: Shape::from_slice(shape),
            dtype,
        }
    }

    /// Number of elements per environment. A rank-0 shape is a scalar.
    pub fn num_elements(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Ordered set of observation fields.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ObsSpace {
    fields: IndexMap<String, FieldSpec>,
}

impl ObsSpace {
    /// A non-dictionary space with one field under [`DEFAULT_OBS_KEY`].
    pub fn single(shape: &[usize], dtype: Dtype) -> Self {
        let mut fields = IndexMap::new();
        fields.insert(DEFAULT_OBS_KEY.to_string(), FieldSpec::new(shape, dtype));
        Self { fields }
    }

    /// A dictionary space. Field order is preserved.
    pub fn dict<K: Into<String>>(fields: impl IntoIterator<Item = (K, FieldSpec)>) -> Self {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Field keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterate `(key, spec)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up one field.
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.get(key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the space declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check that `obs` carries exactly the declared keys with matching
    /// element types and element counts.
    pub fn check(&self, obs: &Observation) -> Result<(), EnvError> {
        if obs.len() != self.fields.len() {
            return Err(EnvError::ShapeMismatch {
                reason: format!(
                    "observation has {} fields, space declares {}",
                    obs.len(),
                    self.fields.len()
                ),
            });
        }
        for (key, spec) in &self.fields {
            let buf = obs.get(key).ok_or_else(|| EnvError::ShapeMismatch {
                reason: format!("observation is missing field '{key}'"),
            })?;
            if buf.dtype() != spec.dtype {
                return Err(EnvError::ShapeMismatch {
                    reason: format!(
                        "field '{key}': dtype {:?}, expected {:?}",
                        buf.dtype(),
                        spec.dtype
                    ),
                });
            }
            if buf.len() != spec.num_elements() {
                return Err(EnvError::ShapeMismatch {
                    reason: format!(
                        "field '{key}': {} elements, expected {}",
                        buf.len(),
                        spec.num_elements()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Declared action space of an environment.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionSpace {
    /// One of `n` discrete choices, `0..n`.
    Discrete {
        /// Number of choices.
        n: u64,
    },
    /// A continuous vector bounded element-wise by `[low, high]`.
    Box {
        /// Action shape.
        shape: Shape,
        /// Lower bound for every element.
        low: f32,
        /// Upper bound for every element.
        high: f32,
    },
}

impl ActionSpace {
    /// Whether `action` is a member of this space.
    pub fn contains(&self, action: &Action) -> bool {
        match (self, action) {
            (Self::Discrete { n }, Action::Discrete(a)) => *a >= 0 && (*a as u64) < *n,
            (Self::Box { shape, low, high }, Action::Continuous(v)) => {
                v.len() == shape.iter().product::<usize>()
                    && v.iter().all(|x| *x >= *low && *x <= *high)
            }
            _ => false,
        }
    }

    /// Whether the space has members: `n > 0` for `Discrete`, finite
    /// bounds with `low <= high` for `Box`.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Discrete { n } => *n > 0,
            Self::Box { low, high, .. } => low.is_finite() && high.is_finite() && low <= high,
        }
    }

    /// Draw a uniformly random member of this space, or `None` if it has
    /// none (see [`is_valid`](Self::is_valid)).
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Action> {
        if !self.is_valid() {
            return None;
        }
        Some(match self {
            Self::Discrete { n } => Action::Discrete(rng.random_range(0..*n) as i64),
            Self::Box { shape, low, high } => {
                let len = shape.iter().product::<usize>();
                Action::Continuous(
                    (0..len)
                        .map(|_| rng.random_range(*low..=*high))
                        .collect(),
                )
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldBuffer;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn single_space_uses_default_key() {
        let space = ObsSpace::single(&[4], Dtype::F32);
        assert_eq!(space.keys().collect::<Vec<_>>(), vec![DEFAULT_OBS_KEY]);
        assert_eq!(space.field(DEFAULT_OBS_KEY).unwrap().num_elements(), 4);
    }

    #[test]
    fn scalar_field_has_one_element() {
        assert_eq!(FieldSpec::new(&[], Dtype::I64).num_elements(), 1);
        assert_eq!(FieldSpec::new(&[2, 3], Dtype::U8).num_elements(), 6);
    }

    #[test]
    fn dict_preserves_order() {
        let space = ObsSpace::dict([
            ("pos", FieldSpec::new(&[2], Dtype::F32)),
            ("alive", FieldSpec::new(&[], Dtype::Bool)),
        ]);
        assert_eq!(space.keys().collect::<Vec<_>>(), vec!["pos", "alive"]);
    }

    #[test]
    fn check_reports_dtype_and_length() {
        let space = ObsSpace::single(&[2], Dtype::F32);
        assert!(space
            .check(&Observation::single(FieldBuffer::F32(vec![0.0, 1.0])))
            .is_ok());
        assert!(matches!(
            space.check(&Observation::single(FieldBuffer::I64(vec![0, 1]))),
            Err(EnvError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            space.check(&Observation::single(FieldBuffer::F32(vec![0.0]))),
            Err(EnvError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn check_reports_missing_key() {
        let space = ObsSpace::dict([("a", FieldSpec::new(&[1], Dtype::F32))]);
        let mut obs = Observation::new();
        obs.insert("b", FieldBuffer::F32(vec![0.0]));
        assert!(space.check(&obs).is_err());
    }

    #[test]
    fn samples_are_members() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let discrete = ActionSpace::Discrete { n: 3 };
        let boxed = ActionSpace::Box {
            shape: Shape::from_slice(&[2]),
            low: -1.0,
            high: 1.0,
        };
        for _ in 0..100 {
            assert!(discrete.contains(&discrete.sample(&mut rng).unwrap()));
            assert!(boxed.contains(&boxed.sample(&mut rng).unwrap()));
        }
        assert!(!discrete.contains(&Action::Discrete(3)));
        assert!(!discrete.contains(&Action::Continuous(vec![0.0])));
    }

    #[test]
    fn memberless_spaces_sample_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let empty = ActionSpace::Discrete { n: 0 };
        let inverted = ActionSpace::Box {
            shape: Shape::from_slice(&[2]),
            low: 1.0,
            high: -1.0,
        };
        let unbounded = ActionSpace::Box {
            shape: Shape::from_slice(&[1]),
            low: f32::NAN,
            high: 1.0,
        };
        for space in [&empty, &inverted, &unbounded] {
            assert!(!space.is_valid());
            assert_eq!(space.sample(&mut rng), None);
        }
        let point = ActionSpace::Box {
            shape: Shape::from_slice(&[1]),
            low: 0.5,
            high: 0.5,
        };
        assert_eq!(point.sample(&mut rng), Some(Action::Continuous(vec![0.5])));
    }
}
