//! Dispatcher configuration, validation, and error types.
//!
//! [`DispatcherConfig`] is the construction input for a
//! [`VectorDispatcher`](crate::dispatcher::VectorDispatcher).
//! [`validate()`](DispatcherConfig::validate) checks structural invariants
//! before any environment is built.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use vecray_core::{Info, InfoValue, Layout, ObsSpace};

// ── ResultShaping ──────────────────────────────────────────────────

/// How a worker shapes the non-observation columns of a reset result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResultShaping {
    /// One agent per environment: reset infos are empty maps.
    #[default]
    SingleAgent,
    /// Several agents per environment, keyed by observation field. Reset
    /// infos carry one empty entry per agent id.
    MultiAgent,
}

impl ResultShaping {
    /// Info map reported for one environment right after reset.
    pub fn reset_info(&self, space: &ObsSpace) -> Info {
        match self {
            Self::SingleAgent => Info::new(),
            Self::MultiAgent => space
                .keys()
                .map(|agent| (agent.to_string(), InfoValue::Map(Info::new())))
                .collect(),
        }
    }
}

// ── DispatcherConfig ───────────────────────────────────────────────

/// Complete configuration for a vector dispatcher.
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Number of worker actors. Default: 1.
    pub num_workers: usize,
    /// Environments owned by each worker. Default: 1.
    pub env_per_worker: usize,
    /// Reset result shaping. Default: single-agent.
    pub shaping: ResultShaping,
    /// Upper bound on a single wait attempt inside `poll()`. `None`
    /// blocks until a worker replies. An attempt that times out with no
    /// replies is retried, so this bounds attempt length, not `poll()`.
    pub poll_timeout: Option<Duration>,
    /// How long `stop()` waits for worker threads to exit before
    /// detaching them. Default: 200ms.
    pub shutdown_grace: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            num_workers: 1,
            env_per_worker: 1,
            shaping: ResultShaping::SingleAgent,
            poll_timeout: None,
            shutdown_grace: Duration::from_millis(200),
        }
    }
}

impl DispatcherConfig {
    /// Config for `num_workers` workers of `env_per_worker` environments,
    /// other settings at their defaults.
    pub fn new(num_workers: usize, env_per_worker: usize) -> Self {
        Self {
            num_workers,
            env_per_worker,
            ..Self::default()
        }
    }

    /// Set the result shaping.
    pub fn with_shaping(mut self, shaping: ResultShaping) -> Self {
        self.shaping = shaping;
        self
    }

    /// Set the per-attempt poll timeout.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = Some(timeout);
        self
    }

    /// Set how long `stop()` waits before detaching busy workers.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Validate all structural invariants and return the batch layout.
    pub fn validate(&self) -> Result<Layout, ConfigError> {
        if self.num_workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.env_per_worker == 0 {
            return Err(ConfigError::ZeroEnvsPerWorker);
        }
        if let Some(t) = self.poll_timeout {
            if t.is_zero() {
                return Err(ConfigError::InvalidTimeout);
            }
        }
        Layout::new(self.num_workers, self.env_per_worker).ok_or(ConfigError::TooManyEnvs {
            num_workers: self.num_workers,
            env_per_worker: self.env_per_worker,
        })
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`DispatcherConfig::validate()`] or while
/// deriving the observation space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `num_workers` is zero.
    ZeroWorkers,
    /// `env_per_worker` is zero.
    ZeroEnvsPerWorker,
    /// `num_workers * env_per_worker` overflows.
    TooManyEnvs {
        /// Configured worker count.
        num_workers: usize,
        /// Configured environments per worker.
        env_per_worker: usize,
    },
    /// The probe environment declared no observation fields.
    EmptyObservationSpace,
    /// `poll_timeout` is zero, which would spin without ever blocking.
    InvalidTimeout,
    /// The probe environment declared an action space with no members.
    InvalidActionSpace,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroWorkers => write!(f, "num_workers must be at least 1"),
            Self::ZeroEnvsPerWorker => write!(f, "env_per_worker must be at least 1"),
            Self::TooManyEnvs {
                num_workers,
                env_per_worker,
            } => write!(
                f,
                "{num_workers} workers x {env_per_worker} envs overflows usize"
            ),
            Self::EmptyObservationSpace => write!(f, "observation space declares no fields"),
            Self::InvalidTimeout => write!(f, "poll_timeout must be non-zero"),
            Self::InvalidActionSpace => write!(f, "action space has no members"),
        }
    }
}

impl Error for ConfigError {}
