//! Run settings shared by the resolver and executor.
//!
//! # Design
//! - Settings are validated once, before any network call, and then passed by
//!   reference into the components that need them.
//! - Credentials are not part of this value; they belong to the collaborator
//!   implementations that talk to the API.

use std::num::NonZeroUsize;
use std::time::Duration;

use thiserror::Error;

/// Default per-call wait in seconds.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 10;

/// Structured errors emitted while validating run settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting carried an unusable value.
    #[error("invalid value for '{field}': {message}")]
    InvalidField {
        /// Setting that failed validation.
        field: &'static str,
        /// Human-readable error description.
        message: String,
    },
}

/// What to do when the tag filter matches nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyMatchPolicy {
    /// Abort the run with `NoDevicesFound`.
    #[default]
    Fail,
    /// Produce an empty, successful report.
    Allow,
}

/// Validated settings for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Upper bound on a single device call.
    pub call_timeout: Duration,
    /// Maximum number of device calls in flight.
    pub concurrency: NonZeroUsize,
    /// Optional bound on the whole execution phase.
    pub deadline: Option<Duration>,
    /// Behaviour for an empty tag match.
    pub empty_match: EmptyMatchPolicy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            concurrency: NonZeroUsize::MIN,
            deadline: None,
            empty_match: EmptyMatchPolicy::Fail,
        }
    }
}

/// Unvalidated settings as collected from flags and environment.
#[derive(Debug, Clone, Default)]
pub struct RunnerSettings {
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
    /// Requested number of concurrent calls.
    pub concurrency: usize,
    /// Optional global deadline in seconds.
    pub deadline_secs: Option<u64>,
    /// Whether an empty tag match is acceptable.
    pub allow_empty: bool,
}

impl RunnerConfig {
    /// Validate raw settings into a run configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when the timeout, concurrency, or
    /// deadline is zero.
    pub fn from_settings(settings: &RunnerSettings) -> Result<Self, ConfigError> {
        if settings.timeout_secs == 0 {
            return Err(ConfigError::InvalidField {
                field: "timeout",
                message: "must be at least 1 second".to_string(),
            });
        }

        let concurrency =
            NonZeroUsize::new(settings.concurrency).ok_or_else(|| ConfigError::InvalidField {
                field: "concurrency",
                message: "must be at least 1".to_string(),
            })?;

        let deadline = match settings.deadline_secs {
            Some(0) => {
                return Err(ConfigError::InvalidField {
                    field: "deadline",
                    message: "must be at least 1 second when set".to_string(),
                });
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(Self {
            call_timeout: Duration::from_secs(settings.timeout_secs),
            concurrency,
            deadline,
            empty_match: if settings.allow_empty {
                EmptyMatchPolicy::Allow
            } else {
                EmptyMatchPolicy::Fail
            },
        })
    }
}
