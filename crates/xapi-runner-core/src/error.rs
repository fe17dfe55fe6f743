//! Error types for batch runs.
//!
//! Fatal conditions abort a run before or during resolution and surface as
//! [`XapiError`]. Per-device failures never abort a run; they are captured as
//! [`ExecutionError`] values inside the outcome for that device.

use std::error::Error;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// Fatal error raised while preparing or resolving a batch run.
#[derive(Debug, Error)]
pub enum XapiError {
    /// The command string could not be parsed.
    #[error("malformed command '{input}': {reason}")]
    MalformedCommand {
        /// Raw command string supplied by the caller.
        input: String,
        /// Human-readable reason for the rejection.
        reason: String,
    },
    /// Credentials were missing or rejected by the API.
    #[error("authentication failed: {detail}")]
    Authentication {
        /// Description of the authorization failure.
        detail: String,
    },
    /// The tag filter matched no devices.
    #[error("no devices found with tag '{tag}'")]
    NoDevicesFound {
        /// Tag used as the selection filter.
        tag: String,
    },
    /// The device directory could not be queried.
    #[error("device directory request failed")]
    Directory {
        /// Underlying transport or decoding failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Run settings were rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The report could not be serialised for output.
    #[error("failed to format report")]
    Format {
        /// Underlying serde failure.
        #[source]
        source: serde_json::Error,
    },
}

impl XapiError {
    /// Convenience constructor for parser rejections.
    pub fn malformed(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedCommand {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Wrap a directory failure.
    pub fn directory(source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Directory {
            source: source.into(),
        }
    }
}

/// Failure of a single device execution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// The call exceeded its per-call wait.
    #[error("timed out after {after:?}")]
    Timeout {
        /// Wait budget that elapsed.
        after: Duration,
    },
    /// The run-wide deadline elapsed before the call completed.
    #[error("run deadline elapsed before the command completed")]
    DeadlineExceeded,
    /// The request never produced an HTTP response.
    #[error("transport error: {detail}")]
    Transport {
        /// Transport failure description.
        detail: String,
    },
    /// The API answered with a non-success status.
    #[error("API returned status {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },
    /// The API answered with a body that could not be decoded.
    #[error("invalid response: {detail}")]
    InvalidResponse {
        /// Decoding failure description.
        detail: String,
    },
}

/// Convenience alias for fallible run operations.
pub type XapiResult<T> = Result<T, XapiError>;
